//! Access token refresh policy
//!
//! An access token is treated as expired five minutes after it was issued.
//! The server-reported `expires_in` is deliberately not consulted.

use super::types::SavedTokens;

/// Fixed access token validity window in milliseconds
pub const REFRESH_WINDOW_MS: i64 = 300_000;

/// Expiry instant in epoch milliseconds for the saved tokens
#[must_use]
pub fn expires_at_ms(tokens: &SavedTokens) -> i64 {
    tokens.issued_at.saturating_mul(1000).saturating_add(REFRESH_WINDOW_MS)
}

/// Whether the saved access token must be refreshed before use
///
/// ```
/// use tokenflow_common::auth::{policy, SavedTokens};
///
/// let tokens = SavedTokens { issued_at: 1_000, ..SavedTokens::default() };
/// assert!(!policy::should_refresh(&tokens, 1_000_000));
/// assert!(policy::should_refresh(&tokens, 1_300_001));
/// ```
#[must_use]
pub fn should_refresh(tokens: &SavedTokens, now_ms: i64) -> bool {
    let expire = expires_at_ms(tokens);
    expire == 0 || now_ms > expire
}

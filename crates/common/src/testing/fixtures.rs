//! Deterministic session fixtures
//!
//! Fixed tokens, timestamps, and profiles shared by unit and integration
//! tests. Timestamps are UNIX epoch seconds.

use crate::auth::{AuthConfig, SavedTokens, TokenResponse, User};

pub const CLIENT_ID: &str = "test_client_id";
pub const AUTH_URL: &str = "https://auth.example.com";
pub const REDIRECT_URI: &str = "minimalauth://";

pub const AUTH_CODE: &str = "mock_authorization_code";
pub const ACCESS_TOKEN: &str = "mock_access_token";
pub const REFRESH_TOKEN: &str = "mock_refresh_token";
pub const REFRESHED_ACCESS_TOKEN: &str = "refreshed_access_token";
pub const REFRESHED_REFRESH_TOKEN: &str = "refreshed_refresh_token";

/// Issue time of [`token_response`]
pub const ISSUED_AT: i64 = 1_700_000_000;
/// Issue time of [`refreshed_response`], six minutes later
pub const REFRESHED_AT: i64 = ISSUED_AT + 360;
pub const EXPIRES_IN: i64 = 3600;

/// Configuration pointing at [`AUTH_URL`]
#[must_use]
pub fn auth_config() -> AuthConfig {
    auth_config_for(AUTH_URL)
}

/// Configuration pointing at an arbitrary server, e.g. a mock server URI
#[must_use]
pub fn auth_config_for(auth_url: &str) -> AuthConfig {
    AuthConfig::for_auth_url(CLIENT_ID, auth_url, REDIRECT_URI)
}

/// Code exchange response carrying all four persisted fields
#[must_use]
pub fn token_response() -> TokenResponse {
    TokenResponse {
        access_token: ACCESS_TOKEN.to_string(),
        refresh_token: Some(REFRESH_TOKEN.to_string()),
        issued_at: ISSUED_AT,
        expires_in: Some(EXPIRES_IN),
        legacy_shape: false,
    }
}

/// Refresh response with a rotated refresh token
#[must_use]
pub fn refreshed_response() -> TokenResponse {
    TokenResponse {
        access_token: REFRESHED_ACCESS_TOKEN.to_string(),
        refresh_token: Some(REFRESHED_REFRESH_TOKEN.to_string()),
        issued_at: REFRESHED_AT,
        ..token_response()
    }
}

/// What the store holds after persisting [`token_response`]
#[must_use]
pub fn saved_tokens() -> SavedTokens {
    SavedTokens {
        refresh_token: REFRESH_TOKEN.to_string(),
        access_token: ACCESS_TOKEN.to_string(),
        issued_at: ISSUED_AT,
        expires_in: EXPIRES_IN,
    }
}

#[must_use]
pub fn user() -> User {
    User {
        user_id: "31c41c16-c281-44ae-9602-8a047e3bf33d".to_string(),
        email: "test@example.com".to_string(),
        email_confirmed: true,
        enabled: true,
        has_password: true,
        created_at: ISSUED_AT - 86_400,
        last_active_at: ISSUED_AT,
        ..User::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refreshed_response_is_past_the_refresh_window() {
        let refreshed = refreshed_response();
        assert!(refreshed.issued_at - ISSUED_AT > 300);
        assert_ne!(refreshed.refresh_token, token_response().refresh_token);
    }

    #[test]
    fn saved_tokens_mirror_token_response() {
        assert_eq!(SavedTokens::default().merged_with(&token_response()), saved_tokens());
    }
}

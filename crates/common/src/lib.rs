//! Client-side OAuth 2.0 session management shared across Tokenflow crates.
//!
//! # Safety and Quality
//!
//! This crate enforces strict safety and quality standards; no `unsafe`
//! code, and library paths never panic on I/O or network failures.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors and the clock abstraction
//! - `runtime`: async session controller, OAuth client, test mocks (default)
//! - `platform`: keychain-backed token storage
//! - `test-utils`: marker for dependents pulling in [`testing`]

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod time;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod auth;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use auth::{
    AuthConfig, AuthContext, KeyValueStorage, OAuthClient, Session, SessionController,
    SessionError, SessionPhase, User,
};
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainStorage};
#[cfg(feature = "foundation")]
pub use time::{Clock, MockClock, SystemClock};

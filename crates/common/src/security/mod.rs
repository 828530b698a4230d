//! Platform security integrations
//!
//! Currently the keychain-backed [`KeychainStorage`], a durable
//! [`crate::auth::KeyValueStorage`] for session tokens.

pub mod keychain;

pub use keychain::{KeychainError, KeychainStorage, DEFAULT_SERVICE_NAME};

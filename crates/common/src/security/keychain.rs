//! Platform keychain backed token storage
//!
//! Persists each storage key as a separate keychain entry under one service
//! name, across macOS (Keychain Access), Windows (Credential Manager), and
//! Linux (Secret Service API).
//!
//! ## Usage
//!
//! ```no_run
//! use tokenflow_common::security::KeychainStorage;
//!
//! let keychain = KeychainStorage::new("com.example.app.tokens");
//! keychain.set_secret("refreshToken", "r-123")?;
//! assert_eq!(keychain.get_secret("refreshToken")?.as_deref(), Some("r-123"));
//! # Ok::<(), tokenflow_common::security::KeychainError>(())
//! ```

use async_trait::async_trait;
use keyring::Entry;
use thiserror::Error;
use tracing::debug;

use crate::auth::KeyValueStorage;
use crate::error::{CommonError, CommonResult};

/// Default keychain service name
pub const DEFAULT_SERVICE_NAME: &str = "tokenflow.session";

/// Key-value storage over the platform keychain
#[derive(Debug, Clone)]
pub struct KeychainStorage {
    service_name: String,
}

impl KeychainStorage {
    /// Create storage for a specific keychain service
    ///
    /// # Examples
    /// ```
    /// use tokenflow_common::security::KeychainStorage;
    ///
    /// let keychain = KeychainStorage::new("com.example.app");
    /// assert_eq!(keychain.service_name(), "com.example.app");
    /// ```
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Store a secret value, replacing any previous one
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to store secret for {key}: {e}"))
        })
    }

    /// Retrieve a secret value; `Ok(None)` when no entry exists
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn get_secret(&self, key: &str) -> Result<Option<String>, KeychainError> {
        let entry = self.create_entry(key)?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to retrieve secret for {key}: {e}"
            ))),
        }
    }

    /// Delete a secret (idempotent)
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to delete secret for {key}: {e}"
            ))),
        }
    }

    fn create_entry(&self, account: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service_name, account).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to create keychain entry: {e}"))
        })
    }

    /// Run a blocking keychain call off the async runtime
    async fn blocking<T, F>(&self, operation: &'static str, f: F) -> CommonResult<T>
    where
        T: Send + 'static,
        F: FnOnce(KeychainStorage) -> Result<T, KeychainError> + Send + 'static,
    {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || f(storage))
            .await
            .map_err(|e| CommonError::internal_with_context(e.to_string(), "keychain"))?
            .map_err(|e| e.into_common(operation))
    }
}

impl Default for KeychainStorage {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

#[async_trait]
impl KeyValueStorage for KeychainStorage {
    async fn get_item(&self, key: &str) -> CommonResult<Option<String>> {
        let key = key.to_string();
        self.blocking("getItem", move |storage| storage.get_secret(&key)).await
    }

    async fn set_item(&self, key: &str, value: &str) -> CommonResult<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.blocking("setItem", move |storage| storage.set_secret(&key, &value)).await
    }

    async fn remove_item(&self, key: &str) -> CommonResult<()> {
        let key = key.to_string();
        self.blocking("removeItem", move |storage| storage.delete_secret(&key)).await
    }
}

/// Keychain error types
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Keychain access failed (permission denied, not available, etc.)
    #[error("Keychain access failed: {0}")]
    AccessFailed(String),

    /// Underlying keyring library error
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl KeychainError {
    fn into_common(self, operation: &str) -> CommonError {
        CommonError::storage_op(operation, self.to_string())
    }
}

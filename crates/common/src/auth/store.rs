//! Durable token persistence over a key-value store
//!
//! Tokens live under four well-known string keys. Numbers are stored as
//! their decimal text. Writes after a token response are partial: the
//! access token and issue time are always written, while `expires_in` and
//! the refresh token are written only when the response carried them.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, warn};

use super::traits::KeyValueStorage;
use super::types::{SavedTokens, TokenResponse};
use crate::error::CommonResult;

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key for the access token issue time (epoch seconds)
pub const ACCESS_TOKEN_ISSUED_AT_KEY: &str = "accessTokenIssuedAt";
/// Storage key for the access token lifetime (seconds)
pub const ACCESS_TOKEN_EXPIRES_IN_KEY: &str = "accessTokenExpiresIn";

/// All keys owned by the token store
pub const TOKEN_KEYS: [&str; 4] = [
    REFRESH_TOKEN_KEY,
    ACCESS_TOKEN_KEY,
    ACCESS_TOKEN_ISSUED_AT_KEY,
    ACCESS_TOKEN_EXPIRES_IN_KEY,
];

/// Token persistence adapter
pub struct TokenStore<S: KeyValueStorage> {
    storage: Arc<S>,
}

impl<S: KeyValueStorage> Clone for TokenStore<S> {
    fn clone(&self) -> Self {
        Self { storage: Arc::clone(&self.storage) }
    }
}

impl<S: KeyValueStorage> TokenStore<S> {
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Underlying key-value storage
    #[must_use]
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Persist a token response
    ///
    /// The individual writes are issued concurrently; the first failure is
    /// returned once all have settled or one has failed.
    ///
    /// # Errors
    /// Returns the storage error of the first failed write
    pub async fn save(&self, response: &TokenResponse) -> CommonResult<()> {
        let issued_at = response.issued_at.to_string();
        let expires_in = response.expires_in.map(|v| v.to_string());

        let mut writes = vec![
            self.storage.set_item(ACCESS_TOKEN_KEY, &response.access_token),
            self.storage.set_item(ACCESS_TOKEN_ISSUED_AT_KEY, &issued_at),
        ];
        if let Some(expires_in) = expires_in.as_deref() {
            writes.push(self.storage.set_item(ACCESS_TOKEN_EXPIRES_IN_KEY, expires_in));
        }
        if let Some(refresh_token) = response.refresh_token.as_deref() {
            writes.push(self.storage.set_item(REFRESH_TOKEN_KEY, refresh_token));
        }

        let count = writes.len();
        try_join_all(writes).await?;
        debug!(keys = count, "Persisted token response");
        Ok(())
    }

    /// Read the persisted tokens
    ///
    /// Never fails: read errors are logged and yield the all-empty
    /// snapshot, missing keys read as empty/zero, and numbers that do not
    /// parse read as zero.
    pub async fn load(&self) -> SavedTokens {
        match self.try_load().await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Failed to read saved tokens, treating as logged out");
                SavedTokens::default()
            }
        }
    }

    /// Read the persisted tokens, surfacing storage errors
    ///
    /// # Errors
    /// Returns the first storage read error
    pub async fn try_load(&self) -> CommonResult<SavedTokens> {
        let (refresh_token, access_token, issued_at, expires_in) = futures::try_join!(
            self.storage.get_item(REFRESH_TOKEN_KEY),
            self.storage.get_item(ACCESS_TOKEN_KEY),
            self.storage.get_item(ACCESS_TOKEN_ISSUED_AT_KEY),
            self.storage.get_item(ACCESS_TOKEN_EXPIRES_IN_KEY),
        )?;

        Ok(SavedTokens {
            refresh_token: refresh_token.unwrap_or_default(),
            access_token: access_token.unwrap_or_default(),
            issued_at: parse_number(issued_at.as_deref()),
            expires_in: parse_number(expires_in.as_deref()),
        })
    }

    /// Remove all four keys; removing absent keys is not an error
    ///
    /// # Errors
    /// Returns the first storage delete error
    pub async fn clear(&self) -> CommonResult<()> {
        try_join_all(TOKEN_KEYS.iter().map(|key| self.storage.remove_item(key))).await?;
        debug!("Cleared saved tokens");
        Ok(())
    }
}

fn parse_number(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::store.
    use super::*;
    use crate::testing::MockStorage;

    fn response(refresh: Option<&str>, expires_in: Option<i64>) -> TokenResponse {
        TokenResponse {
            access_token: "access_1".to_string(),
            refresh_token: refresh.map(ToOwned::to_owned),
            issued_at: 1_700_000_000,
            expires_in,
            legacy_shape: false,
        }
    }

    fn store() -> (Arc<MockStorage>, TokenStore<MockStorage>) {
        let storage = Arc::new(MockStorage::new());
        (Arc::clone(&storage), TokenStore::new(storage))
    }

    #[tokio::test]
    async fn test_save_writes_all_present_fields() {
        let (storage, store) = store();

        store.save(&response(Some("refresh_1"), Some(3600))).await.unwrap();

        assert_eq!(storage.value(REFRESH_TOKEN_KEY).as_deref(), Some("refresh_1"));
        assert_eq!(storage.value(ACCESS_TOKEN_KEY).as_deref(), Some("access_1"));
        assert_eq!(storage.value(ACCESS_TOKEN_ISSUED_AT_KEY).as_deref(), Some("1700000000"));
        assert_eq!(storage.value(ACCESS_TOKEN_EXPIRES_IN_KEY).as_deref(), Some("3600"));
    }

    /// Validates that absent response fields leave previous values in place.
    #[tokio::test]
    async fn test_save_is_partial() {
        let (storage, store) = store();
        storage.insert(REFRESH_TOKEN_KEY, "old_refresh");
        storage.insert(ACCESS_TOKEN_EXPIRES_IN_KEY, "60");

        store.save(&response(None, None)).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.refresh_token, "old_refresh");
        assert_eq!(loaded.access_token, "access_1");
        assert_eq!(loaded.expires_in, 60);
    }

    #[tokio::test]
    async fn test_save_propagates_write_failure() {
        let (storage, store) = store();
        storage.set_should_fail(true);

        assert!(store.save(&response(Some("r"), None)).await.is_err());
    }

    #[tokio::test]
    async fn test_load_empty_storage_is_logged_out() {
        let (_, store) = store();
        assert_eq!(store.load().await, SavedTokens::default());
    }

    #[tokio::test]
    async fn test_load_swallows_read_failure() {
        let (storage, store) = store();
        storage.insert(REFRESH_TOKEN_KEY, "refresh");
        storage.set_should_fail(true);

        assert_eq!(store.load().await, SavedTokens::default());
        assert!(store.try_load().await.is_err());
    }

    #[tokio::test]
    async fn test_load_unparsable_numbers_read_as_zero() {
        let (storage, store) = store();
        storage.insert(ACCESS_TOKEN_ISSUED_AT_KEY, "yesterday");
        storage.insert(ACCESS_TOKEN_EXPIRES_IN_KEY, "");

        let loaded = store.load().await;
        assert_eq!(loaded.issued_at, 0);
        assert_eq!(loaded.expires_in, 0);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let (storage, store) = store();
        store.save(&response(Some("refresh"), Some(10))).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(storage.is_empty());
        assert_eq!(store.load().await, SavedTokens::default());
    }
}

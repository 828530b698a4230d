//! Mock implementations of the session capability traits
//!
//! Provides in-memory storage, a scripted OAuth client, and a scripted
//! browser prompt so session behavior can be tested without a network or a
//! platform keychain.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::fixtures;
use crate::auth::store::{
    ACCESS_TOKEN_EXPIRES_IN_KEY, ACCESS_TOKEN_ISSUED_AT_KEY, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
use crate::auth::{
    AuthorizationPrompt, AuthorizationRequest, KeyValueStorage, OAuthClientError,
    OAuthClientTrait, PromptOutcome, SavedTokens, TokenResponse, User,
};
use crate::error::{CommonError, CommonResult};

type StorageData = Arc<Mutex<HashMap<String, String>>>;

fn mock_failure() -> OAuthClientError {
    OAuthClientError::UnexpectedStatus { status: 500, body: "mock failure".to_string() }
}

/// In-memory key-value storage
///
/// # Examples
///
/// ```
/// use tokenflow_common::testing::mocks::MockStorage;
///
/// let storage = MockStorage::new();
/// storage.insert("refreshToken", "r");
/// assert_eq!(storage.value("refreshToken").as_deref(), Some("r"));
/// ```
#[derive(Debug, Clone)]
pub struct MockStorage {
    data: StorageData,
    should_fail: Arc<Mutex<bool>>,
    writes: Arc<AtomicUsize>,
}

impl MockStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            should_fail: Arc::new(Mutex::new(false)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Write a raw value, bypassing failure injection
    pub fn insert(&self, key: &str, value: &str) {
        // SAFETY: Mutex poisoning is acceptable in test mocks - if a test panics,
        // the entire test fails anyway
        self.data.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    /// Read a raw value, bypassing failure injection
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    /// Write all four token keys as a previous session would have
    pub fn seed_tokens(&self, tokens: &SavedTokens) {
        self.insert(REFRESH_TOKEN_KEY, &tokens.refresh_token);
        self.insert(ACCESS_TOKEN_KEY, &tokens.access_token);
        self.insert(ACCESS_TOKEN_ISSUED_AT_KEY, &tokens.issued_at.to_string());
        self.insert(ACCESS_TOKEN_EXPIRES_IN_KEY, &tokens.expires_in.to_string());
    }

    /// Make every subsequent storage operation fail
    pub fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }

    /// Number of successful `set_item` calls
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.data.lock().unwrap().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.lock().unwrap().is_empty()
    }

    fn check(&self, operation: &str) -> CommonResult<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(CommonError::storage_op(operation, "mock storage failure"));
        }
        Ok(())
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStorage for MockStorage {
    async fn get_item(&self, key: &str) -> CommonResult<Option<String>> {
        self.check("getItem")?;
        Ok(self.value(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> CommonResult<()> {
        self.check("setItem")?;
        self.insert(key, value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> CommonResult<()> {
        self.check("removeItem")?;
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Mock OAuth client that serves scripted responses without network calls
#[derive(Clone, Debug)]
pub struct MockOAuthClient {
    exchange_response: Arc<Mutex<TokenResponse>>,
    refresh_response: Arc<Mutex<TokenResponse>>,
    user: Arc<Mutex<User>>,
    should_fail: Arc<Mutex<bool>>,
    userinfo_should_fail: Arc<Mutex<bool>>,
    revoke_status: Arc<Mutex<u16>>,
    exchange_calls: Arc<AtomicUsize>,
    refresh_calls: Arc<AtomicUsize>,
    userinfo_calls: Arc<AtomicUsize>,
    revoke_calls: Arc<AtomicUsize>,
    last_code_verifier: Arc<Mutex<Option<String>>>,
    last_refresh_token: Arc<Mutex<Option<String>>>,
    last_userinfo_token: Arc<Mutex<Option<String>>>,
}

impl MockOAuthClient {
    /// Create a client answering with the default fixtures
    pub fn new() -> Self {
        Self {
            exchange_response: Arc::new(Mutex::new(fixtures::token_response())),
            refresh_response: Arc::new(Mutex::new(fixtures::refreshed_response())),
            user: Arc::new(Mutex::new(fixtures::user())),
            should_fail: Arc::new(Mutex::new(false)),
            userinfo_should_fail: Arc::new(Mutex::new(false)),
            revoke_status: Arc::new(Mutex::new(200)),
            exchange_calls: Arc::new(AtomicUsize::new(0)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            userinfo_calls: Arc::new(AtomicUsize::new(0)),
            revoke_calls: Arc::new(AtomicUsize::new(0)),
            last_code_verifier: Arc::new(Mutex::new(None)),
            last_refresh_token: Arc::new(Mutex::new(None)),
            last_userinfo_token: Arc::new(Mutex::new(None)),
        }
    }

    /// Configure the response returned by `exchange_code`
    pub fn set_exchange_response(&self, tokens: TokenResponse) {
        *self.exchange_response.lock().unwrap() = tokens;
    }

    /// Configure the response returned by `refresh_access_token`
    pub fn set_refresh_response(&self, tokens: TokenResponse) {
        *self.refresh_response.lock().unwrap() = tokens;
    }

    /// Configure the profile returned by `fetch_user_info`
    pub fn set_user(&self, user: User) {
        *self.user.lock().unwrap() = user;
    }

    /// Force every endpoint call to fail
    pub fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }

    /// Force only the userinfo call to fail
    pub fn set_userinfo_should_fail(&self, should_fail: bool) {
        *self.userinfo_should_fail.lock().unwrap() = should_fail;
    }

    /// HTTP status the logout endpoint answers with; anything but 200 fails
    pub fn set_revoke_status(&self, status: u16) {
        *self.revoke_status.lock().unwrap() = status;
    }

    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn userinfo_count(&self) -> usize {
        self.userinfo_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn revoke_count(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }

    /// Check whether refresh was called
    #[must_use]
    pub fn was_refresh_called(&self) -> bool {
        self.refresh_count() > 0
    }

    #[must_use]
    pub fn last_code_verifier(&self) -> Option<String> {
        self.last_code_verifier.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last_userinfo_token(&self) -> Option<String> {
        self.last_userinfo_token.lock().unwrap().clone()
    }

    fn failing(&self) -> bool {
        *self.should_fail.lock().unwrap()
    }
}

impl Default for MockOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn exchange_code(
        &self,
        _code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_code_verifier.lock().unwrap() = Some(code_verifier.to_string());

        if self.failing() {
            return Err(mock_failure());
        }
        Ok(self.exchange_response.lock().unwrap().clone())
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_refresh_token.lock().unwrap() = Some(refresh_token.to_string());

        if self.failing() {
            return Err(mock_failure());
        }
        Ok(self.refresh_response.lock().unwrap().clone())
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<User, OAuthClientError> {
        self.userinfo_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_userinfo_token.lock().unwrap() = Some(access_token.to_string());

        if self.failing() || *self.userinfo_should_fail.lock().unwrap() {
            return Err(mock_failure());
        }
        Ok(self.user.lock().unwrap().clone())
    }

    async fn revoke_session(&self, _refresh_token: &str) -> Result<(), OAuthClientError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing() {
            return Err(mock_failure());
        }
        let status = *self.revoke_status.lock().unwrap();
        if status != 200 {
            return Err(OAuthClientError::RevocationFailed { status, body: String::new() });
        }
        Ok(())
    }
}

/// Scripted browser prompt
///
/// By default the user "approves": a success outcome carrying
/// [`fixtures::AUTH_CODE`] and echoing the request's `state`.
#[derive(Clone, Debug)]
pub struct MockPrompt {
    outcome: Arc<Mutex<PromptOutcome>>,
    should_fail: Arc<Mutex<bool>>,
    prompts: Arc<AtomicUsize>,
    last_url: Arc<Mutex<Option<String>>>,
}

impl MockPrompt {
    pub fn new() -> Self {
        Self {
            outcome: Arc::new(Mutex::new(PromptOutcome::Success {
                code: fixtures::AUTH_CODE.to_string(),
                state: None,
            })),
            should_fail: Arc::new(Mutex::new(false)),
            prompts: Arc::new(AtomicUsize::new(0)),
            last_url: Arc::new(Mutex::new(None)),
        }
    }

    /// Outcome for subsequent prompts
    ///
    /// A `Success` without `state` echoes the request's state back.
    pub fn set_outcome(&self, outcome: PromptOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Make the prompt itself fail to open
    pub fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }

    #[must_use]
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    /// Authorization URL of the last prompt
    #[must_use]
    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }
}

impl Default for MockPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizationPrompt for MockPrompt {
    async fn prompt(&self, request: &AuthorizationRequest) -> CommonResult<PromptOutcome> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(request.authorize_url());

        if *self.should_fail.lock().unwrap() {
            return Err(CommonError::backend("browser", "mock prompt unavailable", false));
        }

        let outcome = self.outcome.lock().unwrap().clone();
        Ok(match outcome {
            PromptOutcome::Success { code, state: None } => {
                PromptOutcome::Success { code, state: Some(request.state().to_string()) }
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::mocks.
    use super::*;
    use crate::auth::AuthConfig;

    #[tokio::test]
    async fn test_mock_storage() {
        let storage = MockStorage::new();
        storage.set_item("key1", "value1").await.unwrap();

        assert_eq!(storage.get_item("key1").await.unwrap(), Some("value1".to_string()));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.write_count(), 1);

        storage.remove_item("key1").await.unwrap();
        storage.remove_item("key1").await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_mock_storage_failure_injection() {
        let storage = MockStorage::new();
        storage.insert("key1", "value1");
        storage.set_should_fail(true);

        assert!(storage.get_item("key1").await.is_err());
        assert!(storage.set_item("key2", "v").await.is_err());
        assert_eq!(storage.value("key1").as_deref(), Some("value1"));
    }

    #[tokio::test]
    async fn test_mock_oauth_client() {
        let client = MockOAuthClient::new();
        assert!(!client.was_refresh_called());

        let tokens = client.refresh_access_token("refresh").await.unwrap();
        assert_eq!(tokens.access_token, fixtures::REFRESHED_ACCESS_TOKEN);
        assert!(client.was_refresh_called());
        assert_eq!(client.last_refresh_token().as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_mock_oauth_client_failure() {
        let client = MockOAuthClient::new();
        client.set_should_fail(true);

        assert!(client.refresh_access_token("refresh").await.is_err());
        assert!(client.was_refresh_called());

        client.set_should_fail(false);
        client.set_revoke_status(401);
        assert!(matches!(
            client.revoke_session("refresh").await,
            Err(OAuthClientError::RevocationFailed { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_prompt_echoes_state() {
        let prompt = MockPrompt::new();
        let request = AuthorizationRequest::new(&AuthConfig::for_auth_url(
            "client",
            "https://auth.example.com",
            "app://",
        ))
        .unwrap();

        let outcome = prompt.prompt(&request).await.unwrap();

        assert_eq!(request.verify(outcome.clone()), outcome);
        assert_eq!(prompt.prompt_count(), 1);
        assert!(prompt.last_url().unwrap().contains("code_challenge="));
    }
}

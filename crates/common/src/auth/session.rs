//! Session controller: login, silent refresh, profile fetch, and logout
//!
//! The controller owns the in-memory session view and the token cache.
//! The cache is the source of truth once populated; the durable
//! [`TokenStore`] is only consulted when it is empty, e.g. right after a
//! process restart.
//!
//! Public operations never fail. Each has a `try_*` counterpart returning
//! a typed [`SessionError`]; the public wrapper logs the error and degrades
//! to the benign fallback (`""`, `None`, or no-op).
//!
//! ## State machine
//!
//! ```text
//!   Anonymous ──login──▶ Authenticating ──profile ok──▶ Authenticated
//!       ▲                     │                              │
//!       └──── failure/logout ─┘            stale token ──▶ Refreshing
//! ```
//!
//! Overlapping calls are not serialized. The last write to the cache and
//! the session view wins.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{watch, Mutex, OnceCell};
use tracing::{debug, error, info, warn};

use super::account::account_page_url;
use super::client::OAuthClientError;
use super::policy::should_refresh;
use super::prompt::{AuthorizationRequest, PromptOutcome};
use super::store::TokenStore;
use super::traits::{AuthorizationPrompt, KeyValueStorage, OAuthClientTrait};
use super::types::{AccountPageUrlOptions, AuthConfig, SavedTokens, TokenResponse, User};
use crate::error::{CommonError, ErrorClassification, ErrorSeverity};
use crate::time::{Clock, SystemClock};

/// Lifecycle phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No user profile
    #[default]
    Anonymous,
    /// Interactive login in flight
    Authenticating,
    /// User profile present
    Authenticated,
    /// Silent token refresh in flight
    Refreshing,
}

/// In-memory session view published to subscribers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Initial silent acquisition has completed; flips to `true` once
    pub ready: bool,
    /// An interactive login is in progress
    pub loading: bool,
    /// Last access token handed out; empty when none
    pub access_token: String,
    /// Profile from the last successful fetch
    pub user: Option<User>,
    pub phase: SessionPhase,
}

impl Session {
    /// `user` presence is the authentication signal
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn settle_phase(&mut self) {
        self.phase = if self.loading {
            SessionPhase::Authenticating
        } else if self.user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        };
    }
}

/// Errors surfaced by the `try_*` session operations
#[derive(Debug)]
pub enum SessionError {
    /// Token, userinfo, or logout endpoint failure
    Client(OAuthClientError),

    /// Durable storage failure
    Storage(CommonError),

    /// The authorization prompt could not be shown
    Prompt(CommonError),

    /// The authorization request could not be prepared
    MissingRequest(CommonError),

    /// The prompt ended without an authorization code
    AuthorizationNotCompleted { outcome: &'static str },

    /// No refresh token is available
    NotAuthenticated,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(e) => write!(f, "{e}"),
            Self::Storage(e) => write!(f, "{e}"),
            Self::Prompt(e) => write!(f, "Authorization prompt failed: {e}"),
            Self::MissingRequest(e) => write!(f, "No authorization request: {e}"),
            Self::AuthorizationNotCompleted { outcome } => {
                write!(f, "Authorization not completed (outcome: {outcome})")
            }
            Self::NotAuthenticated => write!(f, "Not authenticated"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Client(e) => Some(e),
            Self::Storage(e) | Self::Prompt(e) | Self::MissingRequest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<OAuthClientError> for SessionError {
    fn from(err: OAuthClientError) -> Self {
        Self::Client(err)
    }
}

impl ErrorClassification for SessionError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_retryable(),
            Self::Storage(e) | Self::Prompt(e) => e.is_retryable(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotAuthenticated | Self::AuthorizationNotCompleted { .. } => ErrorSeverity::Info,
            Self::Client(e) => e.severity(),
            Self::Storage(e) | Self::Prompt(e) | Self::MissingRequest(e) => e.severity(),
        }
    }
}

/// Log a swallowed failure at the level its severity calls for
fn log_failure(operation: &'static str, err: &SessionError) {
    let retryable = err.is_retryable();
    match err.severity() {
        ErrorSeverity::Info => debug!(operation, reason = %err, "Operation skipped"),
        ErrorSeverity::Warning => warn!(operation, retryable, error = %err, "Operation failed"),
        ErrorSeverity::Error | ErrorSeverity::Critical => {
            error!(operation, retryable, error = %err, "Operation failed");
        }
    }
}

/// Restores the settled phase (and clears `loading`) when dropped, so
/// cleanup runs on every exit path including cancellation.
struct PhaseGuard<'a> {
    state: &'a watch::Sender<Session>,
    clear_loading: bool,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        let clear_loading = self.clear_loading;
        self.state.send_modify(|session| {
            if clear_loading {
                session.loading = false;
            }
            session.settle_phase();
        });
    }
}

/// Orchestrates the token lifecycle for a single session
pub struct SessionController<C, S, P>
where
    C: OAuthClientTrait,
    S: KeyValueStorage,
    P: AuthorizationPrompt,
{
    config: AuthConfig,
    client: Arc<C>,
    store: TokenStore<S>,
    prompt: Arc<P>,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<SavedTokens>>,
    state: watch::Sender<Session>,
    initialized: OnceCell<()>,
}

impl<C, S, P> SessionController<C, S, P>
where
    C: OAuthClientTrait,
    S: KeyValueStorage,
    P: AuthorizationPrompt,
{
    /// Create a controller; call [`Self::initialize`] to run silent acquisition
    pub fn new(config: AuthConfig, client: Arc<C>, storage: Arc<S>, prompt: Arc<P>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            config,
            client,
            store: TokenStore::new(storage),
            prompt,
            clock: Arc::new(SystemClock),
            cache: Mutex::new(None),
            state,
            initialized: OnceCell::new(),
        }
    }

    /// Replace the clock consulted by the refresh policy
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore<S> {
        &self.store
    }

    /// Current session snapshot
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Run the one-time startup acquisition
    ///
    /// Tries to obtain a token silently and, when one is available, fetches
    /// the profile. `ready` becomes `true` afterwards whatever the outcome.
    /// Later calls wait for the first to finish and do nothing else.
    pub async fn initialize(&self) {
        self.initialized
            .get_or_init(|| async {
                let token = self.get_token().await;
                if !token.is_empty() {
                    self.get_user().await;
                }

                self.state.send_if_modified(|session| {
                    let changed = !session.ready;
                    session.ready = true;
                    changed
                });
                info!(
                    operation = "initialize",
                    authenticated = self.state.borrow().is_authenticated(),
                    "Session ready"
                );
            })
            .await;
    }

    /// Whether [`Self::initialize`] has completed
    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    /// Interactive login through the browser prompt
    pub async fn login(&self) {
        if let Err(e) = self.try_login().await {
            log_failure("login", &e);
        }
    }

    /// Interactive login returning the typed outcome
    ///
    /// A non-success prompt outcome or an unpreparable request logs the
    /// session out before returning the error. On success the profile is
    /// fetched; a failed fetch yields `Ok(None)`.
    ///
    /// # Errors
    /// Returns the first failure of prompt, exchange, or token persistence
    pub async fn try_login(&self) -> Result<Option<User>, SessionError> {
        self.state.send_modify(|session| {
            session.loading = true;
            session.settle_phase();
        });
        let _guard = PhaseGuard { state: &self.state, clear_loading: true };

        let request = match AuthorizationRequest::new(&self.config) {
            Ok(request) => request,
            Err(e) => {
                self.logout().await;
                return Err(SessionError::MissingRequest(e));
            }
        };

        let outcome = self.prompt.prompt(&request).await.map_err(SessionError::Prompt)?;
        let code = match request.verify(outcome) {
            PromptOutcome::Success { code, .. } => code,
            other => {
                if let PromptOutcome::Error { message } = &other {
                    warn!(operation = "login", %message, "Authorization prompt reported an error");
                }
                self.logout().await;
                return Err(SessionError::AuthorizationNotCompleted { outcome: other.kind() });
            }
        };

        let response = self.client.exchange_code(&code, request.code_verifier()).await?;
        let base = self.cached_tokens().await;
        self.persist(&base, &response).await?;
        info!(operation = "login", "Authorization code exchanged");

        Ok(self.get_user().await)
    }

    /// Access token for an outgoing request; `""` when none can be obtained
    pub async fn get_token(&self) -> String {
        match self.try_get_token().await {
            Ok(token) => token,
            Err(e) => {
                log_failure("get_token", &e);
                String::new()
            }
        }
    }

    /// Access token, refreshing it when the refresh window has elapsed
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] without a refresh token; otherwise
    /// the refresh or persistence failure
    pub async fn try_get_token(&self) -> Result<String, SessionError> {
        let tokens = self.cached_tokens().await;
        if !tokens.has_refresh_token() {
            return Err(SessionError::NotAuthenticated);
        }

        if !should_refresh(&tokens, self.clock.epoch_millis()) {
            let access_token = tokens.access_token;
            self.set_access_token(&access_token);
            return Ok(access_token);
        }

        self.state.send_modify(|session| session.phase = SessionPhase::Refreshing);
        let _guard = PhaseGuard { state: &self.state, clear_loading: false };

        debug!(operation = "get_token", "Access token stale, refreshing");
        let response = self.client.refresh_access_token(&tokens.refresh_token).await?;
        let refreshed = self.persist(&tokens, &response).await?;
        Ok(refreshed.access_token)
    }

    /// Fetch and publish the user profile; `None` on any failure
    pub async fn get_user(&self) -> Option<User> {
        match self.try_get_user().await {
            Ok(user) => Some(user),
            Err(e) => {
                log_failure("get_user", &e);
                self.state.send_if_modified(|session| {
                    let changed = session.user.take().is_some();
                    session.settle_phase();
                    changed
                });
                None
            }
        }
    }

    /// Fetch and publish the user profile
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] when no access token is available,
    /// otherwise the token or userinfo failure
    pub async fn try_get_user(&self) -> Result<User, SessionError> {
        let token = self.try_get_token().await?;
        if token.is_empty() {
            return Err(SessionError::NotAuthenticated);
        }

        let user = self.client.fetch_user_info(&token).await?;
        self.state.send_modify(|session| {
            session.user = Some(user.clone());
            session.settle_phase();
        });
        Ok(user)
    }

    /// Revoke remotely (best effort) and always purge local state
    pub async fn logout(&self) {
        if let Err(e) = self.try_logout().await {
            log_failure("logout", &e);
        }
    }

    /// Logout returning the revocation or purge failure
    ///
    /// Local state is cleared before this returns, whatever the result.
    ///
    /// # Errors
    /// The revocation failure if any, else the storage purge failure
    pub async fn try_logout(&self) -> Result<(), SessionError> {
        let tokens = self.cached_tokens().await;
        let revoked = if tokens.has_refresh_token() {
            self.client.revoke_session(&tokens.refresh_token).await.map_err(SessionError::from)
        } else {
            Ok(())
        };

        *self.cache.lock().await = None;
        self.state.send_modify(|session| {
            session.user = None;
            session.access_token.clear();
            session.settle_phase();
        });
        let purged = self.store.clear().await.map_err(SessionError::Storage);

        info!(operation = "logout", revoked = revoked.is_ok(), "Session cleared");
        revoked.and(purged)
    }

    /// Hosted account page URL
    pub fn get_account_page_url(&self, options: &AccountPageUrlOptions) -> String {
        account_page_url(&self.config, options)
    }

    /// Cached tokens, filling the cache from the store when it is empty
    ///
    /// Only a loaded session with a refresh token is cached, so an empty or
    /// unreadable store is consulted again on the next call.
    async fn cached_tokens(&self) -> SavedTokens {
        let mut cache = self.cache.lock().await;
        if let Some(tokens) = cache.as_ref() {
            return tokens.clone();
        }

        let tokens = self.store.load().await;
        if tokens.has_refresh_token() {
            debug!("Token cache filled from store");
            *cache = Some(tokens.clone());
        }
        tokens
    }

    /// Write a token response through to the store, cache, and session view
    async fn persist(
        &self,
        base: &SavedTokens,
        response: &TokenResponse,
    ) -> Result<SavedTokens, SessionError> {
        self.store.save(response).await.map_err(SessionError::Storage)?;

        let merged = base.merged_with(response);
        *self.cache.lock().await = Some(merged.clone());
        self.set_access_token(&merged.access_token);
        Ok(merged)
    }

    fn set_access_token(&self, token: &str) {
        self.state.send_if_modified(|session| {
            if session.access_token == token {
                return false;
            }
            session.access_token = token.to_string();
            true
        });
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::session. End-to-end scenarios live in
    //! `tests/session_integration.rs`.
    use super::*;
    use crate::testing::{fixtures, MockOAuthClient, MockPrompt, MockStorage};
    use crate::time::MockClock;

    type Controller = SessionController<MockOAuthClient, MockStorage, MockPrompt>;

    fn controller() -> (Controller, Arc<MockOAuthClient>, Arc<MockStorage>, Arc<MockPrompt>) {
        let client = Arc::new(MockOAuthClient::new());
        let storage = Arc::new(MockStorage::new());
        let prompt = Arc::new(MockPrompt::new());
        let clock = Arc::new(MockClock::at_epoch_secs(fixtures::ISSUED_AT as u64));
        let controller = SessionController::new(
            fixtures::auth_config(),
            Arc::clone(&client),
            Arc::clone(&storage),
            Arc::clone(&prompt),
        )
        .with_clock(clock);
        (controller, client, storage, prompt)
    }

    #[test]
    fn test_settle_phase() {
        let mut session = Session::default();
        session.settle_phase();
        assert_eq!(session.phase, SessionPhase::Anonymous);

        session.user = Some(fixtures::user());
        session.settle_phase();
        assert_eq!(session.phase, SessionPhase::Authenticated);

        session.loading = true;
        session.settle_phase();
        assert_eq!(session.phase, SessionPhase::Authenticating);
    }

    #[tokio::test]
    async fn test_get_token_without_refresh_token_is_not_authenticated() {
        let (controller, client, _, _) = controller();

        assert!(matches!(controller.try_get_token().await, Err(SessionError::NotAuthenticated)));
        assert_eq!(controller.get_token().await, "");
        assert_eq!(client.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_login_cancel_resets_loading_and_logs_out() {
        let (controller, client, _, prompt) = controller();
        prompt.set_outcome(PromptOutcome::Cancel);

        let result = controller.try_login().await;

        assert!(matches!(
            result,
            Err(SessionError::AuthorizationNotCompleted { outcome: "cancel" })
        ));
        let session = controller.session();
        assert!(!session.loading);
        assert_eq!(session.phase, SessionPhase::Anonymous);
        assert_eq!(client.exchange_count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_failure_is_not_routed_to_logout() {
        let (controller, client, storage, prompt) = controller();
        storage.seed_tokens(&fixtures::saved_tokens());
        prompt.set_should_fail(true);

        controller.login().await;

        assert!(!controller.session().loading);
        assert_eq!(client.revoke_count(), 0);
        assert!(!storage.is_empty());
    }

    #[tokio::test]
    async fn test_missing_request_logs_out() {
        let (mut controller, _, storage, prompt) = controller();
        storage.seed_tokens(&fixtures::saved_tokens());
        controller.config.discovery.authorization_endpoint = "not a url".to_string();

        let result = controller.try_login().await;

        assert!(matches!(result, Err(SessionError::MissingRequest(_))));
        assert_eq!(prompt.prompt_count(), 0);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let (controller, _, _, _) = controller();
        let mut rx = controller.subscribe();

        controller.initialize().await;
        controller.initialize().await;

        assert!(controller.is_ready());
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().ready);
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::AuthorizationNotCompleted { outcome: "dismiss" };
        assert_eq!(err.to_string(), "Authorization not completed (outcome: dismiss)");
        assert_eq!(err.severity(), ErrorSeverity::Info);
        assert_eq!(SessionError::NotAuthenticated.to_string(), "Not authenticated");
    }

    /// Validates the severities that pick the log level of swallowed failures.
    #[test]
    fn test_session_error_classification() {
        let storage = SessionError::Storage(CommonError::storage_op("getItem", "locked"));
        assert_eq!(storage.severity(), ErrorSeverity::Error);
        assert!(!storage.is_retryable());

        let revoked = SessionError::from(OAuthClientError::RevocationFailed {
            status: 503,
            body: String::new(),
        });
        assert_eq!(revoked.severity(), ErrorSeverity::Warning);
        assert!(revoked.is_retryable());

        let prompt = SessionError::Prompt(CommonError::backend("browser", "busy", true));
        assert!(prompt.is_retryable());

        log_failure("get_token", &SessionError::NotAuthenticated);
        log_failure("logout", &revoked);
        log_failure("login", &storage);
    }
}

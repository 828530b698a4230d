//! OAuth 2.0 endpoint client
//!
//! Talks to the authorization server on behalf of the session controller:
//! - Authorization code exchange (with PKCE verifier)
//! - Token refresh
//! - Userinfo fetch
//! - Remote session revocation (`POST {authUrl}/api/backend/v1/logout`)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use super::traits::OAuthClientTrait;
use super::types::{AuthConfig, OAuthError, RawTokenResponse, TokenResponse, User};
use crate::error::{ErrorClassification, ErrorSeverity};
use crate::time::{Clock, SystemClock};

/// Default timeout applied to every request
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// OAuth server returned an RFC 6749 error body
    OAuthError(OAuthError),

    /// Server answered with an unexpected status and no OAuth error body
    UnexpectedStatus { status: u16, body: String },

    /// Remote logout did not answer 200
    RevocationFailed { status: u16, body: String },

    /// Failed to parse response
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::OAuthError(e) => write!(f, "OAuth error: {e}"),
            Self::UnexpectedStatus { status, body } => {
                write!(f, "Unexpected HTTP status {status}: {body}")
            }
            Self::RevocationFailed { status, body } => {
                write!(f, "Logout rejected with status {status}: {body}")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
        }
    }
}

impl std::error::Error for OAuthClientError {}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

impl ErrorClassification for OAuthClientError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            Self::UnexpectedStatus { status, .. } | Self::RevocationFailed { status, .. } => {
                *status >= 500
            }
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoRefreshToken => ErrorSeverity::Info,
            Self::OAuthError(_) | Self::RevocationFailed { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// OAuth 2.0 client for a single authorization server
#[derive(Clone)]
pub struct OAuthClient {
    config: AuthConfig,
    client: Client,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Create a client with the default request timeout
    ///
    /// ```
    /// use tokenflow_common::auth::{AuthConfig, OAuthClient};
    ///
    /// let config = AuthConfig::for_auth_url("client_id", "https://auth.example.com", "myapp://");
    /// let client = OAuthClient::new(config);
    /// assert_eq!(client.config().client_id, "client_id");
    /// ```
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self::with_timeout(config, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client with an explicit request timeout
    #[must_use]
    pub fn with_timeout(config: AuthConfig, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { config, client, clock: Arc::new(SystemClock) }
    }

    /// Replace the clock used to stamp `issued_at` on token responses
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn with_client_secret(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(secret) = &self.config.client_secret {
            params.push(("client_secret", secret.clone()));
        }
        params
    }

    async fn post_token_request(
        &self,
        params: &[(&'static str, String)],
    ) -> Result<TokenResponse, OAuthClientError> {
        let response =
            self.client.post(&self.config.discovery.token_endpoint).form(params).send().await?;
        let response = ensure_success(response).await?;

        let raw: RawTokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;
        let tokens = raw.into_response(self.clock.epoch_secs());

        if tokens.legacy_shape {
            warn!("Token endpoint returned a nested access_token object; unwrapped legacy shape");
        }

        Ok(tokens)
    }

    /// Exchange authorization code for tokens
    ///
    /// # Errors
    /// Returns error if the token endpoint rejects the code or the response
    /// cannot be decoded
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        debug!(endpoint = %self.config.discovery.token_endpoint, "Exchanging authorization code");

        let params = self.with_client_secret(vec![
            ("grant_type", "authorization_code".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("code", code.to_string()),
            ("redirect_uri", self.config.redirect_uri.clone()),
            ("code_verifier", code_verifier.to_string()),
        ]);

        self.post_token_request(&params).await
    }

    /// Refresh access token using refresh token
    ///
    /// # Errors
    /// Returns error if no refresh token is given, or the refresh is rejected
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        debug!(endpoint = %self.config.discovery.token_endpoint, "Refreshing access token");

        let params = self.with_client_secret(vec![
            ("grant_type", "refresh_token".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("refresh_token", refresh_token.to_string()),
        ]);

        self.post_token_request(&params).await
    }

    /// Fetch the user profile from the userinfo endpoint
    ///
    /// # Errors
    /// Returns error on a non-success status or an undecodable profile
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<User, OAuthClientError> {
        let response = self
            .client
            .get(&self.config.discovery.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))
    }

    /// Revoke the refresh token's session on the authorization server
    ///
    /// # Errors
    /// Returns [`OAuthClientError::RevocationFailed`] for any status other
    /// than 200
    pub async fn revoke_session(&self, refresh_token: &str) -> Result<(), OAuthClientError> {
        let response = self
            .client
            .post(self.config.logout_url())
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthClientError::RevocationFailed { status: status.as_u16(), body });
        }

        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, OAuthClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<OAuthError>(&body) {
        Ok(error) => Err(OAuthClientError::OAuthError(error)),
        Err(_) => Err(OAuthClientError::UnexpectedStatus { status: status.as_u16(), body }),
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.exchange_code(code, code_verifier).await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.refresh_access_token(refresh_token).await
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<User, OAuthClientError> {
        self.fetch_user_info(access_token).await
    }

    async fn revoke_session(&self, refresh_token: &str) -> Result<(), OAuthClientError> {
        self.revoke_session(refresh_token).await
    }
}

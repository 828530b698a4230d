//! OAuth 2.0 session types and structures
//!
//! Defines the persisted token snapshot, the decoded token endpoint
//! response, the user profile record, and the immutable client
//! configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// Token fields persisted between process runs
///
/// Every field defaults to empty/zero when absent. An empty
/// `refresh_token` or `access_token` means "no token" and must never be
/// sent as a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTokens {
    /// Refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Bearer access token
    pub access_token: String,

    /// Issue time of `access_token` in UNIX epoch seconds
    pub issued_at: i64,

    /// Access token lifetime in seconds as reported by the server
    pub expires_in: i64,
}

impl SavedTokens {
    /// Whether a refresh token is present (the session can be resumed)
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Apply a token response on top of this snapshot
    ///
    /// Mirrors the durable store's partial-write rule: access token and
    /// issue time are always replaced, while `expires_in` and
    /// `refresh_token` are only replaced when the response carries them.
    #[must_use]
    pub fn merged_with(&self, response: &TokenResponse) -> Self {
        Self {
            refresh_token: response
                .refresh_token
                .clone()
                .unwrap_or_else(|| self.refresh_token.clone()),
            access_token: response.access_token.clone(),
            issued_at: response.issued_at,
            expires_in: response.expires_in.unwrap_or(self.expires_in),
        }
    }
}

/// Decoded token endpoint response
///
/// Produced by the token exchange and refresh calls. `issued_at` is always
/// populated; when the server omits it the client stamps the receipt time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// Bearer access token (always a plain string after decoding)
    pub access_token: String,

    /// Refresh token, only when the server issued one
    pub refresh_token: Option<String>,

    /// Issue time in UNIX epoch seconds
    pub issued_at: i64,

    /// Access token lifetime in seconds, only when reported
    pub expires_in: Option<i64>,

    /// The access token arrived in the nested legacy shape
    pub legacy_shape: bool,
}

/// Shape of the `access_token` member of a token endpoint response
///
/// Some authorization servers wrap the token in a nested object
/// (`{"access_token": {"access_token": "..."}}`). Both shapes decode to a
/// plain string; the variant records which one was seen.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AccessTokenField {
    /// Standard RFC 6749 string
    Plain(String),

    /// Nested object carrying the real token in its own `access_token`
    Legacy {
        /// The unwrapped token
        access_token: String,
    },
}

impl AccessTokenField {
    /// Unwrap into the token string, reporting whether the legacy shape was used
    #[must_use]
    pub fn into_token(self) -> (String, bool) {
        match self {
            Self::Plain(token) => (token, false),
            Self::Legacy { access_token } => (access_token, true),
        }
    }
}

/// Raw token endpoint payload (RFC 6749 §5.1)
///
/// Only the members the session persists are decoded; `token_type`,
/// `scope` and `id_token` are ignored.
#[derive(Debug, Deserialize)]
pub struct RawTokenResponse {
    pub access_token: AccessTokenField,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub issued_at: Option<i64>,
}

impl RawTokenResponse {
    /// Finish decoding, stamping `received_at` when the server sent no issue time
    #[must_use]
    pub fn into_response(self, received_at: i64) -> TokenResponse {
        let (access_token, legacy_shape) = self.access_token.into_token();
        TokenResponse {
            access_token,
            refresh_token: self.refresh_token,
            issued_at: self.issued_at.unwrap_or(received_at),
            expires_in: self.expires_in,
            legacy_shape,
        }
    }
}

/// Authenticated user's profile as returned by the userinfo endpoint
///
/// Treated as an immutable snapshot: each fetch replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub email_confirmed: bool,
    pub enabled: bool,
    pub locked: bool,
    pub has_password: bool,
    pub mfa_enabled: bool,
    pub can_create_orgs: bool,
    pub update_password_required: bool,
    pub picture_url: String,
    pub created_at: i64,
    pub last_active_at: i64,
    pub metadata: serde_json::Value,
    pub properties: serde_json::Value,
}

/// Discovery endpoints describing the provider's protocol surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    /// Browser authorization endpoint
    pub authorization_endpoint: String,

    /// Token exchange/refresh endpoint
    pub token_endpoint: String,

    /// OIDC userinfo endpoint
    pub userinfo_endpoint: String,
}

impl Discovery {
    /// Endpoints laid out under `{auth_url}/propelauth/oauth/`
    #[must_use]
    pub fn for_auth_url(auth_url: &str) -> Self {
        let base = auth_url.trim_end_matches('/');
        Self {
            authorization_endpoint: format!("{base}/propelauth/oauth/authorize"),
            token_endpoint: format!("{base}/propelauth/oauth/token"),
            userinfo_endpoint: format!("{base}/propelauth/oauth/userinfo"),
        }
    }
}

/// OAuth client configuration
///
/// Immutable for the lifetime of the session controller that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth client ID
    pub client_id: String,

    /// Authorization server base URL (no trailing slash)
    pub auth_url: String,

    /// Discovery endpoints
    pub discovery: Discovery,

    /// Redirect URI registered for the application scheme
    pub redirect_uri: String,

    /// Client secret; unused by the PKCE flow but forwarded when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl AuthConfig {
    /// Create a new configuration with explicit discovery endpoints
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        auth_url: impl Into<String>,
        discovery: Discovery,
        redirect_uri: impl Into<String>,
    ) -> Self {
        let auth_url: String = auth_url.into();
        Self {
            client_id: client_id.into(),
            auth_url: auth_url.trim_end_matches('/').to_string(),
            discovery,
            redirect_uri: redirect_uri.into(),
            client_secret: None,
        }
    }

    /// Create a configuration whose discovery endpoints derive from `auth_url`
    #[must_use]
    pub fn for_auth_url(
        client_id: impl Into<String>,
        auth_url: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        let auth_url: String = auth_url.into();
        let discovery = Discovery::for_auth_url(&auth_url);
        Self::new(client_id, auth_url, discovery, redirect_uri)
    }

    /// Attach a client secret
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Remote revocation endpoint
    #[must_use]
    pub fn logout_url(&self) -> String {
        format!("{}/api/backend/v1/logout", self.auth_url)
    }

    /// Hosted account-management page
    #[must_use]
    pub fn account_url(&self) -> String {
        format!("{}/account", self.auth_url)
    }

    /// Check required fields and endpoint URLs
    pub fn validate(&self) -> CommonResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(CommonError::config_field("client_id", "must not be empty"));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(CommonError::config_field("redirect_uri", "must not be empty"));
        }

        let endpoints = [
            ("auth_url", self.auth_url.as_str()),
            ("authorization_endpoint", self.discovery.authorization_endpoint.as_str()),
            ("token_endpoint", self.discovery.token_endpoint.as_str()),
            ("userinfo_endpoint", self.discovery.userinfo_endpoint.as_str()),
        ];
        for (field, value) in endpoints {
            url::Url::parse(value)
                .map_err(|e| CommonError::config_field(field, format!("invalid URL '{value}': {e}")))?;
        }

        Ok(())
    }
}

/// Which redirect hint to embed in the account page URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectUriType {
    /// Use the configured redirect URI
    Default,
    /// Use the caller-supplied redirect URI
    Custom,
    /// No redirect hint
    #[default]
    None,
}

/// Options for [`crate::auth::account_page_url`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPageUrlOptions {
    pub redirect_uri_type: RedirectUriType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

impl AccountPageUrlOptions {
    /// Bare account page, no redirect hint
    #[must_use]
    pub fn none() -> Self {
        Self { redirect_uri_type: RedirectUriType::None, redirect_uri: None }
    }

    /// Redirect back to the configured redirect URI
    #[must_use]
    pub fn default_redirect() -> Self {
        Self { redirect_uri_type: RedirectUriType::Default, redirect_uri: None }
    }

    /// Redirect back to a caller-chosen URI
    #[must_use]
    pub fn custom(redirect_uri: impl Into<String>) -> Self {
        Self { redirect_uri_type: RedirectUriType::Custom, redirect_uri: Some(redirect_uri.into()) }
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}

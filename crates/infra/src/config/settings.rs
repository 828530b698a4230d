//! Session settings and their validation

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokenflow_common::auth::{AuthConfig, Discovery};
use tokenflow_common::security::DEFAULT_SERVICE_NAME;
use tokenflow_common::CommonError;

/// Redirect scheme used when neither a scheme nor a redirect URI is set
pub const DEFAULT_SCHEME: &str = "minimalauth";

/// Default per-request HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Redirect URI registered for an application scheme
///
/// ```
/// use tokenflow_infra::config::redirect_uri_for_scheme;
///
/// assert_eq!(redirect_uri_for_scheme("minimalauth"), "minimalauth://");
/// ```
#[must_use]
pub fn redirect_uri_for_scheme(scheme: &str) -> String {
    format!("{scheme}://")
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_keychain_service() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Process-level settings for one authorization server client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// OAuth client ID
    pub client_id: String,

    /// Authorization server base URL
    pub auth_url: String,

    /// Explicit redirect URI; derived from `scheme` when absent
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Application URL scheme
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default)]
    pub client_secret: Option<String>,

    /// Endpoint overrides; derived from `auth_url` when absent
    #[serde(default)]
    pub authorize_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub userinfo_url: Option<String>,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Keychain service name for persisted tokens
    #[serde(default = "default_keychain_service")]
    pub keychain_service: String,

    /// `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Settings {
    /// Settings with defaults for everything but the two required fields
    #[must_use]
    pub fn new(client_id: impl Into<String>, auth_url: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            auth_url: auth_url.into(),
            redirect_uri: None,
            scheme: default_scheme(),
            client_secret: None,
            authorize_url: None,
            token_url: None,
            userinfo_url: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            keychain_service: default_keychain_service(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }

    /// Explicit redirect URI, or `{scheme}://`
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        self.redirect_uri.clone().unwrap_or_else(|| redirect_uri_for_scheme(&self.scheme))
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Build and validate the client configuration
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` when a required field is empty or an
    /// endpoint is not an absolute URL.
    pub fn to_auth_config(&self) -> Result<AuthConfig, ConfigError> {
        if self.auth_url.trim().is_empty() {
            return Err(CommonError::config_field("auth_url", "must not be empty").into());
        }

        let derived = Discovery::for_auth_url(&self.auth_url);
        let discovery = Discovery {
            authorization_endpoint: self
                .authorize_url
                .clone()
                .unwrap_or(derived.authorization_endpoint),
            token_endpoint: self.token_url.clone().unwrap_or(derived.token_endpoint),
            userinfo_endpoint: self.userinfo_url.clone().unwrap_or(derived.userinfo_endpoint),
        };

        let mut config =
            AuthConfig::new(&self.client_id, &self.auth_url, discovery, self.redirect_uri());
        config.client_secret = self.client_secret.clone();
        config.validate()?;
        Ok(config)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is not set
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable is set but unusable
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// No config file at the given path or any probed location
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// File content does not parse
    #[error("Invalid {format} format: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// Parsed settings fail validation
    #[error(transparent)]
    Invalid(#[from] CommonError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_uri_defaults_to_scheme() {
        let settings = Settings::new("client", "https://auth.example.com");
        assert_eq!(settings.redirect_uri(), "minimalauth://");

        let custom = Settings { scheme: "myapp".to_string(), ..settings.clone() };
        assert_eq!(custom.redirect_uri(), "myapp://");

        let explicit = Settings { redirect_uri: Some("other://cb".to_string()), ..settings };
        assert_eq!(explicit.redirect_uri(), "other://cb");
    }

    #[test]
    fn to_auth_config_derives_endpoints() {
        let config = Settings::new("client", "https://auth.example.com/").to_auth_config().unwrap();

        assert_eq!(config.auth_url, "https://auth.example.com");
        assert_eq!(
            config.discovery.userinfo_endpoint,
            "https://auth.example.com/propelauth/oauth/userinfo"
        );
        assert_eq!(config.redirect_uri, "minimalauth://");
        assert!(config.client_secret.is_none());
    }

    #[test]
    fn to_auth_config_honors_overrides() {
        let settings = Settings {
            token_url: Some("https://tokens.example.com/token".to_string()),
            client_secret: Some("s".to_string()),
            ..Settings::new("client", "https://auth.example.com")
        };
        let config = settings.to_auth_config().unwrap();

        assert_eq!(config.discovery.token_endpoint, "https://tokens.example.com/token");
        assert_eq!(config.client_secret.as_deref(), Some("s"));
    }

    #[test]
    fn to_auth_config_rejects_invalid_values() {
        assert!(matches!(
            Settings::new("", "https://auth.example.com").to_auth_config(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(Settings::new("client", "").to_auth_config().is_err());
        assert!(Settings::new("client", "auth.example.com").to_auth_config().is_err());
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"client_id":"c","auth_url":"https://a.example.com"}"#)
                .unwrap();

        assert_eq!(settings.scheme, DEFAULT_SCHEME);
        assert_eq!(settings.http_timeout(), Duration::from_secs(30));
        assert_eq!(settings.keychain_service, DEFAULT_SERVICE_NAME);
        assert!(!settings.json_logs());
    }
}

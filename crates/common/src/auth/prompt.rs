//! Browser-mediated authorization request and its outcome
//!
//! The controller builds an [`AuthorizationRequest`] per login attempt and
//! hands it to an [`crate::auth::AuthorizationPrompt`] implementation, which
//! opens the system browser and reports how the user left it.

use super::pkce::PKCEChallenge;
use super::types::AuthConfig;
use crate::error::{CommonError, CommonResult};

/// One pending authorization-code request with PKCE enabled
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    client_id: String,
    redirect_uri: String,
    authorization_endpoint: String,
    challenge: PKCEChallenge,
}

impl AuthorizationRequest {
    /// Response type requested from the authorization endpoint
    pub const RESPONSE_TYPE: &'static str = "code";

    /// Prepare a request for the configured client
    ///
    /// # Errors
    /// Returns a configuration error when the authorization endpoint is not
    /// an absolute URL; the caller treats that as a missing request context.
    pub fn new(config: &AuthConfig) -> CommonResult<Self> {
        url::Url::parse(&config.discovery.authorization_endpoint).map_err(|e| {
            CommonError::config_field("authorization_endpoint", e.to_string())
        })?;

        Ok(Self {
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorization_endpoint: config.discovery.authorization_endpoint.clone(),
            challenge: PKCEChallenge::generate(),
        })
    }

    /// PKCE verifier to send with the code exchange
    #[must_use]
    pub fn code_verifier(&self) -> &str {
        &self.challenge.code_verifier
    }

    /// CSRF state expected back on the redirect
    #[must_use]
    pub fn state(&self) -> &str {
        &self.challenge.state
    }

    /// Redirect URI the browser returns to
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Full URL to open in the browser
    #[must_use]
    pub fn authorize_url(&self) -> String {
        let params = [
            ("response_type", Self::RESPONSE_TYPE),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("state", self.challenge.state.as_str()),
            ("code_challenge", self.challenge.code_challenge.as_str()),
            ("code_challenge_method", self.challenge.challenge_method()),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.authorization_endpoint, query_string)
    }

    /// Reject a success outcome whose `state` does not match this request
    #[must_use]
    pub fn verify(&self, outcome: PromptOutcome) -> PromptOutcome {
        match outcome {
            PromptOutcome::Success { state: Some(ref returned), .. }
                if !super::pkce::validate_state(&self.challenge.state, returned) =>
            {
                PromptOutcome::Error { message: "state mismatch in authorization response".into() }
            }
            other => other,
        }
    }
}

/// How the browser prompt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Redirect received with an authorization code
    Success { code: String, state: Option<String> },
    /// User cancelled
    Cancel,
    /// Browser was dismissed without a redirect
    Dismiss,
    /// Browser opened but control returned before completion
    Opened,
    /// Another prompt is already in progress
    Locked,
    /// Provider reported an error on the redirect
    Error { message: String },
}

impl PromptOutcome {
    /// Short name used in logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Cancel => "cancel",
            Self::Dismiss => "dismiss",
            Self::Opened => "opened",
            Self::Locked => "locked",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::for_auth_url("client_123", "https://auth.example.com", "minimalauth://")
    }

    #[test]
    fn authorize_url_carries_pkce_parameters() {
        let request = AuthorizationRequest::new(&config()).unwrap();
        let url = request.authorize_url();

        assert!(url.starts_with("https://auth.example.com/propelauth/oauth/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client_123"));
        assert!(url.contains("redirect_uri=minimalauth%3A%2F%2F"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("state={}", request.state())));
    }

    #[test]
    fn new_rejects_relative_authorization_endpoint() {
        let mut config = config();
        config.discovery.authorization_endpoint = "/authorize".to_string();
        assert!(AuthorizationRequest::new(&config).is_err());
    }

    #[test]
    fn verify_turns_state_mismatch_into_error() {
        let request = AuthorizationRequest::new(&config()).unwrap();

        let forged = PromptOutcome::Success { code: "c".into(), state: Some("forged".into()) };
        assert_eq!(request.verify(forged).kind(), "error");

        let genuine =
            PromptOutcome::Success { code: "c".into(), state: Some(request.state().to_string()) };
        assert_eq!(request.verify(genuine).kind(), "success");

        let stateless = PromptOutcome::Success { code: "c".into(), state: None };
        assert_eq!(request.verify(stateless).kind(), "success");
        assert_eq!(request.verify(PromptOutcome::Cancel), PromptOutcome::Cancel);
    }
}

//! Capability interfaces consumed by the session controller
//!
//! The browser prompt, the OAuth endpoints, and durable key-value storage
//! are external collaborators. These traits are the seams where production
//! implementations ([`super::OAuthClient`], `KeychainStorage`) and the test
//! mocks in [`crate::testing`] plug in.

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::prompt::{AuthorizationRequest, PromptOutcome};
use super::types::{TokenResponse, User};
use crate::error::CommonResult;

/// Durable string key-value storage
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a value; `Ok(None)` when the key does not exist
    async fn get_item(&self, key: &str) -> CommonResult<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set_item(&self, key: &str, value: &str) -> CommonResult<()>;

    /// Delete a value; succeeds when the key does not exist
    async fn remove_item(&self, key: &str) -> CommonResult<()>;
}

/// Browser-mediated authorization
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Open the authorization page and wait for the user to finish
    ///
    /// User cancellation is reported as an outcome, never as an error.
    ///
    /// # Errors
    /// Returns error only when the prompt itself could not be shown
    async fn prompt(&self, request: &AuthorizationRequest) -> CommonResult<PromptOutcome>;
}

/// Trait for OAuth endpoint operations
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Exchange an authorization code (with its PKCE verifier) for tokens
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError>;

    /// Obtain a new access token with a refresh token
    async fn refresh_access_token(&self, refresh_token: &str)
        -> Result<TokenResponse, OAuthClientError>;

    /// Fetch the user profile for an access token
    async fn fetch_user_info(&self, access_token: &str) -> Result<User, OAuthClientError>;

    /// Revoke the session behind a refresh token on the authorization server
    async fn revoke_session(&self, refresh_token: &str) -> Result<(), OAuthClientError>;
}

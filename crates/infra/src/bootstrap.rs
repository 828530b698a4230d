//! Wiring from loaded settings to a running session

use std::sync::Arc;

use tokenflow_common::auth::{
    AuthContext, AuthorizationPrompt, KeyValueStorage, OAuthClient, SessionController,
};
use tokenflow_common::security::KeychainStorage;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{ConfigError, Settings};

/// Session context over the HTTP client
pub type HttpAuthContext<S, P> = AuthContext<OAuthClient, S, P>;

/// Build a controller over the HTTP client
///
/// # Errors
/// Returns `ConfigError::Invalid` when the settings fail validation.
pub fn build_controller<S, P>(
    settings: &Settings,
    storage: Arc<S>,
    prompt: Arc<P>,
) -> Result<SessionController<OAuthClient, S, P>, ConfigError>
where
    S: KeyValueStorage,
    P: AuthorizationPrompt,
{
    let config = settings.to_auth_config()?;
    let client = OAuthClient::with_timeout(config.clone(), settings.http_timeout());

    info!(
        client_id = %config.client_id,
        auth_url = %config.auth_url,
        redirect_uri = %config.redirect_uri,
        "Session controller configured"
    );

    Ok(SessionController::new(config, Arc::new(client), storage, prompt))
}

/// Build a controller and start its silent acquisition in the background
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
/// Returns `ConfigError::Invalid` when the settings fail validation.
pub fn start<S, P>(
    settings: &Settings,
    storage: Arc<S>,
    prompt: Arc<P>,
) -> Result<(HttpAuthContext<S, P>, JoinHandle<()>), ConfigError>
where
    S: KeyValueStorage + 'static,
    P: AuthorizationPrompt + 'static,
{
    let controller = build_controller(settings, storage, prompt)?;
    Ok(AuthContext::start(controller))
}

/// [`start`] with tokens persisted in the platform keychain
///
/// # Errors
/// Returns `ConfigError::Invalid` when the settings fail validation.
pub fn start_with_keychain<P>(
    settings: &Settings,
    prompt: Arc<P>,
) -> Result<(HttpAuthContext<KeychainStorage, P>, JoinHandle<()>), ConfigError>
where
    P: AuthorizationPrompt + 'static,
{
    let storage = Arc::new(KeychainStorage::new(settings.keychain_service.clone()));
    start(settings, storage, prompt)
}

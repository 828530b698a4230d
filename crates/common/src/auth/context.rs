//! Application-wide authentication context
//!
//! Constructed once at application start around a [`SessionController`],
//! shared by cloning, and dropped at exit. Views read session state through
//! it and gate their rendering on the one-time `ready` flag.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::session::{Session, SessionController};
use super::traits::{AuthorizationPrompt, KeyValueStorage, OAuthClientTrait};
use super::types::{AccountPageUrlOptions, User};

/// Shared handle over a session controller
pub struct AuthContext<C, S, P>
where
    C: OAuthClientTrait,
    S: KeyValueStorage,
    P: AuthorizationPrompt,
{
    controller: Arc<SessionController<C, S, P>>,
}

impl<C, S, P> Clone for AuthContext<C, S, P>
where
    C: OAuthClientTrait,
    S: KeyValueStorage,
    P: AuthorizationPrompt,
{
    fn clone(&self) -> Self {
        Self { controller: Arc::clone(&self.controller) }
    }
}

impl<C, S, P> AuthContext<C, S, P>
where
    C: OAuthClientTrait + 'static,
    S: KeyValueStorage + 'static,
    P: AuthorizationPrompt + 'static,
{
    /// Wrap a controller without starting it
    pub fn new(controller: SessionController<C, S, P>) -> Self {
        Self { controller: Arc::new(controller) }
    }

    /// Wrap a controller and run its startup acquisition in the background
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(controller: SessionController<C, S, P>) -> (Self, JoinHandle<()>) {
        let context = Self::new(controller);
        let background = context.clone();
        let handle = tokio::spawn(async move {
            background.initialize().await;
        });
        (context, handle)
    }

    /// Run the startup acquisition (once per controller)
    pub async fn initialize(&self) {
        self.controller.initialize().await;
    }

    /// Wait until the startup acquisition has completed
    pub async fn wait_until_ready(&self) {
        let mut rx = self.controller.subscribe();
        if rx.wait_for(|session| session.ready).await.is_err() {
            debug!("Session channel closed before ready");
        }
    }

    /// Invoke `render` with the current session only once ready
    ///
    /// Returns `None` while the startup acquisition is still running.
    pub fn render<R>(&self, render: impl FnOnce(&Session) -> R) -> Option<R> {
        let session = self.controller.session();
        session.ready.then(|| render(&session))
    }

    pub fn ready(&self) -> bool {
        self.controller.is_ready()
    }

    pub fn loading(&self) -> bool {
        self.controller.session().loading
    }

    pub fn access_token(&self) -> String {
        self.controller.session().access_token
    }

    pub fn user(&self) -> Option<User> {
        self.controller.session().user
    }

    /// `user` presence is the sole authentication signal
    pub fn is_authenticated(&self) -> bool {
        self.controller.session().is_authenticated()
    }

    pub fn session(&self) -> Session {
        self.controller.session()
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.controller.subscribe()
    }

    pub async fn login(&self) {
        self.controller.login().await;
    }

    pub async fn logout(&self) {
        self.controller.logout().await;
    }

    pub async fn get_token(&self) -> String {
        self.controller.get_token().await
    }

    pub async fn get_user(&self) -> Option<User> {
        self.controller.get_user().await
    }

    pub fn get_account_page_url(&self, options: &AccountPageUrlOptions) -> String {
        self.controller.get_account_page_url(options)
    }

    /// Underlying controller, for the typed `try_*` operations
    pub fn controller(&self) -> &Arc<SessionController<C, S, P>> {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockOAuthClient, MockPrompt, MockStorage};
    use crate::time::MockClock;

    type Controller = SessionController<MockOAuthClient, MockStorage, MockPrompt>;

    fn controller(storage: MockStorage) -> Controller {
        SessionController::new(
            fixtures::auth_config(),
            Arc::new(MockOAuthClient::new()),
            Arc::new(storage),
            Arc::new(MockPrompt::new()),
        )
        .with_clock(Arc::new(MockClock::at_epoch_secs(fixtures::ISSUED_AT as u64 + 60)))
    }

    #[tokio::test]
    async fn render_is_gated_until_ready() {
        let ctx = AuthContext::new(controller(MockStorage::new()));

        assert!(ctx.render(|_| ()).is_none());
        ctx.initialize().await;
        assert_eq!(ctx.render(|session| session.ready), Some(true));
    }

    #[tokio::test]
    async fn start_resolves_ready_with_saved_session() {
        let storage = MockStorage::new();
        storage.seed_tokens(&fixtures::saved_tokens());
        let (ctx, handle) = AuthContext::start(controller(storage));

        ctx.wait_until_ready().await;
        handle.await.unwrap();

        assert!(ctx.ready());
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.access_token(), fixtures::ACCESS_TOKEN);
        assert!(!ctx.loading());
    }
}

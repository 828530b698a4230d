//! OAuth 2.0 authorization-code + PKCE session management
//!
//! Acquires tokens through a browser prompt, persists them, silently
//! refreshes them on use, and exposes a consistent authenticated-user view
//! to the rest of the application.
//!
//! # Features
//!
//! - **PKCE Flow**: RFC 7636 `S256` challenge and CSRF `state` per login
//! - **Token Store**: four-key durable persistence with partial writes
//! - **Refresh Policy**: fixed five-minute window after issuance
//! - **Session Controller**: login, silent refresh, profile, logout
//! - **Auth Context**: shared handle with a one-time readiness gate
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   AuthContext   │  Readiness gate + subscription
//! └────────┬────────┘
//!          │
//!          └──► SessionController
//!                    │
//!                    ├──► AuthorizationPrompt (browser)
//!                    ├──► OAuthClientTrait    (token/userinfo/logout)
//!                    ├──► TokenStore ──► KeyValueStorage
//!                    └──► policy::should_refresh
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokenflow_common::auth::{AuthConfig, AuthContext, OAuthClient, SessionController};
//! use tokenflow_common::testing::{MockPrompt, MockStorage};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AuthConfig::for_auth_url("client_id", "https://auth.example.com", "myapp://");
//!     let client = Arc::new(OAuthClient::new(config.clone()));
//!     let controller = SessionController::new(
//!         config,
//!         client,
//!         Arc::new(MockStorage::new()),
//!         Arc::new(MockPrompt::new()),
//!     );
//!
//!     let (auth, _startup) = AuthContext::start(controller);
//!     auth.wait_until_ready().await;
//!
//!     if !auth.is_authenticated() {
//!         auth.login().await;
//!     }
//!     let token = auth.get_token().await;
//!     println!("authenticated: {}", !token.is_empty());
//! }
//! ```

pub mod account;
pub mod client;
pub mod context;
pub mod pkce;
pub mod policy;
pub mod prompt;
pub mod session;
pub mod store;
pub mod traits;
pub mod types;

pub use account::account_page_url;
pub use client::{OAuthClient, OAuthClientError, DEFAULT_HTTP_TIMEOUT};
pub use context::AuthContext;
pub use pkce::PKCEChallenge;
pub use policy::{should_refresh, REFRESH_WINDOW_MS};
pub use prompt::{AuthorizationRequest, PromptOutcome};
pub use session::{Session, SessionController, SessionError, SessionPhase};
pub use store::TokenStore;
pub use traits::{AuthorizationPrompt, KeyValueStorage, OAuthClientTrait};
pub use types::{
    AccessTokenField, AccountPageUrlOptions, AuthConfig, Discovery, OAuthError, RedirectUriType,
    SavedTokens, TokenResponse, User,
};

//! # Tokenflow Infrastructure
//!
//! Process-level wiring around `tokenflow-common`:
//! - Settings loaded from `TOKENFLOW_*` environment variables or files
//! - `tracing` subscriber setup
//! - Bootstrap from settings to a running [`AuthContext`]
//!
//! [`AuthContext`]: tokenflow_common::auth::AuthContext

pub mod bootstrap;
pub mod config;
pub mod observability;

pub use bootstrap::{build_controller, start, start_with_keychain, HttpAuthContext};
pub use config::{ConfigError, Settings};
pub use observability::init_tracing;

//! Configuration loading and management
//!
//! Session settings come from `TOKENFLOW_*` environment variables or a
//! TOML/JSON file, and convert into the client's [`AuthConfig`].
//!
//! [`AuthConfig`]: tokenflow_common::auth::AuthConfig

pub mod loader;
pub mod settings;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
pub use settings::{
    redirect_uri_for_scheme, ConfigError, Settings, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_SCHEME,
};

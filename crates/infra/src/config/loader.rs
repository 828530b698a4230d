//! Configuration loader
//!
//! Loads session settings from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the process environment, if one exists
//! 2. Attempts to load from environment variables
//! 3. If the required variables are missing, falls back to a config file
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TOKENFLOW_CLIENT_ID`: OAuth client ID (required)
//! - `TOKENFLOW_AUTH_URL`: Authorization server base URL (required)
//! - `TOKENFLOW_REDIRECT_URI`: Explicit redirect URI
//! - `TOKENFLOW_SCHEME`: Application URL scheme (default `minimalauth`)
//! - `TOKENFLOW_CLIENT_SECRET`: Client secret
//! - `TOKENFLOW_AUTHORIZE_URL`, `TOKENFLOW_TOKEN_URL`,
//!   `TOKENFLOW_USERINFO_URL`: Endpoint overrides
//! - `TOKENFLOW_HTTP_TIMEOUT_SECS`: Request timeout in seconds
//! - `TOKENFLOW_KEYCHAIN_SERVICE`: Keychain service name
//! - `TOKENFLOW_LOG_LEVEL`: Log filter directive
//! - `TOKENFLOW_LOG_FORMAT`: `text` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./tokenflow.toml` or `./tokenflow.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use super::settings::{ConfigError, Settings};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["tokenflow.toml", "tokenflow.json", "config.toml", "config.json"];

/// Load settings with automatic fallback strategy
///
/// # Errors
/// Returns `ConfigError` if settings cannot be loaded from either source or
/// fail validation.
pub fn load() -> Result<Settings, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let settings = match load_from_env() {
        Ok(settings) => {
            tracing::info!("Configuration loaded from environment variables");
            settings
        }
        Err(ConfigError::MissingVar(var)) => {
            tracing::debug!(missing = %var, "Environment incomplete, trying file");
            load_from_file(None)?
        }
        Err(e) => return Err(e),
    };

    settings.to_auth_config()?;
    Ok(settings)
}

/// Load settings from `TOKENFLOW_*` environment variables
///
/// # Errors
/// Returns `ConfigError::MissingVar` if a required variable is unset and
/// `ConfigError::InvalidValue` if a numeric variable does not parse.
pub fn load_from_env() -> Result<Settings, ConfigError> {
    let mut settings = Settings::new(
        env_var("TOKENFLOW_CLIENT_ID")?,
        env_var("TOKENFLOW_AUTH_URL")?,
    );

    settings.redirect_uri = optional_env_var("TOKENFLOW_REDIRECT_URI");
    settings.client_secret = optional_env_var("TOKENFLOW_CLIENT_SECRET");
    settings.authorize_url = optional_env_var("TOKENFLOW_AUTHORIZE_URL");
    settings.token_url = optional_env_var("TOKENFLOW_TOKEN_URL");
    settings.userinfo_url = optional_env_var("TOKENFLOW_USERINFO_URL");

    if let Some(scheme) = optional_env_var("TOKENFLOW_SCHEME") {
        settings.scheme = scheme;
    }
    if let Some(timeout) = optional_env_var("TOKENFLOW_HTTP_TIMEOUT_SECS") {
        settings.http_timeout_secs = timeout.parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue {
                key: "TOKENFLOW_HTTP_TIMEOUT_SECS".to_string(),
                message: e.to_string(),
            }
        })?;
    }
    if let Some(service) = optional_env_var("TOKENFLOW_KEYCHAIN_SERVICE") {
        settings.keychain_service = service;
    }
    if let Some(level) = optional_env_var("TOKENFLOW_LOG_LEVEL") {
        settings.log_level = level;
    }
    if let Some(format) = optional_env_var("TOKENFLOW_LOG_FORMAT") {
        settings.log_format = format;
    }

    Ok(settings)
}

/// Load settings from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected
/// by file extension.
///
/// # Errors
/// Returns `ConfigError::NotFound` when no file exists and
/// `ConfigError::Parse` when the content is malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Settings, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.display().to_string()));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConfigError::NotFound("no config file in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)?;
    parse_config(&contents, &config_path)
}

/// Parse settings by file extension; extensionless files are read as JSON
fn parse_config(contents: &str, path: &Path) -> Result<Settings, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConfigError::Parse { format: "TOML", message: e.to_string() }),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConfigError::Parse { format: "JSON", message: e.to_string() }),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// First existing config file in the working directory or next to the
/// executable
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    probe_dirs(&dirs)
}

fn probe_dirs(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String, ConfigError> {
    optional_env_var(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))
}

/// Set and non-blank variable
fn optional_env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 12] = [
        "TOKENFLOW_CLIENT_ID",
        "TOKENFLOW_AUTH_URL",
        "TOKENFLOW_REDIRECT_URI",
        "TOKENFLOW_SCHEME",
        "TOKENFLOW_CLIENT_SECRET",
        "TOKENFLOW_AUTHORIZE_URL",
        "TOKENFLOW_TOKEN_URL",
        "TOKENFLOW_USERINFO_URL",
        "TOKENFLOW_HTTP_TIMEOUT_SECS",
        "TOKENFLOW_KEYCHAIN_SERVICE",
        "TOKENFLOW_LOG_LEVEL",
        "TOKENFLOW_LOG_FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn temp_config(contents: &str, extension: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(&format!(".{extension}")).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_env_required_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("TOKENFLOW_CLIENT_ID", "client");
        std::env::set_var("TOKENFLOW_AUTH_URL", "https://auth.example.com");

        let settings = load_from_env().unwrap();
        assert_eq!(settings, Settings::new("client", "https://auth.example.com"));

        clear_env();
    }

    #[test]
    fn test_load_from_env_optional_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("TOKENFLOW_CLIENT_ID", "client");
        std::env::set_var("TOKENFLOW_AUTH_URL", "https://auth.example.com");
        std::env::set_var("TOKENFLOW_SCHEME", "myapp");
        std::env::set_var("TOKENFLOW_CLIENT_SECRET", "s3cret");
        std::env::set_var("TOKENFLOW_HTTP_TIMEOUT_SECS", "5");
        std::env::set_var("TOKENFLOW_KEYCHAIN_SERVICE", "com.example.tokens");
        std::env::set_var("TOKENFLOW_LOG_FORMAT", "json");
        std::env::set_var("TOKENFLOW_REDIRECT_URI", "  ");

        let settings = load_from_env().unwrap();
        assert_eq!(settings.redirect_uri(), "myapp://");
        assert_eq!(settings.client_secret.as_deref(), Some("s3cret"));
        assert_eq!(settings.http_timeout_secs, 5);
        assert_eq!(settings.keychain_service, "com.example.tokens");
        assert!(settings.json_logs());

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("TOKENFLOW_CLIENT_ID", "client");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "TOKENFLOW_AUTH_URL"));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_timeout() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("TOKENFLOW_CLIENT_ID", "client");
        std::env::set_var("TOKENFLOW_AUTH_URL", "https://auth.example.com");
        std::env::set_var("TOKENFLOW_HTTP_TIMEOUT_SECS", "soon");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let file = temp_config(
            r#"
client_id = "client"
auth_url = "https://auth.example.com"
scheme = "myapp"
http_timeout_secs = 10
"#,
            "toml",
        );

        let settings = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(settings.client_id, "client");
        assert_eq!(settings.redirect_uri(), "myapp://");
        assert_eq!(settings.http_timeout_secs, 10);
    }

    #[test]
    fn test_load_from_file_json() {
        let file = temp_config(
            r#"{"client_id":"client","auth_url":"https://auth.example.com","log_level":"debug"}"#,
            "json",
        );

        let settings = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.scheme, "minimalauth");
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/tokenflow.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_parse_config_errors() {
        let err = parse_config("not = [valid", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "TOML", .. }));

        let err = parse_config("{}", Path::new("x.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "JSON", .. }));

        let err = parse_config("", Path::new("x.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == "yaml"));
    }

    #[test]
    fn test_probe_dirs_prefers_tokenflow_toml() {
        let dir = TempDir::new().unwrap();
        assert!(probe_dirs(&[dir.path().to_path_buf()]).is_none());

        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("tokenflow.toml"), "").unwrap();

        assert_eq!(probe_dirs(&[dir.path().to_path_buf()]), Some(dir.path().join("tokenflow.toml")));
    }
}

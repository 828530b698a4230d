//! Logging setup for hosts embedding the session manager

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Install the global `tracing` subscriber
///
/// `level` is an `EnvFilter` directive; an unparsable directive falls back
/// to `info`. Uses `try_init`, so repeated calls (as in tests) are no-ops.
pub fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if json {
        fmt::fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt::fmt().with_env_filter(filter).try_init()
    };
    drop(result);
}

/// [`init_tracing`] from loaded settings
pub fn init_from_settings(settings: &Settings) {
    init_tracing(&settings.log_level, settings.json_logs());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_repeatable() {
        init_tracing("tokenflow=debug", false);
        init_tracing("not a [valid directive", true);
        init_from_settings(&Settings::new("client", "https://auth.example.com"));
        tracing::info!("still logging");
    }
}

//! Diagnostic logging to stderr.

use crate::constants;
use tracing_subscriber::EnvFilter;

/// Filter from `CREDS_LOG`, then the config value, then the default.
pub fn env_filter(config_filter: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(constants::LOG_ENV)
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or(constants::DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(constants::DEFAULT_LOG_FILTER))
}

/// Install the global subscriber. Stdout is left to command output.
pub fn init(config_filter: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config_filter))
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .compact()
        .try_init();
}

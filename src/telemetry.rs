//! Log initialization for hosts that do not install their own subscriber.

use tracing_subscriber::EnvFilter;

use crate::config::{TelemetryConfig, ValidationError};

/// Installs a global `tracing` subscriber built from `config`.
///
/// Returns `Ok(false)` when another subscriber was already installed, so
/// calling this more than once is harmless.
///
/// # Errors
///
/// Returns `ValidationError::InvalidLogLevel` when the filter does not parse.
pub fn init_tracing(config: &TelemetryConfig) -> Result<bool, ValidationError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| ValidationError::InvalidLogLevel(e.to_string()))?;

    let installed = if config.json_output {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    };

    Ok(installed)
}

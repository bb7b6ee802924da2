//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SUBSCRIPTIONS_RUNTIME` prefix and nested values use double underscores as
//! separators. Every section has defaults, so an empty environment is valid.
//!
//! # Example
//!
//! ```no_run
//! use subscriptions_runtime::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Activities served from {}", config.runtime.service_origin);
//! ```

mod error;
mod metering;
mod runtime;
mod telemetry;

pub use error::{ConfigError, ValidationError};
pub use metering::MeteringConfig;
pub use runtime::{ControlMode, RuntimeSettings};
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Service endpoints and start behaviour
    #[serde(default)]
    pub runtime: RuntimeSettings,

    /// Default metering quota
    #[serde(default)]
    pub metering: MeteringConfig,

    /// Log output
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SUBSCRIPTIONS_RUNTIME` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SUBSCRIPTIONS_RUNTIME__RUNTIME__SERVICE_ORIGIN=https://...` -> `runtime.service_origin`
    /// - `SUBSCRIPTIONS_RUNTIME__METERING__QUOTA_MAX=5` -> `metering.quota_max = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SUBSCRIPTIONS_RUNTIME")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.runtime.validate()?;
        self.metering.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

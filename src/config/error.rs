//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Service origin must be an https URL without a path")]
    InvalidServiceOrigin,

    #[error("API base path must start with '/'")]
    InvalidApiBasePath,

    #[error("Metering quota_max must be positive")]
    InvalidQuotaMax,

    #[error("Metering quota_left exceeds quota_max")]
    QuotaLeftExceedsMax,

    #[error("Invalid log filter directive: {0}")]
    InvalidLogLevel(String),
}

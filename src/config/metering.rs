//! Metering configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::metering::MeteringResponse;

/// Default free-read quota used when the server omits values
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MeteringConfig {
    #[serde(default = "default_quota_left")]
    pub quota_left: u32,

    #[serde(default = "default_quota_max")]
    pub quota_max: u32,

    #[serde(default = "default_quota_period")]
    pub quota_period: String,

    /// Whether the host page should display the meter
    #[serde(default = "default_display")]
    pub display: bool,
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            quota_left: default_quota_left(),
            quota_max: default_quota_max(),
            quota_period: default_quota_period(),
            display: default_display(),
        }
    }
}

impl MeteringConfig {
    /// Defaults as a metering response
    pub fn default_response(&self) -> MeteringResponse {
        MeteringResponse {
            quota_left: i64::from(self.quota_left),
            quota_max: self.quota_max,
            quota_period: self.quota_period.clone(),
            display: self.display,
        }
    }

    /// Validate metering configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quota_max == 0 {
            return Err(ValidationError::InvalidQuotaMax);
        }
        if self.quota_left > self.quota_max {
            return Err(ValidationError::QuotaLeftExceedsMax);
        }
        if self.quota_period.is_empty() {
            return Err(ValidationError::MissingRequired("QUOTA_PERIOD"));
        }
        Ok(())
    }
}

fn default_quota_left() -> u32 {
    3
}

fn default_quota_max() -> u32 {
    10
}

fn default_quota_period() -> String {
    "month".to_string()
}

fn default_display() -> bool {
    true
}

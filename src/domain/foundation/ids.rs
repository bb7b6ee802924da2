//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Identity of a host page the runtime is installed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(Uuid);

impl HostId {
    /// Creates a new random HostId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Correlation key tying an opened activity to its result handler.
///
/// Flow kinds use fixed, well-known values so that a result arriving after a
/// page reload still finds the handler the fresh engine registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Account linking popup.
    pub const LINK: &'static str = "swg-link";
    /// Historical alias for the account linking completion.
    pub const LINK_CONTINUE: &'static str = "swg-link-continue";
    /// Purchase popup.
    pub const PAY: &'static str = "swg-pay";
    /// Prefix for per-open offers requests.
    pub const OFFERS_PREFIX: &'static str = "swg-offers";

    /// Creates a request id, rejecting empty values.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("request_id"));
        }
        Ok(Self(value))
    }

    /// Creates a request id from a compile-time constant.
    pub fn well_known(value: &'static str) -> Self {
        Self(value.to_string())
    }

    /// Creates a fresh, never-reused offers request id.
    pub fn unique_offers() -> Self {
        Self(format!("{}:{}", Self::OFFERS_PREFIX, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

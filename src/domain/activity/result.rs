//! Results reported back by activities.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::RuntimeError;

/// Outcome category reported by the activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityResultCode {
    Ok,
    Cancelled,
    Failed,
}

/// Raw result envelope delivered by the activity transport.
///
/// Nothing in `data` may be trusted until [`ActivityResult::verify`] has
/// checked where the result came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResult {
    pub code: ActivityResultCode,
    /// Payload for `Ok`, optional context for the other codes.
    #[serde(default)]
    pub data: Option<Value>,
    /// Error description for `Failed`.
    #[serde(default)]
    pub error: Option<String>,
    pub origin: String,
    /// Whether the transport verified the origin over a secure channel.
    pub trusted: bool,
}

impl ActivityResult {
    pub fn ok(data: Value, origin: impl Into<String>, trusted: bool) -> Self {
        Self {
            code: ActivityResultCode::Ok,
            data: Some(data),
            error: None,
            origin: origin.into(),
            trusted,
        }
    }

    pub fn cancelled(origin: impl Into<String>, trusted: bool) -> Self {
        Self {
            code: ActivityResultCode::Cancelled,
            data: None,
            error: None,
            origin: origin.into(),
            trusted,
        }
    }

    pub fn failed(error: impl Into<String>, origin: impl Into<String>, trusted: bool) -> Self {
        Self {
            code: ActivityResultCode::Failed,
            data: None,
            error: Some(error.into()),
            origin: origin.into(),
            trusted,
        }
    }

    /// Attaches context data, e.g. to a cancelled result.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Checks trust and origin, turning the envelope into an outcome.
    ///
    /// An untrusted or foreign result becomes `Failed` regardless of its
    /// reported code.
    pub fn verify(self, expected_origin: &str) -> VerifiedOutcome {
        if !self.trusted || !same_origin(&self.origin, expected_origin) {
            return VerifiedOutcome::Failed {
                error: RuntimeError::untrusted(self.origin, expected_origin),
                data: None,
            };
        }
        match self.code {
            ActivityResultCode::Ok => VerifiedOutcome::Ok(self.data.unwrap_or(Value::Null)),
            ActivityResultCode::Cancelled => VerifiedOutcome::Cancelled { data: self.data },
            ActivityResultCode::Failed => VerifiedOutcome::Failed {
                error: RuntimeError::activity_failed(
                    self.error.unwrap_or_else(|| "activity reported failure".to_string()),
                ),
                data: self.data,
            },
        }
    }
}

fn same_origin(actual: &str, expected: &str) -> bool {
    actual.trim_end_matches('/') == expected.trim_end_matches('/')
}

/// A result whose origin has been checked.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifiedOutcome {
    Ok(Value),
    Cancelled { data: Option<Value> },
    Failed { error: RuntimeError, data: Option<Value> },
}

impl VerifiedOutcome {
    /// Context data carried by a cancelled or failed outcome.
    pub fn context(&self) -> Option<&Value> {
        match self {
            VerifiedOutcome::Ok(_) => None,
            VerifiedOutcome::Cancelled { data } | VerifiedOutcome::Failed { data, .. } => {
                data.as_ref()
            }
        }
    }
}

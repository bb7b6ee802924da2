//! Error types for the runtime.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Programming errors
    AlreadyConfigured,
    DuplicateRequestId,
    NoResultHandler,
    InvalidStateTransition,
    ValidationFailed,

    // Resolution errors
    ConfigResolutionFailed,
    FetchFailed,
    InvalidResponse,

    // Activity outcomes
    UntrustedResult,
    ActivityFailed,
    TransportError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::AlreadyConfigured => "ALREADY_CONFIGURED",
            ErrorCode::DuplicateRequestId => "DUPLICATE_REQUEST_ID",
            ErrorCode::NoResultHandler => "NO_RESULT_HANDLER",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::ConfigResolutionFailed => "CONFIG_RESOLUTION_FAILED",
            ErrorCode::FetchFailed => "FETCH_FAILED",
            ErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ErrorCode::UntrustedResult => "UNTRUSTED_RESULT",
            ErrorCode::ActivityFailed => "ACTIVITY_FAILED",
            ErrorCode::TransportError => "TRANSPORT_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Runtime error surfaced through futures and callback slots.
///
/// `Clone` because a single outcome is fanned out to every caller sharing
/// an in-flight future or waiting on the same correlated activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// `init` was called after configuration had been committed.
    #[error("already configured")]
    AlreadyConfigured,

    /// A second result handler was registered for a request id.
    #[error("duplicate result handler for request id '{0}'")]
    DuplicateRequestId(String),

    /// An activity was opened without a handler to receive its result.
    #[error("no result handler registered for request id '{0}'")]
    NoResultHandler(String),

    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Page configuration could not be resolved.
    #[error("page configuration failed: {0}")]
    ConfigResolution(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// An activity result failed origin or trust verification.
    #[error("untrusted activity result from '{origin}' (expected '{expected}')")]
    UntrustedResult { origin: String, expected: String },

    #[error("activity failed: {0}")]
    ActivityFailed(String),

    #[error("activity transport error: {0}")]
    Transport(String),
}

impl RuntimeError {
    pub fn config_resolution(reason: impl Into<String>) -> Self {
        RuntimeError::ConfigResolution(reason.into())
    }

    pub fn fetch(reason: impl Into<String>) -> Self {
        RuntimeError::Fetch(reason.into())
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        RuntimeError::InvalidResponse(reason.into())
    }

    pub fn activity_failed(reason: impl Into<String>) -> Self {
        RuntimeError::ActivityFailed(reason.into())
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        RuntimeError::Transport(reason.into())
    }

    pub fn untrusted(origin: impl Into<String>, expected: impl Into<String>) -> Self {
        RuntimeError::UntrustedResult {
            origin: origin.into(),
            expected: expected.into(),
        }
    }

    /// Returns the error category code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RuntimeError::AlreadyConfigured => ErrorCode::AlreadyConfigured,
            RuntimeError::DuplicateRequestId(_) => ErrorCode::DuplicateRequestId,
            RuntimeError::NoResultHandler(_) => ErrorCode::NoResultHandler,
            RuntimeError::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            RuntimeError::Validation(_) => ErrorCode::ValidationFailed,
            RuntimeError::ConfigResolution(_) => ErrorCode::ConfigResolutionFailed,
            RuntimeError::Fetch(_) => ErrorCode::FetchFailed,
            RuntimeError::InvalidResponse(_) => ErrorCode::InvalidResponse,
            RuntimeError::UntrustedResult { .. } => ErrorCode::UntrustedResult,
            RuntimeError::ActivityFailed(_) => ErrorCode::ActivityFailed,
            RuntimeError::Transport(_) => ErrorCode::TransportError,
        }
    }

    /// Returns true for errors that indicate a wiring bug rather than a
    /// runtime condition.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            RuntimeError::AlreadyConfigured
                | RuntimeError::DuplicateRequestId(_)
                | RuntimeError::NoResultHandler(_)
                | RuntimeError::InvalidStateTransition { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("sku");
        assert_eq!(format!("{}", err), "Field 'sku' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("publication_id", "contains '/'");
        assert_eq!(
            format!("{}", err),
            "Field 'publication_id' has invalid format: contains '/'"
        );
    }

    #[test]
    fn already_configured_message_is_stable() {
        assert!(RuntimeError::AlreadyConfigured
            .to_string()
            .contains("already configured"));
    }

    #[test]
    fn duplicate_request_id_mentions_duplicate_and_id() {
        let msg = RuntimeError::DuplicateRequestId("swg-pay".into()).to_string();
        assert!(msg.contains("duplicate"));
        assert!(msg.contains("swg-pay"));
    }

    #[test]
    fn validation_errors_convert_transparently() {
        let err: RuntimeError = ValidationError::empty_field("sku").into();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(err.to_string(), "Field 'sku' cannot be empty");
    }

    #[test]
    fn programming_errors_are_classified() {
        assert!(RuntimeError::AlreadyConfigured.is_programming_error());
        assert!(RuntimeError::DuplicateRequestId("x".into()).is_programming_error());
        assert!(!RuntimeError::fetch("timeout").is_programming_error());
        assert!(!RuntimeError::untrusted("https://evil.test", "https://ok.test").is_programming_error());
    }

    #[test]
    fn error_code_display_formats_correctly() {
        assert_eq!(format!("{}", ErrorCode::DuplicateRequestId), "DUPLICATE_REQUEST_ID");
        assert_eq!(format!("{}", ErrorCode::UntrustedResult), "UNTRUSTED_RESULT");
    }
}

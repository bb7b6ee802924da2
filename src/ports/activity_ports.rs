//! ActivityPorts port - the cross-window transport for activities.
//!
//! The transport opens popups or frames and later hands each result to the
//! handler registered under the request id the activity was opened with.
//! Results may arrive on a later turn, or after the host page reloaded and
//! a fresh runtime registered its handlers again.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::activity::{ActivityRequest, ActivityResult};
use crate::domain::flow::FlowStatus;
use crate::domain::foundation::RuntimeError;

/// A delivered result waiting to be accepted.
#[async_trait]
pub trait ActivityPort: Send {
    /// Consumes the port and yields the result envelope.
    async fn accept_result(self: Box<Self>) -> Result<ActivityResult, RuntimeError>;
}

/// Interprets the results delivered for one request id.
///
/// # Example
///
/// ```ignore
/// struct PayComplete { /* ... */ }
///
/// #[async_trait]
/// impl ActivityResultHandler for PayComplete {
///     async fn handle(&self, port: Box<dyn ActivityPort>) -> Result<FlowStatus, RuntimeError> {
///         let result = port.accept_result().await?;
///         // verify origin, branch on result.code ...
///         Ok(FlowStatus::Succeeded)
///     }
///
///     fn name(&self) -> &'static str {
///         "PayComplete"
///     }
/// }
/// ```
#[async_trait]
pub trait ActivityResultHandler: Send + Sync {
    /// Interprets one result, returning the terminal flow status.
    async fn handle(&self, port: Box<dyn ActivityPort>) -> Result<FlowStatus, RuntimeError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for the activity transport.
pub trait ActivityPorts: Send + Sync {
    /// Opens the activity. Returns as soon as the request was handed off.
    fn open(&self, request: ActivityRequest) -> Result<(), RuntimeError>;

    /// Routes future results for `request_id` to `handler`.
    fn on_result(&self, request_id: &str, handler: Arc<dyn ActivityResultHandler>);
}

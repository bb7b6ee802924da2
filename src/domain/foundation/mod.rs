//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, error types and the state machine trait that
//! form the vocabulary of the subscriptions runtime.

mod errors;
mod ids;
mod state_machine;

pub use errors::{ErrorCode, RuntimeError, ValidationError};
pub use ids::{HostId, RequestId};
pub use state_machine::StateMachine;

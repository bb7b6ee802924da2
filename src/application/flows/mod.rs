//! Multi-step flows.
//!
//! Each flow has a start phase that opens an activity and a complete phase,
//! registered with the activity registry, that interprets the correlated
//! result. Start phases are owned values used once; complete phases are
//! long-lived handlers that run a fresh `FlowStatus` machine per result.

mod link_accounts;
mod offers;
mod pay;

pub use link_accounts::{LinkCompleteFlow, LinkbackFlow};
pub use offers::{OffersCompleteFlow, OffersFlow};
pub use pay::{PayCompleteFlow, PayStartFlow};

use std::sync::{Arc, Weak};

use crate::application::configured_runtime::ConfiguredRuntime;
use crate::domain::flow::FlowStatus;
use crate::domain::foundation::{RuntimeError, StateMachine};

/// Handlers hold the engine weakly; the transport keeps them alive.
fn upgrade(runtime: &Weak<ConfiguredRuntime>) -> Result<Arc<ConfiguredRuntime>, RuntimeError> {
    runtime
        .upgrade()
        .ok_or_else(|| RuntimeError::transport("result delivered after the runtime was dropped"))
}

/// Status of a complete phase that has just accepted a result.
fn started() -> Result<FlowStatus, RuntimeError> {
    FlowStatus::Idle.transition_to(FlowStatus::Started)
}

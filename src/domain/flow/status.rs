//! Flow lifecycle state machine.
//!
//! Every flow runs `Idle -> Started -> {Succeeded, Cancelled, Failed}` once
//! and is discarded after reaching a terminal state.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    /// Constructed, nothing opened yet.
    Idle,

    /// Activity opened or result being interpreted.
    Started,

    Succeeded,

    /// User dismissed the activity.
    Cancelled,

    /// Activity failed or its result could not be trusted.
    Failed,
}

impl StateMachine for FlowStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use FlowStatus::*;
        matches!(
            (self, target),
            (Idle, Started) | (Started, Succeeded) | (Started, Cancelled) | (Started, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FlowStatus::*;
        match self {
            Idle => vec![Started],
            Started => vec![Succeeded, Cancelled, Failed],
            Succeeded | Cancelled | Failed => vec![],
        }
    }
}

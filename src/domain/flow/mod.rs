//! Flow domain - lifecycle status and completion values of multi-step flows.

mod responses;
mod status;

pub use responses::{LoginRequest, PurchaseData, SubscribeResponse};
pub use status::FlowStatus;

//! Domain layer containing the runtime's value types and state machines.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, errors, state machine trait)
//! - `entitlements` - Page configuration and entitlement snapshots
//! - `activity` - Activity requests and the results they report
//! - `flow` - Flow lifecycle status and completion values
//! - `metering` - Experimental free-read quota

pub mod activity;
pub mod entitlements;
pub mod flow;
pub mod foundation;
pub mod metering;

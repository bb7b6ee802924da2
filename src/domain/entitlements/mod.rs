//! Entitlements domain - page configuration and entitlement snapshots.

mod page_config;
mod snapshot;

pub use page_config::PageConfig;
pub use snapshot::{Entitlement, Entitlements};

//! Subscriptions Runtime - entitlement checks and purchase flows for
//! embedding pages.
//!
//! The runtime buffers commands from the host page until it is installed,
//! resolves the page configuration once, checks the user's entitlements, and
//! drives account linking, offers and purchase flows whose activities run
//! outside the page and report back asynchronously.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

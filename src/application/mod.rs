//! Application layer - the runtime, its registries, and the flows.
//!
//! Bottom-up: the command queue buffers host commands; the callback and
//! activity registries route outcomes; the entitlements manager caches
//! fetches; flows open activities and interpret their results; the
//! configured runtime wires these together for one page; the facade and the
//! host page handle give the embedding page a single entry point.

pub mod callbacks;
pub mod command_queue;
pub mod configured_runtime;
pub mod correlation;
pub mod entitlements_manager;
pub mod flows;
pub mod host;
pub mod metering;
pub mod runtime;

pub use callbacks::{CallbackKind, Callbacks};
pub use command_queue::{Command, CommandQueue};
pub use configured_runtime::ConfiguredRuntime;
pub use correlation::{ActivityRegistry, FlowCompletion, FlowResult};
pub use entitlements_manager::{EntitlementsFuture, EntitlementsManager};
pub use flows::{
    LinkCompleteFlow, LinkbackFlow, OffersCompleteFlow, OffersFlow, PayCompleteFlow, PayStartFlow,
};
pub use host::{install_runtime, HostPage};
pub use metering::{MeteringTracker, ARTICLES_READ_KEY};
pub use runtime::{Runtime, RuntimeDeps};

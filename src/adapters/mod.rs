//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the runtime to its host environment:
//! - `activity` - Activity transport (in-memory)
//! - `fetcher` - Entitlements fetching (HTTP, mock)
//! - `page_config` - Page configuration resolution (static)
//! - `metering` - Session storage for read articles (in-memory)

pub mod activity;
pub mod fetcher;
pub mod metering;
pub mod page_config;

pub use activity::InMemoryActivityPorts;
pub use fetcher::{HttpFetcher, MockFetcher};
pub use metering::InMemoryReadArticlesStore;
pub use page_config::StaticPageConfigResolver;

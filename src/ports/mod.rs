//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the runtime core and the host environment. Adapters implement these ports.
//!
//! - `Fetcher` - Credentialed JSON fetches for entitlements
//! - `PageConfigResolver` - Page metadata lookup when `init` was not called
//! - `ActivityPorts` / `ActivityPort` / `ActivityResultHandler` - Cross-window
//!   activity transport and correlated result delivery
//! - `ReadArticlesStore` - Session storage for metering

mod activity_ports;
mod fetcher;
mod page_config_resolver;
mod read_articles_store;

pub use activity_ports::{ActivityPort, ActivityPorts, ActivityResultHandler};
pub use fetcher::Fetcher;
pub use page_config_resolver::PageConfigResolver;
pub use read_articles_store::ReadArticlesStore;

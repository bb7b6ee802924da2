//! Fetcher adapters.
//!
//! - `HttpFetcher` - credentialed JSON GET over `reqwest`
//! - `MockFetcher` - canned responses and call tracking for tests

mod http;
mod mock;

pub use http::HttpFetcher;
pub use mock::MockFetcher;

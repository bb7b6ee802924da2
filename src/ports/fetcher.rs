//! Fetcher port - credentialed JSON requests to the entitlements service.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::RuntimeError;

/// Port for network fetches.
///
/// Called exactly once per uncached entitlements request. Retry policy, if
/// any, belongs to the implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` with the user's credentials and parse the body as JSON.
    async fn fetch_credentialed_json(&self, url: &str) -> Result<Value, RuntimeError>;
}

//! PageConfigResolver port - reads page configuration from page metadata.

use async_trait::async_trait;

use crate::domain::entitlements::PageConfig;
use crate::domain::foundation::RuntimeError;

/// Port for discovering the page configuration.
///
/// Consulted only when the host page did not call `init` explicitly, and at
/// most once per runtime.
#[async_trait]
pub trait PageConfigResolver: Send + Sync {
    async fn resolve_config(&self) -> Result<PageConfig, RuntimeError>;
}

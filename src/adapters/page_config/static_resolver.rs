//! Page configuration resolver with a fixed answer.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::entitlements::PageConfig;
use crate::domain::foundation::RuntimeError;
use crate::ports::PageConfigResolver;

/// Resolves to a fixed configuration, or fails, and counts calls.
///
/// Stands in for page metadata parsing when the host already knows its
/// publication.
pub struct StaticPageConfigResolver {
    outcome: Result<PageConfig, RuntimeError>,
    calls: AtomicUsize,
}

impl StaticPageConfigResolver {
    pub fn new(page_config: PageConfig) -> Self {
        Self {
            outcome: Ok(page_config),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: RuntimeError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageConfigResolver for StaticPageConfigResolver {
    async fn resolve_config(&self) -> Result<PageConfig, RuntimeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(ok = self.outcome.is_ok(), "resolving page configuration");
        self.outcome.clone()
    }
}

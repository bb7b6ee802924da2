//! Entitlements cache with single-flight fetching.
//!
//! The first `get_entitlements` call starts a fetch and caches the shared
//! future; every later call gets a clone of it until the cache is dropped.
//! Failures are cached too. The core never retries on its own.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::config::RuntimeSettings;
use crate::domain::entitlements::{Entitlements, PageConfig};
use crate::domain::foundation::RuntimeError;
use crate::ports::Fetcher;

/// Shared handle on an in-flight or completed entitlements fetch.
pub type EntitlementsFuture = Shared<BoxFuture<'static, Result<Entitlements, RuntimeError>>>;

#[derive(Default)]
struct CacheState {
    cached: Option<EntitlementsFuture>,
    block_next_notification: bool,
}

/// Caches the entitlements of one page.
pub struct EntitlementsManager {
    fetcher: Arc<dyn Fetcher>,
    url: String,
    service_id: String,
    product_id: Option<String>,
    state: Mutex<CacheState>,
}

impl EntitlementsManager {
    pub fn new(page_config: &PageConfig, settings: &RuntimeSettings, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            url: settings.entitlements_url(page_config.publication_id()),
            service_id: settings.service_id.clone(),
            product_id: page_config.product_id().map(str::to_string),
            state: Mutex::new(CacheState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached fetch, starting one if nothing is cached.
    pub fn get_entitlements(&self) -> EntitlementsFuture {
        let mut state = self.lock();
        if let Some(cached) = &state.cached {
            return cached.clone();
        }

        tracing::debug!(url = %self.url, "fetching entitlements");
        let fetch = self.fetch().boxed().shared();
        state.cached = Some(fetch.clone());
        fetch
    }

    fn fetch(&self) -> impl std::future::Future<Output = Result<Entitlements, RuntimeError>> + Send + 'static {
        let fetcher = Arc::clone(&self.fetcher);
        let url = self.url.clone();
        let service_id = self.service_id.clone();
        let product_id = self.product_id.clone();
        async move {
            let json = fetcher.fetch_credentialed_json(&url).await.map_err(|e| {
                tracing::warn!(%url, error = %e, "entitlements fetch failed");
                e
            })?;
            let entitlements = Entitlements::from_json(service_id, &json, product_id)?;
            tracing::info!(
                count = entitlements.entitlements.len(),
                enables_this = entitlements.enables_this(),
                "entitlements received"
            );
            Ok(entitlements)
        }
    }

    /// Drops the cache and suppresses the next automatic notification.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.cached = None;
        state.block_next_notification = true;
        tracing::debug!("entitlements cache reset");
    }

    /// Drops the cache without touching the suppression flag.
    pub fn refresh(&self) {
        self.lock().cached = None;
        tracing::debug!("entitlements cache refreshed");
    }

    /// Consumes the suppression flag, returning whether it was armed.
    pub fn take_notification_block(&self) -> bool {
        std::mem::take(&mut self.lock().block_next_notification)
    }

    pub fn is_cached(&self) -> bool {
        self.lock().cached.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockFetcher;
    use serde_json::json;

    fn manager(fetcher: Arc<MockFetcher>) -> EntitlementsManager {
        let page = PageConfig::new("pub1:label1", true).unwrap();
        EntitlementsManager::new(&page, &RuntimeSettings::default(), fetcher)
    }

    fn body() -> serde_json::Value {
        json!({"entitlements": [{
            "source": "pub1",
            "products": ["pub1:label1"],
            "subscriptionToken": "token1"
        }]})
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let fetcher = Arc::new(MockFetcher::with_response(body()));
        let manager = manager(fetcher.clone());

        let (a, b) = tokio::join!(manager.get_entitlements(), manager.get_entitlements());
        assert_eq!(a, b);
        assert!(a.unwrap().enables_this());
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(
            fetcher.calls(),
            vec!["https://subscribe.example.com/swg/_/api/v1/publication/pub1/entitlements".to_string()]
        );
    }

    #[tokio::test]
    async fn failures_stay_cached_until_reset() {
        let fetcher = Arc::new(MockFetcher::with_error(RuntimeError::fetch("offline")));
        let manager = manager(fetcher.clone());

        assert_eq!(manager.get_entitlements().await, Err(RuntimeError::fetch("offline")));
        assert_eq!(manager.get_entitlements().await, Err(RuntimeError::fetch("offline")));
        assert_eq!(fetcher.call_count(), 1);

        fetcher.respond_with(body());
        manager.reset();
        assert!(manager.get_entitlements().await.is_ok());
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn reset_arms_suppression_once() {
        let manager = manager(Arc::new(MockFetcher::with_response(body())));
        assert!(!manager.take_notification_block());

        manager.reset();
        assert!(!manager.is_cached());
        assert!(manager.take_notification_block());
        assert!(!manager.take_notification_block());
    }

    #[tokio::test]
    async fn refresh_refetches_without_suppression() {
        let fetcher = Arc::new(MockFetcher::with_response(body()));
        let manager = manager(fetcher.clone());
        manager.get_entitlements().await.unwrap();

        manager.refresh();
        manager.get_entitlements().await.unwrap();
        assert_eq!(fetcher.call_count(), 2);
        assert!(!manager.take_notification_block());
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let manager = manager(Arc::new(MockFetcher::with_response(json!({"entitlements": 7}))));
        let err = manager.get_entitlements().await.unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidResponse(_)));
    }
}

//! Configured runtime - the engine behind the facade once the page is known.

use std::sync::{Arc, Mutex, PoisonError};

use crate::application::callbacks::Callbacks;
use crate::application::correlation::{ActivityRegistry, FlowCompletion};
use crate::application::entitlements_manager::EntitlementsManager;
use crate::application::flows::{
    LinkCompleteFlow, LinkbackFlow, OffersFlow, PayCompleteFlow, PayStartFlow,
};
use crate::config::RuntimeSettings;
use crate::domain::entitlements::{Entitlements, PageConfig};
use crate::domain::foundation::{RequestId, RuntimeError};
use crate::ports::{ActivityPorts, Fetcher};

/// Runtime bound to one page configuration.
///
/// Owns the entitlements cache and the activity registry, shares the
/// callback registry with the facade, and starts flows on demand.
pub struct ConfiguredRuntime {
    page_config: PageConfig,
    settings: RuntimeSettings,
    callbacks: Arc<Callbacks>,
    entitlements: EntitlementsManager,
    activities: ActivityRegistry,
    pending_sku: Mutex<Option<String>>,
}

impl ConfiguredRuntime {
    /// Builds the runtime and registers the long-lived result handlers.
    ///
    /// # Errors
    ///
    /// `DuplicateRequestId` if the transport's ids collide, which only
    /// happens when two runtimes share one registry.
    pub fn new(
        page_config: PageConfig,
        settings: RuntimeSettings,
        fetcher: Arc<dyn Fetcher>,
        ports: Arc<dyn ActivityPorts>,
        callbacks: Arc<Callbacks>,
    ) -> Result<Arc<Self>, RuntimeError> {
        let runtime = Arc::new(Self {
            entitlements: EntitlementsManager::new(&page_config, &settings, fetcher),
            activities: ActivityRegistry::new(ports, settings.service_origin.clone()),
            page_config,
            settings,
            callbacks,
            pending_sku: Mutex::new(None),
        });

        let link_complete = Arc::new(LinkCompleteFlow::new(Arc::downgrade(&runtime)));
        runtime
            .activities
            .on_result(RequestId::well_known(RequestId::LINK), link_complete.clone())?;
        runtime
            .activities
            .on_result(RequestId::well_known(RequestId::LINK_CONTINUE), link_complete)?;
        runtime.activities.on_result(
            RequestId::well_known(RequestId::PAY),
            Arc::new(PayCompleteFlow::new(Arc::downgrade(&runtime))),
        )?;

        tracing::info!(
            publication_id = runtime.page_config.publication_id(),
            product_id = ?runtime.page_config.product_id(),
            locked = runtime.page_config.is_locked(),
            "runtime configured"
        );
        Ok(runtime)
    }

    pub fn page_config(&self) -> &PageConfig {
        &self.page_config
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn service_origin(&self) -> &str {
        &self.settings.service_origin
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub fn entitlements(&self) -> &EntitlementsManager {
        &self.entitlements
    }

    pub fn activities(&self) -> &ActivityRegistry {
        &self.activities
    }

    /// SKU of the purchase started last, if any.
    pub fn pending_sku(&self) -> Option<String> {
        self.pending_sku
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_pending_sku(&self, sku: String) {
        *self.pending_sku.lock().unwrap_or_else(PoisonError::into_inner) = Some(sku);
    }

    /// Checks entitlements for a locked page and notifies the host.
    ///
    /// No-op for unlocked pages and pages without a product. The outcome,
    /// success or failure, is reported through the entitlements callback;
    /// a notification is skipped once after a reset.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        if !self.page_config.is_locked() || self.page_config.product_id().is_none() {
            tracing::debug!(
                locked = self.page_config.is_locked(),
                "page not gated, skipping entitlements"
            );
            return Ok(());
        }

        let result = self.entitlements.get_entitlements().await;
        if self.entitlements.take_notification_block() {
            tracing::debug!("entitlements notification suppressed");
            return Ok(());
        }
        self.callbacks.trigger_entitlements_response(result);
        Ok(())
    }

    pub fn reset(&self) {
        self.entitlements.reset();
    }

    pub async fn get_entitlements(&self) -> Result<Entitlements, RuntimeError> {
        self.entitlements.get_entitlements().await
    }

    pub fn show_offers(self: &Arc<Self>) -> Result<FlowCompletion, RuntimeError> {
        OffersFlow::new(Arc::clone(self)).start()
    }

    pub fn subscribe(self: &Arc<Self>, sku: &str) -> Result<FlowCompletion, RuntimeError> {
        PayStartFlow::new(Arc::clone(self), sku)?.start()
    }

    pub fn link_account(self: &Arc<Self>) -> Result<FlowCompletion, RuntimeError> {
        LinkbackFlow::new(Arc::clone(self)).start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryActivityPorts, MockFetcher};
    use crate::domain::activity::{ActivityKind, ActivityResult};
    use crate::domain::flow::{FlowStatus, LoginRequest, SubscribeResponse};
    use serde_json::{json, Value};

    const ORIGIN: &str = "https://subscribe.example.com";

    struct Harness {
        runtime: Arc<ConfiguredRuntime>,
        fetcher: Arc<MockFetcher>,
        ports: Arc<InMemoryActivityPorts>,
        entitlements_seen: Arc<Mutex<Vec<Result<Entitlements, RuntimeError>>>>,
        subscribes_seen: Arc<Mutex<Vec<Result<SubscribeResponse, RuntimeError>>>>,
        logins_seen: Arc<Mutex<Vec<LoginRequest>>>,
        links_seen: Arc<Mutex<Vec<Result<(), RuntimeError>>>>,
    }

    fn entitlements_body() -> Value {
        json!({"entitlements": [{
            "source": "pub1",
            "products": ["pub1:label1"],
            "subscriptionToken": "token1"
        }]})
    }

    fn harness(page: PageConfig) -> Harness {
        let fetcher = Arc::new(MockFetcher::with_response(entitlements_body()));
        let ports = Arc::new(InMemoryActivityPorts::new());
        let callbacks = Arc::new(Callbacks::new());

        let entitlements_seen = Arc::new(Mutex::new(Vec::new()));
        let subscribes_seen = Arc::new(Mutex::new(Vec::new()));
        let logins_seen = Arc::new(Mutex::new(Vec::new()));
        let links_seen = Arc::new(Mutex::new(Vec::new()));
        let seen = entitlements_seen.clone();
        callbacks.set_on_entitlements_response(move |r| seen.lock().unwrap().push(r));
        let seen = subscribes_seen.clone();
        callbacks.set_on_subscribe_response(move |r| seen.lock().unwrap().push(r));
        let seen = logins_seen.clone();
        callbacks.set_on_login_request(move |r| seen.lock().unwrap().push(r));
        let seen = links_seen.clone();
        callbacks.set_on_link_complete(move |r| seen.lock().unwrap().push(r));

        let runtime = ConfiguredRuntime::new(
            page,
            RuntimeSettings::default(),
            fetcher.clone(),
            ports.clone(),
            callbacks,
        )
        .unwrap();

        Harness {
            runtime,
            fetcher,
            ports,
            entitlements_seen,
            subscribes_seen,
            logins_seen,
            links_seen,
        }
    }

    fn locked_page() -> PageConfig {
        PageConfig::new("pub1:label1", true).unwrap()
    }

    // ═══════════════════════════════════════════════════════════════════
    // start
    // ═══════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn start_is_noop_for_unlocked_page() {
        let h = harness(PageConfig::new("pub1:label1", false).unwrap());
        h.runtime.start().await.unwrap();
        assert_eq!(h.fetcher.call_count(), 0);
        assert!(h.entitlements_seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_is_noop_without_product() {
        let h = harness(PageConfig::new("pub2", true).unwrap());
        h.runtime.start().await.unwrap();
        assert_eq!(h.fetcher.call_count(), 0);
        assert!(h.entitlements_seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_notifies_with_entitlements() {
        let h = harness(locked_page());
        h.runtime.start().await.unwrap();

        assert_eq!(h.fetcher.call_count(), 1);
        let seen = h.entitlements_seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].as_ref().unwrap().enables_this());
    }

    #[tokio::test]
    async fn start_notifies_with_fetch_failure() {
        let h = harness(locked_page());
        h.fetcher.fail_with(RuntimeError::fetch("offline"));
        h.runtime.start().await.unwrap();

        assert_eq!(
            *h.entitlements_seen.lock().unwrap(),
            vec![Err(RuntimeError::fetch("offline"))]
        );
    }

    #[tokio::test]
    async fn reset_suppresses_one_notification() {
        let h = harness(locked_page());
        h.runtime.reset();

        h.runtime.start().await.unwrap();
        assert!(h.entitlements_seen.lock().unwrap().is_empty());

        h.runtime.start().await.unwrap();
        assert_eq!(h.entitlements_seen.lock().unwrap().len(), 1);
        // Second start reused the cached fetch.
        assert_eq!(h.fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn reset_forces_new_fetch() {
        let h = harness(locked_page());
        h.runtime.get_entitlements().await.unwrap();
        h.runtime.reset();
        h.runtime.get_entitlements().await.unwrap();
        assert_eq!(h.fetcher.call_count(), 2);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Flows
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn handlers_are_registered_up_front() {
        let h = harness(locked_page());
        for id in ["swg-link", "swg-link-continue", "swg-pay"] {
            assert!(h.runtime.activities().is_registered(id));
            assert!(h.ports.has_handler(id));
        }
    }

    #[tokio::test]
    async fn subscribe_success_notifies_with_sku() {
        let h = harness(locked_page());
        let completion = h.runtime.subscribe("sku1").unwrap();

        let opened = h.ports.opened();
        assert_eq!(opened[0].kind, ActivityKind::Purchase);
        assert_eq!(opened[0].params["sku"], "sku1");

        h.ports
            .deliver(
                "swg-pay",
                ActivityResult::ok(json!({"purchaseData": {"orderId": "o1"}}), ORIGIN, true),
            )
            .await
            .unwrap();
        assert_eq!(completion.await, Ok(FlowStatus::Succeeded));

        let seen = h.subscribes_seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].as_ref().unwrap().sku.as_deref(), Some("sku1"));
        assert!(h.runtime.entitlements().take_notification_block());
    }

    #[tokio::test]
    async fn subscribe_cancel_resolves_silently() {
        let h = harness(locked_page());
        let completion = h.runtime.subscribe("sku1").unwrap();
        h.ports
            .deliver("swg-pay", ActivityResult::cancelled(ORIGIN, true))
            .await
            .unwrap();

        assert_eq!(completion.await, Ok(FlowStatus::Cancelled));
        assert!(h.subscribes_seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscribe_failure_surfaces_error() {
        let h = harness(locked_page());
        let completion = h.runtime.subscribe("sku1").unwrap();
        h.ports
            .deliver("swg-pay", ActivityResult::failed("declined", ORIGIN, true))
            .await
            .unwrap_err();

        assert_eq!(completion.await, Err(RuntimeError::activity_failed("declined")));
        assert!(h.subscribes_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn subscribe_rejects_blank_sku() {
        let h = harness(locked_page());
        assert!(matches!(
            h.runtime.subscribe("  "),
            Err(RuntimeError::Validation(_))
        ));
        assert!(h.ports.opened().is_empty());
    }

    #[tokio::test]
    async fn link_success_refreshes_entitlements_once() {
        let h = harness(locked_page());
        h.runtime.get_entitlements().await.unwrap();

        let completion = h.runtime.link_account().unwrap();
        h.ports
            .deliver("swg-link", ActivityResult::ok(json!({}), ORIGIN, true))
            .await
            .unwrap();

        assert_eq!(completion.await, Ok(FlowStatus::Succeeded));
        assert_eq!(h.fetcher.call_count(), 2);
        assert_eq!(*h.links_seen.lock().unwrap(), vec![Ok(())]);
        assert_eq!(h.entitlements_seen.lock().unwrap().len(), 1);
        assert!(!h.runtime.entitlements().take_notification_block());
    }

    #[tokio::test]
    async fn link_cancel_with_login_request() {
        let h = harness(locked_page());
        let completion = h.runtime.link_account().unwrap();
        h.ports
            .deliver(
                "swg-link",
                ActivityResult::cancelled(ORIGIN, true).with_data(json!({"loginRequested": true})),
            )
            .await
            .unwrap();

        assert_eq!(completion.await, Ok(FlowStatus::Cancelled));
        assert_eq!(
            *h.logins_seen.lock().unwrap(),
            vec![LoginRequest { link_requested: false }]
        );
        assert_eq!(h.fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn untrusted_link_result_is_failure() {
        let h = harness(locked_page());
        let completion = h.runtime.link_account().unwrap();
        h.ports
            .deliver("swg-link", ActivityResult::ok(json!({}), ORIGIN, false))
            .await
            .unwrap();

        assert_eq!(completion.await, Ok(FlowStatus::Failed));
        assert_eq!(h.fetcher.call_count(), 0);
        let links = h.links_seen.lock().unwrap();
        assert!(matches!(links[0], Err(RuntimeError::UntrustedResult { .. })));
    }

    #[tokio::test]
    async fn offers_selection_starts_purchase() {
        let h = harness(locked_page());
        let completion = h.runtime.show_offers().unwrap();
        let offers_id = h.ports.opened()[0].request_id.clone();
        assert!(offers_id.as_str().starts_with("swg-offers:"));

        h.ports
            .deliver(offers_id.as_str(), ActivityResult::ok(json!({"sku": "sku2"}), ORIGIN, true))
            .await
            .unwrap();
        assert_eq!(completion.await, Ok(FlowStatus::Succeeded));

        let opened = h.ports.opened();
        assert_eq!(opened.len(), 2);
        assert_eq!(opened[1].kind, ActivityKind::Purchase);
        assert_eq!(h.runtime.pending_sku().as_deref(), Some("sku2"));
    }

    #[tokio::test]
    async fn offers_can_be_shown_repeatedly() {
        let h = harness(locked_page());
        h.runtime.show_offers().unwrap();
        h.runtime.show_offers().unwrap();
        let opened = h.ports.opened();
        assert_ne!(opened[0].request_id, opened[1].request_id);
    }
}

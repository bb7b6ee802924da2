//! Activity correlation registry.
//!
//! Maps each request id to exactly one result handler for the lifetime of
//! the engine and opens activities through the transport. Callers that open
//! an activity get a [`FlowCompletion`] that resolves with whatever the
//! handler concluded for the next result delivered under that id.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::domain::activity::{ActivityKind, ActivityRequest};
use crate::domain::flow::FlowStatus;
use crate::domain::foundation::{RequestId, RuntimeError};
use crate::ports::{ActivityPort, ActivityPorts, ActivityResultHandler};

/// Outcome of a completed flow.
pub type FlowResult = Result<FlowStatus, RuntimeError>;

type Waiters = Arc<Mutex<HashMap<RequestId, Vec<oneshot::Sender<FlowResult>>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolves when the activity opened for a flow has been interpreted.
///
/// Dropping it is fine; the flow still completes and notifies callbacks.
/// Resolves to `Succeeded` or `Cancelled`, or to the error the flow chose to
/// surface. Never resolves if the activity never reports back.
pub struct FlowCompletion {
    receiver: oneshot::Receiver<FlowResult>,
}

impl Future for FlowCompletion {
    type Output = FlowResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(RuntimeError::transport("activity registry dropped before completion"))
            })
        })
    }
}

/// Registry of request id to result handler.
pub struct ActivityRegistry {
    ports: Arc<dyn ActivityPorts>,
    service_origin: String,
    registered: Mutex<HashSet<RequestId>>,
    waiters: Waiters,
}

impl ActivityRegistry {
    pub fn new(ports: Arc<dyn ActivityPorts>, service_origin: impl Into<String>) -> Self {
        Self {
            ports,
            service_origin: service_origin.into(),
            registered: Mutex::new(HashSet::new()),
            waiters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers the handler for every result delivered under `request_id`.
    ///
    /// # Errors
    ///
    /// `DuplicateRequestId` when the id already has a handler. Ids are chosen
    /// statically per flow kind, so this is a wiring bug.
    pub fn on_result(
        &self,
        request_id: RequestId,
        handler: Arc<dyn ActivityResultHandler>,
    ) -> Result<(), RuntimeError> {
        if !lock(&self.registered).insert(request_id.clone()) {
            tracing::error!(%request_id, handler = handler.name(), "duplicate result handler");
            return Err(RuntimeError::DuplicateRequestId(request_id.to_string()));
        }

        tracing::debug!(%request_id, handler = handler.name(), "result handler registered");
        let correlated = Arc::new(CorrelatedHandler {
            request_id: request_id.clone(),
            inner: handler,
            waiters: Arc::clone(&self.waiters),
        });
        self.ports.on_result(request_id.as_str(), correlated);
        Ok(())
    }

    pub fn is_registered(&self, request_id: &str) -> bool {
        lock(&self.registered)
            .iter()
            .any(|id| id.as_str() == request_id)
    }

    /// Opens an activity whose result goes to an already registered handler.
    ///
    /// # Errors
    ///
    /// `NoResultHandler` when nothing is registered for `request_id`, or the
    /// transport's error if it could not open the activity.
    pub fn open(
        &self,
        request_id: RequestId,
        kind: ActivityKind,
        params: Value,
    ) -> Result<FlowCompletion, RuntimeError> {
        if !lock(&self.registered).contains(&request_id) {
            return Err(RuntimeError::NoResultHandler(request_id.to_string()));
        }

        let (sender, receiver) = oneshot::channel();
        lock(&self.waiters)
            .entry(request_id.clone())
            .or_default()
            .push(sender);

        let request = ActivityRequest::new(request_id.clone(), kind, &self.service_origin, params);
        tracing::info!(%request_id, ?kind, url = %request.url, "opening activity");
        if let Err(e) = self.ports.open(request) {
            // Nothing will ever answer this waiter.
            if let Some(pending) = lock(&self.waiters).get_mut(&request_id) {
                pending.pop();
            }
            tracing::warn!(%request_id, error = %e, "failed to open activity");
            return Err(e);
        }

        Ok(FlowCompletion { receiver })
    }

    /// Registers `handler` under a fresh id and opens the activity.
    pub fn open_with_handler(
        &self,
        request_id: RequestId,
        kind: ActivityKind,
        params: Value,
        handler: Arc<dyn ActivityResultHandler>,
    ) -> Result<FlowCompletion, RuntimeError> {
        self.on_result(request_id.clone(), handler)?;
        self.open(request_id, kind, params)
    }
}

/// Wraps a flow handler so its conclusion reaches every waiting opener.
struct CorrelatedHandler {
    request_id: RequestId,
    inner: Arc<dyn ActivityResultHandler>,
    waiters: Waiters,
}

#[async_trait]
impl ActivityResultHandler for CorrelatedHandler {
    async fn handle(&self, port: Box<dyn ActivityPort>) -> FlowResult {
        tracing::debug!(request_id = %self.request_id, handler = self.inner.name(), "activity result delivered");
        // Only openers waiting when this result arrived are answered by it;
        // flows opened while the handler runs wait for their own result.
        let pending = lock(&self.waiters)
            .remove(&self.request_id)
            .unwrap_or_default();
        let result = self.inner.handle(port).await;

        match &result {
            Ok(status) => tracing::info!(request_id = %self.request_id, ?status, "flow completed"),
            Err(e) => tracing::warn!(request_id = %self.request_id, error = %e, "flow failed"),
        }

        for waiter in pending {
            // The opener may have dropped its completion.
            let _ = waiter.send(result.clone());
        }

        result
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryActivityPorts;
    use crate::domain::activity::ActivityResult;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ORIGIN: &str = "https://subscribe.example.com";

    struct CountingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ActivityResultHandler for CountingHandler {
        async fn handle(&self, port: Box<dyn ActivityPort>) -> FlowResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = port.accept_result().await?;
            match result.verify(ORIGIN) {
                crate::domain::activity::VerifiedOutcome::Ok(_) => Ok(FlowStatus::Succeeded),
                crate::domain::activity::VerifiedOutcome::Cancelled { .. } => Ok(FlowStatus::Cancelled),
                crate::domain::activity::VerifiedOutcome::Failed { error, .. } => Err(error),
            }
        }

        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    fn setup() -> (Arc<InMemoryActivityPorts>, ActivityRegistry, Arc<CountingHandler>) {
        let ports = Arc::new(InMemoryActivityPorts::new());
        let registry = ActivityRegistry::new(ports.clone(), ORIGIN);
        let handler = Arc::new(CountingHandler {
            calls: AtomicUsize::new(0),
        });
        (ports, registry, handler)
    }

    #[test]
    fn duplicate_registration_fails() {
        let (_, registry, handler) = setup();
        let id = RequestId::well_known(RequestId::PAY);
        registry.on_result(id.clone(), handler.clone()).unwrap();

        let err = registry.on_result(id, handler).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert!(err.is_programming_error());
    }

    #[test]
    fn open_requires_registered_handler() {
        let (ports, registry, _) = setup();
        let err = registry
            .open(RequestId::well_known(RequestId::PAY), ActivityKind::Purchase, json!({}))
            .err()
            .unwrap();
        assert_eq!(err, RuntimeError::NoResultHandler("swg-pay".into()));
        assert!(ports.opened().is_empty());
    }

    #[tokio::test]
    async fn completion_resolves_with_handler_outcome() {
        let (ports, registry, handler) = setup();
        let id = RequestId::well_known(RequestId::PAY);
        registry.on_result(id.clone(), handler.clone()).unwrap();

        let completion = registry
            .open(id, ActivityKind::Purchase, json!({"sku": "sku1"}))
            .unwrap();
        assert_eq!(ports.opened().len(), 1);
        assert_eq!(ports.opened()[0].params, json!({"sku": "sku1"}));

        let delivered = ports
            .deliver("swg-pay", ActivityResult::ok(json!({}), ORIGIN, true))
            .await;
        assert_eq!(delivered, Ok(FlowStatus::Succeeded));
        assert_eq!(completion.await, Ok(FlowStatus::Succeeded));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn untrusted_result_surfaces_as_error() {
        let (ports, registry, handler) = setup();
        let id = RequestId::well_known(RequestId::LINK);
        registry.on_result(id.clone(), handler).unwrap();
        let completion = registry.open(id, ActivityKind::LinkAccounts, json!({})).unwrap();

        ports
            .deliver("swg-link", ActivityResult::ok(json!({}), "https://evil.example", true))
            .await
            .unwrap_err();
        assert!(matches!(
            completion.await,
            Err(RuntimeError::UntrustedResult { .. })
        ));
    }

    #[tokio::test]
    async fn handler_outlives_first_result() {
        let (ports, registry, handler) = setup();
        let id = RequestId::well_known(RequestId::PAY);
        registry.on_result(id.clone(), handler.clone()).unwrap();

        for _ in 0..2 {
            let completion = registry.open(id.clone(), ActivityKind::Purchase, json!({})).unwrap();
            ports
                .deliver("swg-pay", ActivityResult::cancelled(ORIGIN, true))
                .await
                .unwrap();
            assert_eq!(completion.await, Ok(FlowStatus::Cancelled));
        }
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn result_without_opener_is_still_handled() {
        let (ports, registry, handler) = setup();
        registry
            .on_result(RequestId::well_known(RequestId::LINK_CONTINUE), handler.clone())
            .unwrap();

        let outcome = ports
            .deliver("swg-link-continue", ActivityResult::ok(json!({}), ORIGIN, true))
            .await;
        assert_eq!(outcome, Ok(FlowStatus::Succeeded));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn open_with_handler_registers_then_opens() {
        let (ports, registry, handler) = setup();
        let id = RequestId::unique_offers();
        let _completion = registry
            .open_with_handler(id.clone(), ActivityKind::Offers, json!({}), handler)
            .unwrap();
        assert!(registry.is_registered(id.as_str()));
        assert!(ports.has_handler(id.as_str()));
        assert_eq!(ports.opened()[0].request_id, id);
    }

    #[test]
    fn transport_failure_is_reported() {
        let (ports, registry, handler) = setup();
        let id = RequestId::well_known(RequestId::PAY);
        registry.on_result(id.clone(), handler).unwrap();
        ports.fail_next_open("popup blocked");

        let err = registry.open(id, ActivityKind::Purchase, json!({})).err().unwrap();
        assert_eq!(err, RuntimeError::transport("popup blocked"));
    }
}

//! Offers flow.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{started, upgrade, PayStartFlow};
use crate::application::configured_runtime::ConfiguredRuntime;
use crate::application::correlation::FlowCompletion;
use crate::domain::activity::{ActivityKind, VerifiedOutcome};
use crate::domain::flow::{FlowStatus, LoginRequest};
use crate::domain::foundation::{RequestId, RuntimeError, StateMachine};
use crate::ports::{ActivityPort, ActivityResultHandler};

/// Shows the offers frame.
///
/// Every instance opens under its own request id, so offers can be shown
/// any number of times per runtime.
pub struct OffersFlow {
    runtime: Arc<ConfiguredRuntime>,
    status: FlowStatus,
}

impl OffersFlow {
    pub fn new(runtime: Arc<ConfiguredRuntime>) -> Self {
        Self {
            runtime,
            status: FlowStatus::Idle,
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn start(&mut self) -> Result<FlowCompletion, RuntimeError> {
        self.status = self.status.transition_to(FlowStatus::Started)?;
        let request_id = RequestId::unique_offers();
        let page = self.runtime.page_config();
        tracing::info!(%request_id, "showing offers");
        self.runtime.activities().open_with_handler(
            request_id,
            ActivityKind::Offers,
            json!({
                "publicationId": page.publication_id(),
                "productId": page.product_id(),
                "label": page.label(),
            }),
            Arc::new(OffersCompleteFlow::new(Arc::downgrade(&self.runtime))),
        )
    }
}

/// Interprets the offer the user picked.
pub struct OffersCompleteFlow {
    runtime: Weak<ConfiguredRuntime>,
}

impl OffersCompleteFlow {
    pub fn new(runtime: Weak<ConfiguredRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl ActivityResultHandler for OffersCompleteFlow {
    async fn handle(&self, port: Box<dyn ActivityPort>) -> Result<FlowStatus, RuntimeError> {
        let runtime = upgrade(&self.runtime)?;
        let status = started()?;
        let result = port.accept_result().await?;

        match result.verify(runtime.service_origin()) {
            VerifiedOutcome::Ok(payload) => {
                if let Some(sku) = payload.get("sku").and_then(Value::as_str) {
                    // The purchase reports through its own completion and
                    // the subscribe callback.
                    PayStartFlow::new(Arc::clone(&runtime), sku)?.start()?;
                } else if let Some(login) = LoginRequest::from_context(&payload) {
                    runtime.callbacks().trigger_login_request(login);
                } else {
                    return Err(RuntimeError::invalid_response(
                        "offers result names neither a sku nor a login request",
                    ));
                }
                status.transition_to(FlowStatus::Succeeded)
            }
            VerifiedOutcome::Cancelled { data } => {
                if let Some(login) = data.as_ref().and_then(LoginRequest::from_context) {
                    runtime.callbacks().trigger_login_request(login);
                }
                status.transition_to(FlowStatus::Cancelled)
            }
            VerifiedOutcome::Failed { error, .. } => Err(error),
        }
    }

    fn name(&self) -> &'static str {
        "OffersCompleteFlow"
    }
}

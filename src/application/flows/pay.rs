//! Purchase flow.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::json;

use super::{started, upgrade};
use crate::application::configured_runtime::ConfiguredRuntime;
use crate::application::correlation::FlowCompletion;
use crate::domain::activity::{ActivityKind, VerifiedOutcome};
use crate::domain::flow::{FlowStatus, SubscribeResponse};
use crate::domain::foundation::{RequestId, RuntimeError, StateMachine, ValidationError};
use crate::ports::{ActivityPort, ActivityResultHandler};

/// Opens the purchase popup for one SKU.
pub struct PayStartFlow {
    runtime: Arc<ConfiguredRuntime>,
    sku: String,
    status: FlowStatus,
}

impl PayStartFlow {
    /// # Errors
    ///
    /// `ValidationError::EmptyField` for a blank SKU.
    pub fn new(runtime: Arc<ConfiguredRuntime>, sku: &str) -> Result<Self, ValidationError> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Err(ValidationError::empty_field("sku"));
        }
        Ok(Self {
            runtime,
            sku: sku.to_string(),
            status: FlowStatus::Idle,
        })
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    /// Opens the activity. The completion resolves once [`PayCompleteFlow`]
    /// has interpreted the result; a failed purchase resolves with its error.
    pub fn start(&mut self) -> Result<FlowCompletion, RuntimeError> {
        self.status = self.status.transition_to(FlowStatus::Started)?;
        tracing::info!(sku = %self.sku, "starting purchase");
        self.runtime.set_pending_sku(self.sku.clone());
        self.runtime.activities().open(
            RequestId::well_known(RequestId::PAY),
            ActivityKind::Purchase,
            json!({
                "sku": self.sku,
                "publicationId": self.runtime.page_config().publication_id(),
            }),
        )
    }
}

/// Interprets purchase results.
pub struct PayCompleteFlow {
    runtime: Weak<ConfiguredRuntime>,
}

impl PayCompleteFlow {
    pub fn new(runtime: Weak<ConfiguredRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl ActivityResultHandler for PayCompleteFlow {
    async fn handle(&self, port: Box<dyn ActivityPort>) -> Result<FlowStatus, RuntimeError> {
        let runtime = upgrade(&self.runtime)?;
        let status = started()?;
        let result = port.accept_result().await?;

        match result.verify(runtime.service_origin()) {
            VerifiedOutcome::Ok(payload) => {
                let response = match SubscribeResponse::from_payload(&payload, runtime.pending_sku()) {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(error = %e, "unreadable purchase response");
                        runtime.callbacks().trigger_subscribe_response(Err(e.clone()));
                        return Err(e);
                    }
                };
                tracing::info!(sku = ?response.sku, "purchase completed");
                // The host learns about the new grant from this callback;
                // the next automatic notification would repeat it.
                runtime.entitlements().reset();
                runtime.callbacks().trigger_subscribe_response(Ok(response));
                status.transition_to(FlowStatus::Succeeded)
            }
            VerifiedOutcome::Cancelled { .. } => {
                tracing::info!("purchase cancelled");
                status.transition_to(FlowStatus::Cancelled)
            }
            VerifiedOutcome::Failed { error, .. } => {
                tracing::warn!(error = %error, "purchase failed");
                Err(error)
            }
        }
    }

    fn name(&self) -> &'static str {
        "PayCompleteFlow"
    }
}

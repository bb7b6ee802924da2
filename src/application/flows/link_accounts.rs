//! Account linking.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::json;

use super::{started, upgrade};
use crate::application::configured_runtime::ConfiguredRuntime;
use crate::application::correlation::FlowCompletion;
use crate::domain::activity::{ActivityKind, VerifiedOutcome};
use crate::domain::flow::{FlowStatus, LoginRequest};
use crate::domain::foundation::{RequestId, RuntimeError, StateMachine};
use crate::ports::{ActivityPort, ActivityResultHandler};

/// Opens the account linking popup.
pub struct LinkbackFlow {
    runtime: Arc<ConfiguredRuntime>,
    status: FlowStatus,
}

impl LinkbackFlow {
    pub fn new(runtime: Arc<ConfiguredRuntime>) -> Self {
        Self {
            runtime,
            status: FlowStatus::Idle,
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    /// Opens the activity. The result is handled by [`LinkCompleteFlow`].
    pub fn start(&mut self) -> Result<FlowCompletion, RuntimeError> {
        self.status = self.status.transition_to(FlowStatus::Started)?;
        tracing::info!(publication_id = self.runtime.page_config().publication_id(), "starting linkback");
        self.runtime.activities().open(
            RequestId::well_known(RequestId::LINK),
            ActivityKind::LinkAccounts,
            json!({ "publicationId": self.runtime.page_config().publication_id() }),
        )
    }
}

/// Interprets results of account linking.
///
/// Registered under both `swg-link` and `swg-link-continue`.
pub struct LinkCompleteFlow {
    runtime: Weak<ConfiguredRuntime>,
}

impl LinkCompleteFlow {
    pub fn new(runtime: Weak<ConfiguredRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl ActivityResultHandler for LinkCompleteFlow {
    async fn handle(&self, port: Box<dyn ActivityPort>) -> Result<FlowStatus, RuntimeError> {
        let runtime = upgrade(&self.runtime)?;
        let status = started()?;
        let result = port.accept_result().await?;
        let callbacks = runtime.callbacks();

        match result.verify(runtime.service_origin()) {
            VerifiedOutcome::Ok(_) => {
                callbacks.trigger_link_complete(Ok(()));
                // Newly linked grants must be visible, so the refresh does
                // not arm suppression.
                runtime.entitlements().refresh();
                let entitlements = runtime.entitlements().get_entitlements().await;
                callbacks.trigger_entitlements_response(entitlements);
                status.transition_to(FlowStatus::Succeeded)
            }
            outcome => {
                if let Some(login) = outcome.context().and_then(LoginRequest::from_context) {
                    callbacks.trigger_login_request(login);
                } else if let VerifiedOutcome::Failed { error, .. } = &outcome {
                    tracing::warn!(error = %error, "account linking failed");
                    callbacks.trigger_link_complete(Err(error.clone()));
                }
                match outcome {
                    VerifiedOutcome::Cancelled { .. } => status.transition_to(FlowStatus::Cancelled),
                    _ => status.transition_to(FlowStatus::Failed),
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "LinkCompleteFlow"
    }
}

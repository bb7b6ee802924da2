//! In-memory activity transport.
//!
//! Nothing is actually opened: requests are recorded and results are
//! delivered by calling [`InMemoryActivityPorts::deliver`], which runs the
//! registered handler to completion. Deterministic, for tests and for hosts
//! that drive activities themselves.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::activity::{ActivityRequest, ActivityResult};
use crate::domain::flow::FlowStatus;
use crate::domain::foundation::RuntimeError;
use crate::ports::{ActivityPort, ActivityPorts, ActivityResultHandler};

/// In-memory activity transport.
///
/// # Example
///
/// ```ignore
/// let ports = Arc::new(InMemoryActivityPorts::new());
/// let completion = runtime.subscribe("sku1").await?;
///
/// assert_eq!(ports.opened()[0].params["sku"], "sku1");
/// ports.deliver("swg-pay", ActivityResult::cancelled(origin, true)).await?;
/// ```
pub struct InMemoryActivityPorts {
    handlers: RwLock<HashMap<String, Arc<dyn ActivityResultHandler>>>,
    opened: RwLock<Vec<ActivityRequest>>,
    next_open_error: Mutex<Option<String>>,
}

impl InMemoryActivityPorts {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            opened: RwLock::new(Vec::new()),
            next_open_error: Mutex::new(None),
        }
    }

    // === Test Helpers ===

    /// Requests opened so far, oldest first.
    pub fn opened(&self) -> Vec<ActivityRequest> {
        self.opened
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_handler(&self, request_id: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(request_id)
    }

    /// Makes the next `open` fail with a transport error.
    pub fn fail_next_open(&self, reason: impl Into<String>) {
        *self
            .next_open_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reason.into());
    }

    /// Delivers a result to the handler registered for `request_id` and
    /// returns what the handler concluded.
    ///
    /// # Errors
    ///
    /// `NoResultHandler` when nothing is registered, otherwise the
    /// handler's own error.
    pub async fn deliver(
        &self,
        request_id: &str,
        result: ActivityResult,
    ) -> Result<FlowStatus, RuntimeError> {
        // Clone the handler to release the lock before awaiting
        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(request_id)
            .cloned()
            .ok_or_else(|| RuntimeError::NoResultHandler(request_id.to_string()))?;

        tracing::debug!(request_id, code = ?result.code, "delivering activity result");
        handler.handle(Box::new(InMemoryActivityPort { result })).await
    }
}

impl Default for InMemoryActivityPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityPorts for InMemoryActivityPorts {
    fn open(&self, request: ActivityRequest) -> Result<(), RuntimeError> {
        if let Some(reason) = self
            .next_open_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(RuntimeError::transport(reason));
        }
        self.opened
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Ok(())
    }

    fn on_result(&self, request_id: &str, handler: Arc<dyn ActivityResultHandler>) {
        // A reloaded page registers again; the latest registration wins.
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request_id.to_string(), handler);
    }
}

/// Port carrying an already available result.
struct InMemoryActivityPort {
    result: ActivityResult,
}

#[async_trait]
impl ActivityPort for InMemoryActivityPort {
    async fn accept_result(self: Box<Self>) -> Result<ActivityResult, RuntimeError> {
        Ok(self.result)
    }
}

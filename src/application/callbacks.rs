//! Callback registry - the host page's only channel for asynchronous outcomes.
//!
//! One slot per event kind, each holding at most one handler. Setting a slot
//! replaces its handler; triggering an empty slot does nothing.

use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::entitlements::Entitlements;
use crate::domain::flow::{LoginRequest, SubscribeResponse};
use crate::domain::foundation::RuntimeError;

/// Event kinds the host page can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    EntitlementsResponse,
    SubscribeResponse,
    LoginRequest,
    LinkComplete,
}

type Handler<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Slot<T> {
    handler: Mutex<Option<Handler<T>>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            handler: Mutex::new(None),
        }
    }

    fn set(&self, handler: Handler<T>) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn is_set(&self) -> bool {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn trigger(&self, kind: CallbackKind, value: T) -> bool {
        // Clone the handler so it runs without the lock held; it may
        // replace itself.
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => {
                tracing::debug!(?kind, "triggering callback");
                handler(value);
                true
            }
            None => {
                tracing::trace!(?kind, "no callback set");
                false
            }
        }
    }
}

/// Per-kind callback slots.
pub struct Callbacks {
    entitlements_response: Slot<Result<Entitlements, RuntimeError>>,
    subscribe_response: Slot<Result<SubscribeResponse, RuntimeError>>,
    login_request: Slot<LoginRequest>,
    link_complete: Slot<Result<(), RuntimeError>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self {
            entitlements_response: Slot::new(),
            subscribe_response: Slot::new(),
            login_request: Slot::new(),
            link_complete: Slot::new(),
        }
    }

    pub fn has(&self, kind: CallbackKind) -> bool {
        match kind {
            CallbackKind::EntitlementsResponse => self.entitlements_response.is_set(),
            CallbackKind::SubscribeResponse => self.subscribe_response.is_set(),
            CallbackKind::LoginRequest => self.login_request.is_set(),
            CallbackKind::LinkComplete => self.link_complete.is_set(),
        }
    }

    pub fn set_on_entitlements_response<F>(&self, callback: F)
    where
        F: Fn(Result<Entitlements, RuntimeError>) + Send + Sync + 'static,
    {
        self.entitlements_response.set(Arc::new(callback));
    }

    /// Returns whether a handler was invoked.
    pub fn trigger_entitlements_response(&self, result: Result<Entitlements, RuntimeError>) -> bool {
        self.entitlements_response
            .trigger(CallbackKind::EntitlementsResponse, result)
    }

    pub fn set_on_subscribe_response<F>(&self, callback: F)
    where
        F: Fn(Result<SubscribeResponse, RuntimeError>) + Send + Sync + 'static,
    {
        self.subscribe_response.set(Arc::new(callback));
    }

    pub fn trigger_subscribe_response(&self, result: Result<SubscribeResponse, RuntimeError>) -> bool {
        self.subscribe_response
            .trigger(CallbackKind::SubscribeResponse, result)
    }

    pub fn set_on_login_request<F>(&self, callback: F)
    where
        F: Fn(LoginRequest) + Send + Sync + 'static,
    {
        self.login_request.set(Arc::new(callback));
    }

    pub fn trigger_login_request(&self, request: LoginRequest) -> bool {
        self.login_request.trigger(CallbackKind::LoginRequest, request)
    }

    pub fn set_on_link_complete<F>(&self, callback: F)
    where
        F: Fn(Result<(), RuntimeError>) + Send + Sync + 'static,
    {
        self.link_complete.set(Arc::new(callback));
    }

    pub fn trigger_link_complete(&self, result: Result<(), RuntimeError>) -> bool {
        self.link_complete.trigger(CallbackKind::LinkComplete, result)
    }
}

impl Default for Callbacks {
    fn default() -> Self {
        Self::new()
    }
}

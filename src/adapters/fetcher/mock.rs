//! Mock fetcher for testing.
//!
//! Supports:
//! - A configurable response or error, switchable between calls
//! - Call tracking

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::RuntimeError;
use crate::ports::Fetcher;

/// Mock fetcher returning a canned outcome for every URL.
///
/// # Example
///
/// ```ignore
/// let fetcher = Arc::new(MockFetcher::with_response(json!({"entitlements": []})));
/// // ... run the runtime ...
/// assert_eq!(fetcher.call_count(), 1);
///
/// fetcher.fail_with(RuntimeError::fetch("offline"));
/// ```
#[derive(Default)]
pub struct MockFetcher {
    inner: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    /// Outcome of every call; `None` fails the call.
    outcome: Option<Result<Value, RuntimeError>>,

    /// URLs requested, in call order.
    calls: Vec<String>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(body: Value) -> Self {
        let mock = Self::new();
        mock.respond_with(body);
        mock
    }

    pub fn with_error(error: RuntimeError) -> Self {
        let mock = Self::new();
        mock.fail_with(error);
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    pub fn respond_with(&self, body: Value) {
        self.lock().outcome = Some(Ok(body));
    }

    pub fn fail_with(&self, error: RuntimeError) {
        self.lock().outcome = Some(Err(error));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertion Helpers
    // ════════════════════════════════════════════════════════════════════════════

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_credentialed_json(&self, url: &str) -> Result<Value, RuntimeError> {
        let mut state = self.lock();
        state.calls.push(url.to_string());
        state
            .outcome
            .clone()
            .unwrap_or_else(|| Err(RuntimeError::fetch("no response configured")))
    }
}

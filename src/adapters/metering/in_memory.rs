//! In-memory session storage.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::foundation::RuntimeError;
use crate::ports::ReadArticlesStore;

/// Session storage that lives as long as the value.
#[derive(Default)]
pub struct InMemoryReadArticlesStore {
    items: Mutex<HashMap<String, String>>,
}

impl InMemoryReadArticlesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadArticlesStore for InMemoryReadArticlesStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, RuntimeError> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), RuntimeError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

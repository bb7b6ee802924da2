//! ReadArticlesStore port - session-scoped storage for metering.

use crate::domain::foundation::RuntimeError;

/// Key/value storage scoped to the user's browsing session.
///
/// Values are stored as strings; the metering tracker serializes the list
/// of read article links as a JSON array.
pub trait ReadArticlesStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, RuntimeError>;

    fn set_item(&self, key: &str, value: String) -> Result<(), RuntimeError>;
}

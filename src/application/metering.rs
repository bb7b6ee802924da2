//! Experimental metering tracker.

use std::sync::Arc;

use crate::config::MeteringConfig;
use crate::domain::foundation::RuntimeError;
use crate::domain::metering::{MeteringQuota, MeteringResponse};
use crate::ports::ReadArticlesStore;

/// Storage key of the JSON array of article links read this session.
pub const ARTICLES_READ_KEY: &str = "articlesRead";

/// Counts free reads per session.
pub struct MeteringTracker {
    defaults: MeteringResponse,
    store: Arc<dyn ReadArticlesStore>,
}

impl MeteringTracker {
    pub fn new(config: &MeteringConfig, store: Arc<dyn ReadArticlesStore>) -> Self {
        Self {
            defaults: config.default_response(),
            store,
        }
    }

    /// Records a read of `article_link` and returns the remaining quota.
    ///
    /// Values in `quota` override the configured defaults.
    pub fn update_metering_response(
        &self,
        article_link: &str,
        quota: &MeteringQuota,
    ) -> Result<MeteringResponse, RuntimeError> {
        let response = self.defaults.merged_with(quota);
        let mut articles_read = self.articles_read()?;
        let updated = response.record_read(article_link, &mut articles_read);

        let encoded = serde_json::to_string(&articles_read)
            .map_err(|e| RuntimeError::invalid_response(format!("articles read: {}", e)))?;
        self.store.set_item(ARTICLES_READ_KEY, encoded)?;

        tracing::debug!(
            article_link,
            quota_left = updated.quota_left,
            reads = articles_read.len(),
            "metering updated"
        );
        Ok(updated)
    }

    fn articles_read(&self) -> Result<Vec<String>, RuntimeError> {
        match self.store.get_item(ARTICLES_READ_KEY)? {
            Some(stored) if !stored.is_empty() => match serde_json::from_str(&stored) {
                Ok(list) => Ok(list),
                Err(e) => {
                    // Unreadable session data starts the count over.
                    tracing::warn!(error = %e, "discarding unreadable articles read list");
                    Ok(Vec::new())
                }
            },
            _ => Ok(Vec::new()),
        }
    }
}

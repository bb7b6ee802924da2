//! Metering domain - free-read quotas for non-subscribers.
//!
//! Experimental: the quota is tracked per browsing session from the list of
//! article links the user has already opened.

use serde::{Deserialize, Serialize};

/// Quota values supplied by the server; any field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeteringQuota {
    pub quota_left: Option<u32>,
    pub quota_max: Option<u32>,
    pub quota_period: Option<String>,
    pub display: Option<bool>,
}

/// Quota state handed back to the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeteringResponse {
    pub quota_left: i64,
    pub quota_max: u32,
    pub quota_period: String,
    pub display: bool,
}

impl MeteringResponse {
    /// Applies the supplied quota over these defaults.
    pub fn merged_with(&self, quota: &MeteringQuota) -> Self {
        Self {
            quota_left: quota.quota_left.map(i64::from).unwrap_or(self.quota_left),
            quota_max: quota.quota_max.unwrap_or(self.quota_max),
            quota_period: quota
                .quota_period
                .clone()
                .unwrap_or_else(|| self.quota_period.clone()),
            display: quota.display.unwrap_or(self.display),
        }
    }

    /// Records a read of `article_link` and recomputes the remaining quota.
    ///
    /// Re-reading an article already in `articles_read` does not consume
    /// quota. Returns the updated response; `articles_read` is updated in
    /// place.
    pub fn record_read(&self, article_link: &str, articles_read: &mut Vec<String>) -> Self {
        let mut reads_left = i64::from(self.quota_max) - articles_read.len() as i64;
        if !articles_read.iter().any(|link| link == article_link) {
            reads_left -= 1;
            articles_read.push(article_link.to_string());
        }
        Self {
            quota_left: reads_left + 1,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> MeteringResponse {
        MeteringResponse {
            quota_left: 3,
            quota_max: 10,
            quota_period: "month".into(),
            display: true,
        }
    }

    #[test]
    fn merge_keeps_defaults_for_missing_fields() {
        let merged = defaults().merged_with(&MeteringQuota {
            quota_max: Some(5),
            ..Default::default()
        });
        assert_eq!(merged.quota_max, 5);
        assert_eq!(merged.quota_period, "month");
        assert!(merged.display);
    }

    #[test]
    fn first_read_consumes_quota() {
        let mut reads = Vec::new();
        let response = defaults().record_read("https://news.example/a", &mut reads);
        assert_eq!(response.quota_left, 10);
        assert_eq!(reads, vec!["https://news.example/a".to_string()]);
    }

    #[test]
    fn rereading_does_not_consume_quota() {
        let mut reads = vec!["a".to_string(), "b".to_string()];
        let response = defaults().record_read("a", &mut reads);
        assert_eq!(response.quota_left, 9);
        assert_eq!(reads.len(), 2);
    }
}

//! HTTP fetcher backed by `reqwest`.
//!
//! Requests carry the user's cookies (the client keeps a cookie store) and
//! ask for JSON. Non-success statuses are fetch failures; there is no retry.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::domain::foundation::RuntimeError;
use crate::ports::Fetcher;

pub struct HttpFetcher {
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a cookie-keeping client.
    ///
    /// # Errors
    ///
    /// `Transport` if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, RuntimeError> {
        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| RuntimeError::transport(format!("http client: {}", e)))?;
        Ok(Self { http_client })
    }

    /// Uses a preconfigured client, e.g. one sharing a cookie jar with the
    /// host.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_credentialed_json(&self, url: &str) -> Result<Value, RuntimeError> {
        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RuntimeError::fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(%url, %status, error = %error_text, "credentialed fetch failed");
            return Err(RuntimeError::fetch(format!("HTTP {}", status.as_u16())));
        }

        response
            .json()
            .await
            .map_err(|e| RuntimeError::invalid_response(format!("{}: {}", url, e)))
    }
}

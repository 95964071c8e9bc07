//! Trove v2 search API client.

use async_trait::async_trait;
use std::time::Duration;

use super::{ApiError, SearchApi};
use crate::config::Config;
use crate::models::{SearchRequest, SearchResponse};
use crate::utils::{with_retry, HttpClient, RetryConfig, TransientError};

/// Default endpoint for result searches
pub const DEFAULT_BASE_URL: &str = "https://api.trove.nla.gov.au/v2/result";

/// Client for the Trove result endpoint.
///
/// Credential and endpoint are fixed at construction; the client keeps no
/// state between calls apart from the pooled connections.
#[derive(Debug, Clone)]
pub struct TroveClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl TroveClient {
    /// Create a client for `base_url`
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            base_url: base_url.into(),
            api_key,
            retry: RetryConfig::default(),
        })
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Ok(Self::new(
            config.api.base_url.clone(),
            config.api.key.clone(),
            Duration::from_secs(config.api.timeout_secs),
        )?
        .with_retry(config.retry.to_retry_config()))
    }

    /// Replace the retry configuration
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Endpoint this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query_params(&self, request: &SearchRequest) -> Vec<(String, String)> {
        let mut params = request.params();
        if let Some(ref key) = self.api_key {
            params.push(("key".to_string(), key.clone()));
        }
        params
    }

    async fn send_once(&self, params: &[(String, String)]) -> Result<SearchResponse, ApiError> {
        let response = self
            .http
            .client()
            .get(&self.base_url)
            .query(params)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to query Trove: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            if TransientError::from_status(status.as_u16()).is_some() {
                return Err(ApiError::Transient {
                    status: status.as_u16(),
                });
            }
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response: {}", e)))?;

        serde_json::from_str(&text)
            .map_err(|e| ApiError::Parse(format!("Failed to parse JSON: {}", e)))
    }
}

#[async_trait]
impl SearchApi for TroveClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        let params = self.query_params(request);
        tracing::trace!(url = %self.base_url, params = params.len(), "GET");
        with_retry(self.retry, || self.send_once(&params)).await
    }
}

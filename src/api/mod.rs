//! The search API seam.
//!
//! The narrowing loops only ever talk to a [`SearchApi`]. [`TroveClient`] is
//! the real implementation over HTTP; [`MockApi`] replays scripted responses
//! and records every request, which is how the loops are tested.

mod mock;
mod trove;

pub use mock::MockApi;
pub use trove::{TroveClient, DEFAULT_BASE_URL};

use crate::models::{SearchRequest, SearchResponse};
use async_trait::async_trait;

/// A service answering search requests.
///
/// Implementations own any transport-level retry; callers see either a parsed
/// response or a hard failure.
#[async_trait]
pub trait SearchApi: Send + Sync + std::fmt::Debug {
    /// Issue a single search request
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError>;
}

#[async_trait]
impl<T: SearchApi + ?Sized> SearchApi for std::sync::Arc<T> {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        (**self).search(request).await
    }
}

/// Errors that can occur when talking to the search API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Gateway error (502/503/504) that survived the retry budget
    #[error("Service temporarily unavailable (HTTP {status})")]
    Transient { status: u16 },

    /// Any other non-success status
    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(format!("JSON: {}", err))
    }
}

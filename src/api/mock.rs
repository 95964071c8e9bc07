//! Mock search API for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ApiError, SearchApi};
use crate::models::{SearchRequest, SearchResponse};

/// A mock API that replays queued responses in order and records every request.
///
/// Once the queue is empty the fallback response is returned, if one is set;
/// otherwise the call fails.
#[derive(Debug, Default)]
pub struct MockApi {
    queue: Mutex<VecDeque<Result<SearchResponse, ApiError>>>,
    fallback: Mutex<Option<SearchResponse>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl MockApi {
    /// Create a new mock API.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers with the given responses in order.
    pub fn with_responses(responses: impl IntoIterator<Item = SearchResponse>) -> Self {
        let mock = Self::new();
        for response in responses {
            mock.push_response(response);
        }
        mock
    }

    /// Queue a response.
    pub fn push_response(&self, response: SearchResponse) {
        self.queue.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error.
    pub fn push_error(&self, error: ApiError) {
        self.queue.lock().unwrap().push_back(Err(error));
    }

    /// Set the response returned once the queue runs dry.
    pub fn set_fallback(&self, response: SearchResponse) {
        *self.fallback.lock().unwrap() = Some(response);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchApi for MockApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());

        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => self.fallback.lock().unwrap().clone().ok_or_else(|| {
                ApiError::Status {
                    status: 500,
                    body: "mock API has no scripted response".to_string(),
                }
            }),
        }
    }
}

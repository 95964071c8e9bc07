//! Utility modules supporting the sampler.
//!
//! - [`HttpClient`]: shared HTTP client with pooling and timeouts
//! - [`RetryConfig`]: configuration for retry logic with exponential backoff
//! - [`with_retry`]: execute an operation, retrying 502/503/504 responses
//! - [`record_rows`] and friends: pull displayable fields out of raw records
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use trove_random::api::ApiError;
//! use trove_random::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_data() -> Result<String, ApiError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), ApiError> {
//! let config = RetryConfig::default().max_retries(3);
//! let result = with_retry(config, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod display;
mod http;
mod retry;

pub use display::{
    record_date, record_id, record_rows, record_source, record_title, record_url,
    truncate_with_ellipsis,
};
pub use http::{HttpClient, USER_AGENT};
pub use retry::{with_retry, RetryConfig, TransientError};

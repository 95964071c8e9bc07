//! Retry utilities with exponential backoff for gateway errors.

use std::time::Duration;
use tokio::time::sleep;

use crate::api::ApiError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Backoff factor; the n-th retry waits `factor * 2^(n-1)`
    pub backoff_factor: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: Duration::from_secs(1),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the backoff factor
    pub fn backoff_factor(mut self, factor: Duration) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Delay before the given retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = 2f64.powi(retry.saturating_sub(1) as i32);
        let secs = self.backoff_factor.as_secs_f64() * exp;
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Gateway errors that should trigger a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    /// 502
    BadGateway,
    /// 503
    ServiceUnavailable,
    /// 504
    GatewayTimeout,
}

impl TransientError {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            502 => Some(TransientError::BadGateway),
            503 => Some(TransientError::ServiceUnavailable),
            504 => Some(TransientError::GatewayTimeout),
            _ => None,
        }
    }

    /// Check if an ApiError represents a transient error
    pub fn from_api_error(err: &ApiError) -> Option<Self> {
        match err {
            ApiError::Transient { status } => Self::from_status(*status),
            _ => None,
        }
    }
}

/// Execute an async operation, retrying transient gateway errors
///
/// # Arguments
///
/// * `config` - Retry configuration
/// * `operation` - The async operation to execute
///
/// # Returns
///
/// The result of the operation, or the last error once the retry budget is spent.
/// Errors that are not transient are returned immediately.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ApiError>>,
{
    let mut retries = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if retries > 0 {
                    tracing::info!("Request succeeded after {} retries", retries);
                }
                return Ok(result);
            }
            Err(error) => {
                let Some(transient) = TransientError::from_api_error(&error) else {
                    return Err(error);
                };

                if retries >= config.max_retries {
                    tracing::warn!("Request failed after {} retries: {}", retries, error);
                    return Err(error);
                }

                retries += 1;
                let delay = config.delay_for(retries);
                tracing::debug!(
                    "Transient error {:?}, retry {}/{} in {:?}",
                    transient,
                    retries,
                    config.max_retries,
                    delay
                );
                sleep(delay).await;
            }
        }
    }
}

//! Configuration management.

mod file_config;

pub use file_config::{find_config_file, load_config, ConfigError, CONFIG_FILE_NAME, ENV_PREFIX};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;
use crate::models::RecordLevel;
use crate::utils::RetryConfig;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API endpoint and credential
    #[serde(default)]
    pub api: ApiConfig,

    /// Transport retry settings
    #[serde(default)]
    pub retry: RetrySettings,

    /// Narrowing limits and inputs
    #[serde(default)]
    pub sampler: SamplerSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// API endpoint and credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Trove API key
    #[serde(default = "default_api_key", skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Result endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: default_api_key(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key() -> Option<String> {
    std::env::var("TROVE_API_KEY").ok().filter(|k| !k.is_empty())
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Retry settings for gateway errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor_secs: f64,

    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_factor_secs: default_backoff_factor(),
            max_delay_secs: default_max_delay(),
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            backoff_factor: Duration::from_secs_f64(self.backoff_factor_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_factor() -> f64 {
    1.0
}

fn default_max_delay() -> u64 {
    120
}

/// Narrowing limits and inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerSettings {
    /// Upper bound of the target count window
    #[serde(default = "default_target_max")]
    pub target_max: u64,

    /// Page size used for the final fetch
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Disambiguation-query attempts before giving up
    #[serde(default = "default_max_probe_attempts")]
    pub max_probe_attempts: u32,

    /// Ceiling on facet applications in one session
    #[serde(default = "default_max_narrowing_iterations")]
    pub max_narrowing_iterations: u32,

    /// Ceiling on ID-prefix queries in one session
    #[serde(default = "default_max_prefix_iterations")]
    pub max_prefix_iterations: u32,

    /// Word list to draw disambiguation tokens from (built-in list if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords_path: Option<PathBuf>,

    /// Record sections to include in the final page
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Record detail level for the final page
    #[serde(default)]
    pub record_level: RecordLevel,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            target_max: default_target_max(),
            page_size: default_page_size(),
            max_probe_attempts: default_max_probe_attempts(),
            max_narrowing_iterations: default_max_narrowing_iterations(),
            max_prefix_iterations: default_max_prefix_iterations(),
            stopwords_path: None,
            include: default_include(),
            record_level: RecordLevel::default(),
        }
    }
}

fn default_target_max() -> u64 {
    100
}

fn default_page_size() -> u32 {
    100
}

fn default_max_probe_attempts() -> u32 {
    10
}

fn default_max_narrowing_iterations() -> u32 {
    50
}

fn default_max_prefix_iterations() -> u32 {
    500
}

fn default_include() -> Vec<String> {
    vec!["links".to_string()]
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

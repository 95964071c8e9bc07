//! Configuration file support.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! key = "your-trove-key"
//! base_url = "https://api.trove.nla.gov.au/v2/result"
//! timeout_secs = 30
//!
//! [retry]
//! max_retries = 5
//! backoff_factor_secs = 1.0
//!
//! [sampler]
//! target_max = 100
//! max_probe_attempts = 10
//! max_narrowing_iterations = 50
//! max_prefix_iterations = 500
//! stopwords_path = "~/words.txt"
//! include = ["links"]
//! record_level = "brief"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every value can be overridden from the environment, with or without a
//! file: `TROVE_RANDOM_` followed by the section, `__`, and the key, e.g.
//! `TROVE_RANDOM_SAMPLER__TARGET_MAX=50`.

use std::path::{Path, PathBuf};

use super::Config;

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "trove-random.toml";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "TROVE_RANDOM";

/// Load configuration from an optional file, with environment overrides.
///
/// A path that is given must exist. Without one, defaults plus the
/// environment are used.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    build_config(path, environment())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn build_config(path: Option<&Path>, env: config::Environment) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder.add_source(env).build()?;

    Ok(settings.try_deserialize()?)
}

/// Find a configuration file in the default locations
///
/// Checks `./trove-random.toml`, then `<config dir>/trove-random/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("trove-random").join("config.toml"))
        .filter(|path| path.is_file())
}

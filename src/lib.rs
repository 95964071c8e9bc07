//! # Trove Random
//!
//! Draw random records from the Trove search API.
//!
//! The API only returns the head of a result list, so a random record is
//! found by narrowing an over-broad query with random constraints until the
//! match count fits in one page, then picking from that page.
//!
//! ## Architecture
//!
//! - [`models`]: Zones, search requests and the response shape
//! - [`api`]: The [`SearchApi`] seam, the HTTP client and a scripted mock
//! - [`sampler`]: Query composition, facet extraction and the narrowing loops
//! - [`utils`]: HTTP client, retry with backoff, record display helpers
//! - [`config`]: Configuration management

pub mod api;
pub mod config;
pub mod models;
pub mod sampler;
pub mod utils;

// Re-export commonly used types
pub use api::{SearchApi, TroveClient};
pub use models::{SearchRequest, SearchResponse, Zone};
pub use sampler::{SampleOutcome, Sampler};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

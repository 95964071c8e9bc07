//! Random record sampling by iterative narrowing.
//!
//! A query over the Trove corpus can match anywhere from nothing to millions
//! of records, and the API only ever hands back the first page. To draw a
//! "random" record the sampler keeps adding randomly chosen constraints until
//! the match count falls inside the target window `(0, target_max]`, then
//! fetches that single page and picks one record from it uniformly.
//!
//! Three narrowing strategies share that shape:
//!
//! - [`Sampler::random_record`]: probe the requested zones with a randomized
//!   query, commit to one zone with results, then apply random facet values
//!   from the dynamic facet catalog.
//! - [`Sampler::random_newspaper_article`]: the newspaper zone, consuming
//!   facets from a fixed priority list instead of the catalog.
//! - [`Sampler::random_by_id_prefix`]: grow and shrink a numeric identifier
//!   prefix used as a wildcard query.
//!
//! # Bias
//!
//! The result is not uniform over the corpus. Once a facet is applied,
//! records with no value for it can no longer be drawn in that session, so
//! well-tagged records are favoured. The ID-prefix strategy restarts from an
//! arbitrary new base whenever it gets stuck, which may under-sample sparse
//! ranges of the identifier space.
//!
//! # Example
//!
//! ```rust,no_run
//! use trove_random::api::TroveClient;
//! use trove_random::config::Config;
//! use trove_random::sampler::{RandomRecordOptions, Sampler};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let client = TroveClient::from_config(&config)?;
//! let mut sampler = Sampler::new(client);
//!
//! let outcome = sampler
//!     .random_record(&RandomRecordOptions::default().query("wombat"))
//!     .await?;
//! if let Some(found) = outcome.found() {
//!     println!("{}", found.record);
//! }
//! # Ok(())
//! # }
//! ```

mod facet_loop;
mod facets;
mod id_prefix;
mod newspaper;
pub mod oracle;
mod probe;
mod query;

pub use facets::{extract_facets, facet_terms, is_selectable, FacetCatalog, TermNode};
pub use id_prefix::{IdPrefix, IdPrefixOptions, PrefixStep};
pub use newspaper::{NewspaperOptions, NEWSPAPER_FACET_PRIORITY};
pub use probe::ZoneProbe;
pub use query::{QueryComposer, Stopwords};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiError, SearchApi};
use crate::config::SamplerSettings;
use crate::models::{FacetConstraints, FacetListing, RecordLevel, SearchRequest, SearchResponse, Zone};

/// Errors that abort a sampling call
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    /// The API call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A path the sampler cannot do without is missing from the response
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Narrowing kept going past its iteration ceiling
    #[error("Narrowing stalled after {iterations} iterations")]
    Stalled { iterations: u32 },

    /// Invalid sampler input
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Bounds on a sampling session
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerLimits {
    /// Upper bound of the target count window
    pub target_max: u64,
    /// Page size for the final fetch
    pub page_size: u32,
    /// Disambiguation-query attempts before giving up
    pub max_probe_attempts: u32,
    /// Ceiling on facet applications per session
    pub max_narrowing_iterations: u32,
    /// Ceiling on ID-prefix queries per session
    pub max_prefix_iterations: u32,
    /// Record sections to include in the final page
    pub include: Vec<String>,
    /// Record detail level for the final page
    pub record_level: RecordLevel,
}

impl Default for SamplerLimits {
    fn default() -> Self {
        Self::from(&SamplerSettings::default())
    }
}

impl From<&SamplerSettings> for SamplerLimits {
    fn from(settings: &SamplerSettings) -> Self {
        Self {
            target_max: settings.target_max.max(1),
            page_size: settings.page_size.max(1),
            max_probe_attempts: settings.max_probe_attempts.max(1),
            max_narrowing_iterations: settings.max_narrowing_iterations.max(1),
            max_prefix_iterations: settings.max_prefix_iterations.max(1),
            include: settings.include.clone(),
            record_level: settings.record_level,
        }
    }
}

/// Why a session ended without a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EmptyReason {
    /// The narrowed query matched nothing
    NoMatches,
    /// Every randomized disambiguation query matched nothing
    ProbeExhausted { attempts: u32 },
    /// The ID-prefix loop hit its iteration ceiling
    PrefixExhausted { iterations: u32 },
}

/// A record drawn by the sampler, with how it was found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampledRecord {
    pub zone: Zone,
    /// Query that produced the final page
    pub query: String,
    /// Facet constraints in force for the final page
    pub facets: FacetConstraints,
    /// Match count of the final page
    pub total: u64,
    /// The record, verbatim
    pub record: Value,
    /// API calls made during the session
    pub requests: usize,
}

/// Result of a sampling call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SampleOutcome {
    Found(SampledRecord),
    Empty(EmptyReason),
}

impl SampleOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SampleOutcome::Found(_))
    }

    pub fn found(&self) -> Option<&SampledRecord> {
        match self {
            SampleOutcome::Found(record) => Some(record),
            SampleOutcome::Empty(_) => None,
        }
    }

    pub fn into_found(self) -> Option<SampledRecord> {
        match self {
            SampleOutcome::Found(record) => Some(record),
            SampleOutcome::Empty(_) => None,
        }
    }
}

/// Options for [`Sampler::random_record`]
#[derive(Debug, Clone, Default)]
pub struct RandomRecordOptions {
    /// Zones to consider; empty means every faceted zone
    pub zones: Vec<Zone>,
    /// Base query; a random stopword is used when absent
    pub query: Option<String>,
    /// Append a random stopword to the base query
    pub random_word: bool,
    /// Append a random two-digit number to the base query
    pub random_number: bool,
    /// Facet constraints applied before narrowing starts
    pub facets: FacetConstraints,
}

impl RandomRecordOptions {
    pub fn zones(mut self, zones: impl Into<Vec<Zone>>) -> Self {
        self.zones = zones.into();
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn random_word(mut self, enabled: bool) -> Self {
        self.random_word = enabled;
        self
    }

    pub fn random_number(mut self, enabled: bool) -> Self {
        self.random_number = enabled;
        self
    }

    pub fn facet(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.facets.apply(name, value);
        self
    }
}

/// Draws random records from a [`SearchApi`].
///
/// All state for a session lives on the stack of the sampling call; the
/// sampler itself only holds the API handle, the word list and the RNG.
#[derive(Debug)]
pub struct Sampler<A: SearchApi> {
    api: A,
    composer: QueryComposer,
    limits: SamplerLimits,
    rng: StdRng,
    requests: usize,
}

impl<A: SearchApi> Sampler<A> {
    /// Create a sampler with default limits, the built-in word list and an
    /// entropy-seeded RNG
    pub fn new(api: A) -> Self {
        Self {
            api,
            composer: QueryComposer::default(),
            limits: SamplerLimits::default(),
            rng: StdRng::from_entropy(),
            requests: 0,
        }
    }

    pub fn with_limits(mut self, limits: SamplerLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_composer(mut self, composer: QueryComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Seed the RNG for a reproducible session sequence
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn limits(&self) -> &SamplerLimits {
        &self.limits
    }

    /// Issue one request, counting it toward the current session
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchResponse, SamplerError> {
        self.requests += 1;
        tracing::debug!(
            zones = %crate::models::join_zones(&request.zones),
            query = %request.query,
            facets = ?request.facets,
            window = request.window,
            "Issuing search"
        );
        Ok(self.api.search(request).await?)
    }

    /// Count-only search returning the first zone's total
    async fn count(&mut self, request: &SearchRequest) -> Result<(u64, SearchResponse), SamplerError> {
        let response = self.search(request).await?;
        let total = oracle::count(&response, 0)?;
        Ok((total, response))
    }

    fn in_window(&self, total: u64) -> bool {
        total > 0 && total <= self.limits.target_max
    }

    /// Pick a record uniformly from the first zone of a page
    fn pick(&mut self, response: &SearchResponse) -> Option<Value> {
        response
            .zone_at(0)
            .and_then(|zone| zone.records().choose(&mut self.rng))
            .cloned()
    }

    fn found(&self, zone: Zone, request: &SearchRequest, total: u64, record: Value) -> SampleOutcome {
        tracing::info!(
            zone = %zone,
            total,
            requests = self.requests,
            "Picked record {}",
            crate::utils::record_id(&record).unwrap_or_default()
        );
        SampleOutcome::Found(SampledRecord {
            zone,
            query: request.query.clone(),
            facets: request.facets.clone(),
            total,
            record,
            requests: self.requests,
        })
    }

    /// Final step shared by the facet loops: fetch one page without facet
    /// listings and choose a record from it
    async fn fetch_and_pick(
        &mut self,
        zone: Zone,
        mut request: SearchRequest,
        total: u64,
    ) -> Result<SampleOutcome, SamplerError> {
        if total == 0 {
            return Ok(SampleOutcome::Empty(EmptyReason::NoMatches));
        }

        request.facet_listing = FacetListing::None;
        request.window = self.limits.page_size.min(crate::models::MAX_WINDOW);
        request.record_level = self.limits.record_level;
        request.include = self.limits.include.clone();

        let response = self.search(&request).await?;
        let total = oracle::count(&response, 0)?;
        match self.pick(&response) {
            Some(record) => Ok(self.found(zone, &request, total, record)),
            None => {
                tracing::warn!(total, "Final page carried no records");
                Ok(SampleOutcome::Empty(EmptyReason::NoMatches))
            }
        }
    }
}

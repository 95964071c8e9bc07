//! Narrowing the newspaper zone with a fixed facet order.

use rand::seq::SliceRandom;

use super::{facet_terms, EmptyReason, SampleOutcome, Sampler, SamplerError};
use crate::api::SearchApi;
use crate::models::{FacetConstraints, FacetListing, SearchRequest, Zone};

/// Facets tried for newspapers, consumed from the end: `title` first,
/// `month` last. `decade` comes before `year` and `year` before `month`
/// because the API only lists the finer facet once the coarser one is set.
pub const NEWSPAPER_FACET_PRIORITY: [&str; 7] = [
    "month",
    "year",
    "decade",
    "word",
    "illustrated",
    "category",
    "title",
];

/// Options for [`Sampler::random_newspaper_article`]
#[derive(Debug, Clone, Default)]
pub struct NewspaperOptions {
    /// Base query; a random stopword is used when absent
    pub query: Option<String>,
    /// Append a random stopword to the base query
    pub random_word: bool,
    /// Append a random two-digit number to the base query
    pub random_number: bool,
    /// Facet constraints applied before narrowing starts
    pub facets: FacetConstraints,
}

impl NewspaperOptions {
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

impl<A: SearchApi> Sampler<A> {
    /// Draw a random newspaper article.
    ///
    /// Facets are taken from [`NEWSPAPER_FACET_PRIORITY`], skipping any the
    /// caller already applied. Each facet's terms are fetched with a dedicated
    /// single-facet request before one term is chosen at random.
    pub async fn random_newspaper_article(
        &mut self,
        options: &NewspaperOptions,
    ) -> Result<SampleOutcome, SamplerError> {
        self.requests = 0;

        let mut found = None;
        for attempt in 1..=self.limits.max_probe_attempts {
            let query = self.composer.compose(
                &mut self.rng,
                options.query.as_deref(),
                options.random_word,
                options.random_number || attempt > 1,
            );
            let request = SearchRequest::new(vec![Zone::Newspaper], query)
                .facets(options.facets.clone());
            let (total, _) = self.count(&request).await?;
            if total > 0 {
                found = Some((request, total));
                break;
            }
            tracing::debug!(attempt, query = %request.query, "No articles, recomposing query");
        }

        let Some((mut request, mut total)) = found else {
            tracing::warn!(
                attempts = self.limits.max_probe_attempts,
                "Newspaper query retries exhausted"
            );
            return Ok(SampleOutcome::Empty(EmptyReason::ProbeExhausted {
                attempts: self.limits.max_probe_attempts,
            }));
        };

        let mut pending: Vec<&str> = NEWSPAPER_FACET_PRIORITY.to_vec();
        let mut iterations = 0;

        while total > self.limits.target_max {
            let Some(facet) = pending.pop() else {
                tracing::warn!(total, "Newspaper facets exhausted before reaching the target window");
                break;
            };
            if request.facets.contains(facet) {
                continue;
            }
            if iterations >= self.limits.max_narrowing_iterations {
                return Err(SamplerError::Stalled { iterations });
            }

            let listing = request
                .clone()
                .facet_listing(FacetListing::Named(facet.to_string()));
            let response = self.search(&listing).await?;
            let Some(term) = facet_terms(&response, facet).choose(&mut self.rng).cloned() else {
                tracing::debug!(facet, "No terms listed, moving on");
                continue;
            };

            tracing::debug!(total, facet, value = %term, "Applying newspaper facet");
            request.facets.apply(facet, term);
            iterations += 1;

            let (next_total, _) = self.count(&request).await?;
            total = next_total;
        }

        self.fetch_and_pick(Zone::Newspaper, request, total).await
    }
}

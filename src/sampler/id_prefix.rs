//! Narrowing by a numeric identifier prefix.
//!
//! Works only where records carry dense, roughly uniform numeric ids (the
//! newspaper zone is the usual target) and no free-text query is needed.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{oracle, EmptyReason, SampleOutcome, Sampler, SamplerError};
use crate::api::SearchApi;
use crate::models::{FacetConstraints, SearchRequest, Zone};

/// Range fresh bases are drawn from
const BASE_RANGE: std::ops::Range<u32> = 10_000..100_000;

/// Shortest prefix that may still be shortened
const MIN_SHRINK_LEN: usize = 4;

/// What [`IdPrefix::advance`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixStep {
    /// First base chosen
    Started,
    /// Last digit dropped to widen the match
    Shrunk,
    /// Next shuffled digit appended to narrow the match
    Grown,
    /// Prefix abandoned for a fresh base
    Restarted,
}

/// Prefix under construction, with the shuffled digits for the current round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPrefix {
    prefix: Option<String>,
    digits: [u8; 10],
    cursor: usize,
}

impl Default for IdPrefix {
    fn default() -> Self {
        Self::new()
    }
}

impl IdPrefix {
    pub fn new() -> Self {
        Self {
            prefix: None,
            digits: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
            cursor: 0,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Digits appended since the last fresh base
    pub fn digits_used(&self) -> usize {
        self.cursor
    }

    /// Move to the next prefix given the count the current one produced.
    ///
    /// Only call this while `total` is outside `(0, target_max]`.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, total: u64, target_max: u64) -> PrefixStep {
        let Some(prefix) = self.prefix.as_mut() else {
            self.restart(rng);
            return PrefixStep::Started;
        };

        if total == 0 && prefix.len() >= MIN_SHRINK_LEN {
            prefix.pop();
            return PrefixStep::Shrunk;
        }
        if total > target_max && self.cursor < self.digits.len() {
            prefix.push(char::from(b'0' + self.digits[self.cursor]));
            self.cursor += 1;
            return PrefixStep::Grown;
        }

        // too short to shrink, or every digit of this round already tried
        self.restart(rng);
        PrefixStep::Restarted
    }

    fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.prefix = Some(rng.gen_range(BASE_RANGE).to_string());
        self.digits.shuffle(rng);
        self.cursor = 0;
    }
}

/// Options for [`Sampler::random_by_id_prefix`]
#[derive(Debug, Clone)]
pub struct IdPrefixOptions {
    pub zone: Zone,
    /// Facet constraints held fixed for every query
    pub facets: FacetConstraints,
}

impl Default for IdPrefixOptions {
    fn default() -> Self {
        Self {
            zone: Zone::Newspaper,
            facets: FacetConstraints::new(),
        }
    }
}

impl IdPrefixOptions {
    pub fn zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    pub fn facet(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.facets.apply(name, value);
        self
    }
}

/// Wildcard query matching ids starting with `prefix`
pub fn prefix_query(prefix: &str) -> String {
    format!("id:{}*", prefix)
}

impl<A: SearchApi> Sampler<A> {
    /// Draw a random record by growing and shrinking an id prefix until the
    /// match count lands in the target window.
    ///
    /// Gives up with [`EmptyReason::PrefixExhausted`] after
    /// `max_prefix_iterations` queries.
    pub async fn random_by_id_prefix(
        &mut self,
        options: &IdPrefixOptions,
    ) -> Result<SampleOutcome, SamplerError> {
        self.requests = 0;

        let mut state = IdPrefix::new();
        let mut total = 0;

        for iteration in 1..=self.limits.max_prefix_iterations {
            let step = state.advance(&mut self.rng, total, self.limits.target_max);
            let prefix = state.prefix().unwrap_or_default().to_string();
            tracing::debug!(iteration, ?step, %prefix, total, "Advancing id prefix");

            let request = SearchRequest::new(vec![options.zone], prefix_query(&prefix))
                .facets(options.facets.clone())
                .window(self.limits.page_size)
                .record_level(self.limits.record_level)
                .include(self.limits.include.clone());
            let response = self.search(&request).await?;
            total = oracle::count(&response, 0)?;

            if self.in_window(total) {
                if let Some(record) = self.pick(&response) {
                    return Ok(self.found(options.zone, &request, total, record));
                }
                tracing::warn!(total, %prefix, "Page carried no records, widening");
                total = 0;
            }
        }

        tracing::warn!(
            iterations = self.limits.max_prefix_iterations,
            "Id prefix loop hit its iteration ceiling"
        );
        Ok(SampleOutcome::Empty(EmptyReason::PrefixExhausted {
            iterations: self.limits.max_prefix_iterations,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::models::SearchResponse;
    use crate::sampler::SamplerLimits;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn prefix_of(request: &SearchRequest) -> String {
        request
            .query
            .strip_prefix("id:")
            .and_then(|q| q.strip_suffix('*'))
            .unwrap()
            .to_string()
    }

    fn empty() -> SearchResponse {
        SearchResponse::default().with_zone(Zone::Newspaper, 0, vec![])
    }

    #[test]
    fn test_first_step_picks_five_digit_base() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = IdPrefix::new();
        assert_eq!(state.advance(&mut rng, 0, 100), PrefixStep::Started);
        let prefix = state.prefix().unwrap();
        assert_eq!(prefix.len(), 5);
        let n: u32 = prefix.parse().unwrap();
        assert!(BASE_RANGE.contains(&n));
    }

    #[test]
    fn test_growth_uses_each_digit_once_then_restarts() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = IdPrefix::new();
        state.advance(&mut rng, 0, 100);
        let base = state.prefix().unwrap().to_string();

        for i in 1..=10 {
            assert_eq!(state.advance(&mut rng, 5000, 100), PrefixStep::Grown);
            assert_eq!(state.prefix().unwrap().len(), 5 + i);
        }
        let grown = state.prefix().unwrap();
        assert!(grown.starts_with(&base));
        let mut appended: Vec<char> = grown[5..].chars().collect();
        appended.sort();
        assert_eq!(appended.into_iter().collect::<String>(), "0123456789");

        assert_eq!(state.advance(&mut rng, 5000, 100), PrefixStep::Restarted);
        assert_eq!(state.prefix().unwrap().len(), 5);
        assert_eq!(state.digits_used(), 0);
    }

    #[test]
    fn test_shrink_floor() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = IdPrefix::new();
        state.advance(&mut rng, 0, 100);
        let base = state.prefix().unwrap().to_string();

        assert_eq!(state.advance(&mut rng, 0, 100), PrefixStep::Shrunk);
        assert_eq!(state.prefix().unwrap(), &base[..4]);
        assert_eq!(state.advance(&mut rng, 0, 100), PrefixStep::Shrunk);
        assert_eq!(state.prefix().unwrap(), &base[..3]);
        assert_eq!(state.advance(&mut rng, 0, 100), PrefixStep::Restarted);
        assert_eq!(state.prefix().unwrap().len(), 5);
    }

    #[test]
    fn test_short_prefix_is_never_shrunk_further() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = IdPrefix::new();
        state.advance(&mut rng, 0, 100);

        for _ in 0..2000 {
            let before = state.prefix().unwrap().len();
            let total = match rng.gen_range(0..3) {
                0 => 0,
                _ => 1000,
            };
            let step = state.advance(&mut rng, total, 100);
            let after = state.prefix().unwrap().len();
            match step {
                PrefixStep::Shrunk => {
                    assert!(before >= MIN_SHRINK_LEN);
                    assert_eq!(after, before - 1);
                }
                PrefixStep::Restarted => assert_eq!(after, 5),
                PrefixStep::Grown => assert_eq!(after, before + 1),
                PrefixStep::Started => unreachable!(),
            }
            assert!(after >= MIN_SHRINK_LEN - 1);
        }
    }

    #[tokio::test]
    async fn test_zero_results_shrink_then_reset() {
        let api = MockApi::with_responses(vec![
            empty(),
            empty(),
            empty(),
            SearchResponse::default().with_zone(
                Zone::Newspaper,
                2,
                vec![json!({"id": "1"}), json!({"id": "2"})],
            ),
        ]);
        let mut sampler = Sampler::new(api).with_seed(5);

        let outcome = sampler
            .random_by_id_prefix(&IdPrefixOptions::default())
            .await
            .unwrap();

        assert!(outcome.is_found());
        let prefixes: Vec<String> = sampler.api().requests().iter().map(prefix_of).collect();
        assert_eq!(prefixes.len(), 4);
        assert_eq!(prefixes[0].len(), 5);
        assert_eq!(prefixes[1], prefixes[0][..4]);
        assert_eq!(prefixes[2], prefixes[0][..3]);
        assert_eq!(prefixes[3].len(), 5);
    }

    #[tokio::test]
    async fn test_requests_use_zone_window_and_facets() {
        let api = MockApi::with_responses(vec![
            SearchResponse::default().with_zone(Zone::Newspaper, 4000, vec![]),
            SearchResponse::default().with_zone(Zone::Newspaper, 40, vec![json!({"id": "7"})]),
        ]);
        let mut sampler = Sampler::new(api).with_seed(6);

        let outcome = sampler
            .random_by_id_prefix(&IdPrefixOptions::default().facet("category", "Article"))
            .await
            .unwrap();

        assert_eq!(outcome.found().unwrap().record["id"], "7");
        let requests = sampler.api().requests();
        assert_eq!(prefix_of(&requests[1]).len(), 6);
        assert!(prefix_of(&requests[1]).starts_with(&prefix_of(&requests[0])));
        for request in &requests {
            assert_eq!(request.zones, vec![Zone::Newspaper]);
            assert_eq!(request.window, 100);
            assert_eq!(request.facets.get("category"), Some("Article"));
        }
    }

    #[tokio::test]
    async fn test_iteration_ceiling() {
        let api = MockApi::new();
        api.set_fallback(empty());
        let limits = SamplerLimits {
            max_prefix_iterations: 25,
            ..SamplerLimits::default()
        };
        let mut sampler = Sampler::new(api).with_seed(7).with_limits(limits);

        let outcome = sampler
            .random_by_id_prefix(&IdPrefixOptions::default())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SampleOutcome::Empty(EmptyReason::PrefixExhausted { iterations: 25 })
        );
        assert_eq!(sampler.api().request_count(), 25);
    }
}

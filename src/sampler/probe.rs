//! Finding a zone with results for a randomized query.

use rand::seq::SliceRandom;

use super::{oracle, Sampler, SamplerError};
use crate::api::SearchApi;
use crate::models::{FacetConstraints, SearchRequest, Zone};

/// A query that matched something, and the zone chosen to narrow in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneProbe {
    pub query: String,
    pub zone: Zone,
    /// Every zone that had results for `query`
    pub candidates: Vec<Zone>,
}

impl<A: SearchApi> Sampler<A> {
    /// Compose a query and count it across `zones` until some zone has
    /// results.
    ///
    /// The first attempt perturbs the query with a random word only (when
    /// `random_word` is set or there is no base query). Later attempts also
    /// allow a random number, so a base query without `random_word` still
    /// changes between attempts. Returns `None` once `max_probe_attempts`
    /// queries have all matched nothing.
    pub async fn probe_zones(
        &mut self,
        zones: &[Zone],
        base_query: Option<&str>,
        random_word: bool,
        facets: &FacetConstraints,
    ) -> Result<Option<ZoneProbe>, SamplerError> {
        let zones: Vec<Zone> = if zones.is_empty() {
            Zone::FACETED.to_vec()
        } else {
            zones.to_vec()
        };

        for attempt in 1..=self.limits.max_probe_attempts {
            let query = self
                .composer
                .compose(&mut self.rng, base_query, random_word, attempt > 1);

            let request = SearchRequest::new(zones.clone(), query.clone()).facets(facets.clone());
            let response = self.search(&request).await?;
            let candidates = oracle::zones_with_results(&response)?;

            match candidates.choose(&mut self.rng).copied() {
                Some(zone) => {
                    tracing::debug!(%zone, attempt, ?candidates, "Zone probe succeeded");
                    return Ok(Some(ZoneProbe {
                        query,
                        zone,
                        candidates,
                    }));
                }
                None => {
                    tracing::debug!(attempt, %query, "No zone has results, recomposing query");
                }
            }
        }

        tracing::warn!(
            attempts = self.limits.max_probe_attempts,
            "Zone probing exhausted without results"
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::models::SearchResponse;
    use crate::sampler::SamplerLimits;

    fn empty(zones: &[Zone]) -> SearchResponse {
        zones
            .iter()
            .fold(SearchResponse::default(), |r, z| r.with_zone(*z, 0, vec![]))
    }

    #[tokio::test]
    async fn test_probe_picks_zone_with_results() {
        let zones = [Zone::Book, Zone::Article, Zone::Map];
        let api = MockApi::with_responses(vec![SearchResponse::default()
            .with_zone(Zone::Book, 0, vec![])
            .with_zone(Zone::Article, 0, vec![])
            .with_zone(Zone::Map, 7, vec![])]);
        let mut sampler = Sampler::new(api).with_seed(1);

        let probe = sampler
            .probe_zones(&zones, None, false, &FacetConstraints::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(probe.zone, Zone::Map);
        assert_eq!(probe.candidates, vec![Zone::Map]);

        let requests = sampler.api().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].window, 0);
        assert_eq!(requests[0].zones, zones.to_vec());
        assert_eq!(requests[0].query, probe.query);
    }

    #[tokio::test]
    async fn test_probe_defaults_to_faceted_zones_and_applies_overrides() {
        let api = MockApi::new();
        api.set_fallback(SearchResponse::default().with_zone(Zone::Music, 3, vec![]));
        let mut sampler = Sampler::new(api).with_seed(2);
        let mut facets = FacetConstraints::new();
        facets.apply("format", "Sound");

        sampler
            .probe_zones(&[], Some("jazz"), false, &facets)
            .await
            .unwrap()
            .unwrap();

        let request = &sampler.api().requests()[0];
        assert_eq!(request.zones, Zone::FACETED.to_vec());
        assert_eq!(request.facets.get("format"), Some("Sound"));
        assert_eq!(request.query, "jazz");
    }

    #[tokio::test]
    async fn test_probe_gives_up_after_budget() {
        let zones = [Zone::Book, Zone::Article];
        let api = MockApi::new();
        api.set_fallback(empty(&zones));
        let mut sampler = Sampler::new(api).with_seed(3);

        let probe = sampler
            .probe_zones(&zones, Some("cat"), false, &FacetConstraints::new())
            .await
            .unwrap();

        assert!(probe.is_none());
        let requests = sampler.api().requests();
        assert_eq!(requests.len(), 10);
        assert_eq!(requests[0].query, "cat");
        for request in &requests[1..] {
            assert!(request.query.starts_with("cat \""));
        }
    }

    #[tokio::test]
    async fn test_probe_retries_recompose_the_query() {
        let zones = [Zone::Picture];
        let api = MockApi::with_responses(vec![
            empty(&zones),
            empty(&zones),
            SearchResponse::default().with_zone(Zone::Picture, 1, vec![]),
        ]);
        let limits = SamplerLimits {
            max_probe_attempts: 3,
            ..SamplerLimits::default()
        };
        let mut sampler = Sampler::new(api).with_seed(4).with_limits(limits);

        let probe = sampler
            .probe_zones(&zones, None, true, &FacetConstraints::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(probe.zone, Zone::Picture);
        assert_eq!(sampler.api().request_count(), 3);
        for request in sampler.api().requests() {
            assert!(request.query.starts_with('"') && request.query.ends_with('"'));
        }
    }
}

//! Narrowing with random facet values from the dynamic catalog.

use super::{
    extract_facets, EmptyReason, RandomRecordOptions, SampleOutcome, Sampler, SamplerError,
};
use crate::api::SearchApi;
use crate::models::{FacetConstraints, FacetListing, SearchRequest, SearchResponse, Zone};

impl<A: SearchApi> Sampler<A> {
    /// Draw a random record from one of the requested zones.
    ///
    /// Probes the zones with a randomized query, commits to one zone with
    /// results and narrows it with random facet values.
    pub async fn random_record(
        &mut self,
        options: &RandomRecordOptions,
    ) -> Result<SampleOutcome, SamplerError> {
        self.requests = 0;

        let probe = self
            .probe_zones(
                &options.zones,
                options.query.as_deref(),
                options.random_word,
                &options.facets,
            )
            .await?;
        let Some(probe) = probe else {
            return Ok(SampleOutcome::Empty(EmptyReason::ProbeExhausted {
                attempts: self.limits.max_probe_attempts,
            }));
        };

        if options.random_number {
            let numbered = self
                .composer
                .compose(&mut self.rng, Some(probe.query.as_str()), false, true);
            let (request, total, response) = self
                .faceted_count(probe.zone, &numbered, &options.facets)
                .await?;
            if total > 0 {
                return self.narrow_from(probe.zone, request, total, &response).await;
            }
            tracing::debug!(query = %numbered, "Numbered query matched nothing, using probe query");
        }

        self.narrow_zone(probe.zone, &probe.query, &options.facets).await
    }

    /// Narrow a single zone by random facet values and pick a record.
    ///
    /// `facets` are applied up front and never drawn again.
    pub async fn sample_zone(
        &mut self,
        zone: Zone,
        query: &str,
        facets: &FacetConstraints,
    ) -> Result<SampleOutcome, SamplerError> {
        self.requests = 0;
        self.narrow_zone(zone, query, facets).await
    }

    async fn narrow_zone(
        &mut self,
        zone: Zone,
        query: &str,
        facets: &FacetConstraints,
    ) -> Result<SampleOutcome, SamplerError> {
        let (request, total, response) = self.faceted_count(zone, query, facets).await?;
        self.narrow_from(zone, request, total, &response).await
    }

    /// First count of a narrowing session, with the full facet listing
    async fn faceted_count(
        &mut self,
        zone: Zone,
        query: &str,
        facets: &FacetConstraints,
    ) -> Result<(SearchRequest, u64, SearchResponse), SamplerError> {
        let request = SearchRequest::new(vec![zone], query)
            .facets(facets.clone())
            .facet_listing(FacetListing::All);
        let (total, response) = self.count(&request).await?;
        Ok((request, total, response))
    }

    async fn narrow_from(
        &mut self,
        zone: Zone,
        mut request: SearchRequest,
        mut total: u64,
        response: &SearchResponse,
    ) -> Result<SampleOutcome, SamplerError> {
        let mut catalog = extract_facets(response).without(&request.facets);
        let mut iterations = 0;

        while total > self.limits.target_max && !catalog.is_empty() {
            if iterations >= self.limits.max_narrowing_iterations {
                return Err(SamplerError::Stalled { iterations });
            }

            let Some((name, term)) = catalog
                .choose(&mut self.rng)
                .map(|(name, term)| (name.to_string(), term.to_string()))
            else {
                break;
            };

            tracing::debug!(%zone, total, facet = %name, value = %term, "Applying facet");
            request.facets.apply(name, term);
            iterations += 1;

            let (next_total, response) = self.count(&request).await?;
            total = next_total;
            catalog = extract_facets(&response).without(&request.facets);
        }

        if total > self.limits.target_max {
            tracing::warn!(
                %zone,
                total,
                "Facet catalog exhausted before reaching the target window"
            );
        }

        self.fetch_and_pick(zone, request, total).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::sampler::SamplerLimits;
    use serde_json::{json, Value};

    fn records(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({"id": i.to_string()})).collect()
    }

    fn faceted(zone: Zone, total: u64, facets: Value) -> SearchResponse {
        SearchResponse::default()
            .with_zone(zone, total, vec![])
            .with_facets(facets)
    }

    #[tokio::test]
    async fn test_in_window_needs_no_narrowing() {
        let api = MockApi::with_responses(vec![
            faceted(Zone::Book, 45, json!({"facet": [{"name": "year", "term": [{"search": "1901"}]}]})),
            SearchResponse::default().with_zone(Zone::Book, 45, records(45)),
        ]);
        let mut sampler = Sampler::new(api).with_seed(1);

        let outcome = sampler
            .sample_zone(Zone::Book, "\"the\"", &FacetConstraints::new())
            .await
            .unwrap();

        let found = outcome.found().unwrap();
        assert_eq!(found.total, 45);
        assert_eq!(found.requests, 2);
        assert!(found.facets.is_empty());
        let id: usize = found.record["id"].as_str().unwrap().parse().unwrap();
        assert!(id < 45);

        let requests = sampler.api().requests();
        assert_eq!(requests[0].window, 0);
        assert_eq!(requests[0].facet_listing, FacetListing::All);
        assert_eq!(requests[1].window, 100);
        assert_eq!(requests[1].facet_listing, FacetListing::None);
        assert_eq!(requests.iter().filter(|r| r.window == 100).count(), 1);
    }

    #[tokio::test]
    async fn test_one_facet_application() {
        let api = MockApi::with_responses(vec![
            faceted(
                Zone::Picture,
                500,
                json!({"facet": [{"name": "format", "term": [{"search": "Photograph"}]}]}),
            ),
            faceted(Zone::Picture, 30, json!({"facet": []})),
            SearchResponse::default().with_zone(Zone::Picture, 30, records(30)),
        ]);
        let mut sampler = Sampler::new(api).with_seed(2);

        let outcome = sampler
            .sample_zone(Zone::Picture, "\"of\"", &FacetConstraints::new())
            .await
            .unwrap();

        assert!(outcome.is_found());
        let requests = sampler.api().requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].facets.is_empty());
        assert_eq!(requests[1].facets.get("format"), Some("Photograph"));
        assert_eq!(requests[1].window, 0);
        assert_eq!(requests[2].facets.get("format"), Some("Photograph"));
        assert_eq!(requests[2].window, 100);
        assert_eq!(outcome.found().unwrap().facets.len(), 1);
    }

    #[tokio::test]
    async fn test_applied_facets_never_reappear() {
        // The API keeps listing every facet; the loop must still pick each name once.
        let all = json!({"facet": [
            {"name": "format", "term": [{"search": "Book"}]},
            {"name": "year", "term": [{"search": "1901"}]},
            {"name": "language", "term": [{"search": "English"}]}
        ]});
        let api = MockApi::with_responses(vec![
            faceted(Zone::Book, 9000, all.clone()),
            faceted(Zone::Book, 4000, all.clone()),
            faceted(Zone::Book, 2000, all.clone()),
            faceted(Zone::Book, 1000, all.clone()),
            SearchResponse::default().with_zone(Zone::Book, 1000, records(100)),
        ]);
        let mut sampler = Sampler::new(api).with_seed(3);

        let outcome = sampler
            .sample_zone(Zone::Book, "cat", &FacetConstraints::new())
            .await
            .unwrap();

        let found = outcome.found().unwrap();
        let mut names: Vec<&str> = found.facets.names().collect();
        names.sort();
        assert_eq!(names, vec!["format", "language", "year"]);
        assert_eq!(sampler.api().request_count(), 5);

        let requests = sampler.api().requests();
        for pair in requests.windows(2) {
            assert!(pair[1].facets.len() >= pair[0].facets.len());
        }
    }

    #[tokio::test]
    async fn test_overrides_are_kept_and_not_redrawn() {
        let api = MockApi::with_responses(vec![
            faceted(
                Zone::Map,
                300,
                json!({"facet": [
                    {"name": "format", "term": [{"search": "Map"}]},
                    {"name": "year", "term": [{"search": "1850"}]}
                ]}),
            ),
            faceted(Zone::Map, 10, json!({"facet": []})),
            SearchResponse::default().with_zone(Zone::Map, 10, records(10)),
        ]);
        let mut sampler = Sampler::new(api).with_seed(4);
        let mut overrides = FacetConstraints::new();
        overrides.apply("format", "Map");

        sampler
            .sample_zone(Zone::Map, "river", &overrides)
            .await
            .unwrap();

        let requests = sampler.api().requests();
        assert_eq!(requests[0].facets.get("format"), Some("Map"));
        assert_eq!(requests[1].facets.get("year"), Some("1850"));
        assert_eq!(
            requests[1].facets.names().collect::<Vec<_>>(),
            vec!["format", "year"]
        );
    }

    #[tokio::test]
    async fn test_exhausted_catalog_proceeds_anyway() {
        let api = MockApi::with_responses(vec![
            faceted(Zone::Music, 5000, json!({"facet": [{"name": "decade", "term": [{"search": "190"}]}]})),
            SearchResponse::default().with_zone(Zone::Music, 5000, records(100)),
        ]);
        let mut sampler = Sampler::new(api).with_seed(5);

        let outcome = sampler
            .sample_zone(Zone::Music, "song", &FacetConstraints::new())
            .await
            .unwrap();

        assert_eq!(outcome.found().unwrap().total, 5000);
        assert_eq!(sampler.api().request_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_total_yields_no_result() {
        let api = MockApi::with_responses(vec![SearchResponse::default().with_zone(Zone::Book, 0, vec![])]);
        let mut sampler = Sampler::new(api).with_seed(6);

        let outcome = sampler
            .sample_zone(Zone::Book, "zzzz", &FacetConstraints::new())
            .await
            .unwrap();

        assert_eq!(outcome, SampleOutcome::Empty(EmptyReason::NoMatches));
        assert_eq!(sampler.api().request_count(), 1);
    }

    #[tokio::test]
    async fn test_narrowing_ceiling_reports_stall() {
        let api = MockApi::new();
        api.set_fallback(faceted(
            Zone::Book,
            1000,
            json!({"facet": [
                {"name": "a", "term": [{"search": "1"}]},
                {"name": "b", "term": [{"search": "1"}]},
                {"name": "c", "term": [{"search": "1"}]}
            ]}),
        ));
        let limits = SamplerLimits {
            max_narrowing_iterations: 2,
            ..SamplerLimits::default()
        };
        let mut sampler = Sampler::new(api).with_seed(7).with_limits(limits);

        let result = sampler
            .sample_zone(Zone::Book, "cat", &FacetConstraints::new())
            .await;

        assert!(matches!(result, Err(SamplerError::Stalled { iterations: 2 })));
    }

    #[tokio::test]
    async fn test_random_record_probes_then_narrows() {
        let api = MockApi::with_responses(vec![
            SearchResponse::default()
                .with_zone(Zone::Book, 0, vec![])
                .with_zone(Zone::Article, 20, vec![]),
            faceted(Zone::Article, 20, json!({"facet": []})),
            SearchResponse::default().with_zone(Zone::Article, 20, records(20)),
        ]);
        let mut sampler = Sampler::new(api).with_seed(8);

        let outcome = sampler
            .random_record(&RandomRecordOptions::default().zones(vec![Zone::Book, Zone::Article]))
            .await
            .unwrap();

        let found = outcome.found().unwrap();
        assert_eq!(found.zone, Zone::Article);
        assert_eq!(found.requests, 3);
        let requests = sampler.api().requests();
        assert_eq!(requests[1].zones, vec![Zone::Article]);
        assert_eq!(requests[1].query, requests[0].query);
    }

    #[tokio::test]
    async fn test_random_number_falls_back_to_probe_query() {
        let api = MockApi::with_responses(vec![
            SearchResponse::default().with_zone(Zone::Book, 12, vec![]),
            faceted(Zone::Book, 0, json!({"facet": []})),
            faceted(Zone::Book, 12, json!({"facet": []})),
            SearchResponse::default().with_zone(Zone::Book, 12, records(12)),
        ]);
        let mut sampler = Sampler::new(api).with_seed(9);

        let outcome = sampler
            .random_record(
                &RandomRecordOptions::default()
                    .zones(vec![Zone::Book])
                    .query("cat")
                    .random_number(true),
            )
            .await
            .unwrap();

        assert!(outcome.is_found());
        let requests = sampler.api().requests();
        assert_eq!(requests[0].query, "cat");
        assert!(requests[1].query.starts_with("cat \""));
        assert_eq!(requests[2].query, "cat");
        assert_eq!(outcome.found().unwrap().query, "cat");
    }

    #[tokio::test]
    async fn test_numbered_query_narrowed_to_nothing_is_not_retried() {
        let api = MockApi::with_responses(vec![
            SearchResponse::default().with_zone(Zone::Book, 800, vec![]),
            faceted(
                Zone::Book,
                600,
                json!({"facet": {"name": "year", "term": {"search": "1901"}}}),
            ),
            faceted(Zone::Book, 0, json!({"facet": []})),
        ]);
        let mut sampler = Sampler::new(api).with_seed(10);

        let outcome = sampler
            .random_record(
                &RandomRecordOptions::default()
                    .zones(vec![Zone::Book])
                    .query("cat")
                    .random_number(true),
            )
            .await
            .unwrap();

        assert_eq!(outcome, SampleOutcome::Empty(EmptyReason::NoMatches));
        let requests = sampler.api().requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].query.starts_with("cat \""));
        assert_eq!(requests[2].query, requests[1].query);
        assert_eq!(requests[2].facets.get("year"), Some("1901"));
        assert_eq!(sampler.api().remaining(), 0);
    }
}

//! Search request models.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::zone::{join_zones, Zone};

/// Largest page the API returns in one call
pub const MAX_WINDOW: u32 = 100;

/// Facet constraints applied to a request, in the order they were applied.
///
/// A facet name appears at most once. Entries are only ever added during a
/// narrowing session, so the set grows monotonically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetConstraints {
    entries: Vec<(String, String)>,
}

impl FacetConstraints {
    /// Create an empty constraint set
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `name = value`.
    ///
    /// Returns `false` and leaves the set untouched if `name` is already applied.
    pub fn apply(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value.into()));
        true
    }

    /// Whether a facet with this name has been applied
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Value applied for a facet
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Applied facet names in application order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Applied `(name, value)` pairs in application order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FacetConstraints {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut constraints = FacetConstraints::new();
        for (name, value) in iter {
            constraints.apply(name, value);
        }
        constraints
    }
}

impl Serialize for FacetConstraints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Which facet term lists the response should carry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FacetListing {
    /// No facet section
    #[default]
    None,
    /// Every facet available for the zone
    All,
    /// A single named facet
    Named(String),
}

/// Amount of detail returned per record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordLevel {
    #[default]
    Brief,
    Full,
}

impl RecordLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordLevel::Brief => "brief",
            RecordLevel::Full => "full",
        }
    }
}

impl fmt::Display for RecordLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search call against the API.
///
/// Narrowing loops mutate a single request in place between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Zones to search
    pub zones: Vec<Zone>,

    /// Free-text query
    pub query: String,

    /// Applied facet constraints
    pub facets: FacetConstraints,

    /// Number of records requested (0 means count only)
    pub window: u32,

    /// Facet term lists to include in the response
    pub facet_listing: FacetListing,

    /// Record detail level
    pub record_level: RecordLevel,

    /// Optional record sections to include (e.g. `links`)
    pub include: Vec<String>,
}

impl SearchRequest {
    /// Create a count-only request for the given zones and query
    pub fn new(zones: impl Into<Vec<Zone>>, query: impl Into<String>) -> Self {
        Self {
            zones: zones.into(),
            query: query.into(),
            facets: FacetConstraints::new(),
            window: 0,
            facet_listing: FacetListing::None,
            record_level: RecordLevel::default(),
            include: Vec::new(),
        }
    }

    /// Set the window size, capped at [`MAX_WINDOW`]
    pub fn window(mut self, window: u32) -> Self {
        self.window = window.min(MAX_WINDOW);
        self
    }

    /// Replace the applied facet constraints
    pub fn facets(mut self, facets: FacetConstraints) -> Self {
        self.facets = facets;
        self
    }

    /// Set which facet lists to request
    pub fn facet_listing(mut self, listing: FacetListing) -> Self {
        self.facet_listing = listing;
        self
    }

    /// Set the record detail level
    pub fn record_level(mut self, level: RecordLevel) -> Self {
        self.record_level = level;
        self
    }

    /// Set the record sections to include
    pub fn include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    /// Query parameters for this request, excluding the credential
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("zone".to_string(), join_zones(&self.zones)),
            ("encoding".to_string(), "json".to_string()),
            ("n".to_string(), self.window.to_string()),
            ("q".to_string(), self.query.clone()),
        ];

        for (name, value) in self.facets.iter() {
            params.push((format!("l-{}", name), value.to_string()));
        }

        match &self.facet_listing {
            FacetListing::None => {}
            FacetListing::All => params.push(("facet".to_string(), "all".to_string())),
            FacetListing::Named(name) => params.push(("facet".to_string(), name.clone())),
        }

        params.push(("reclevel".to_string(), self.record_level.to_string()));

        if !self.include.is_empty() {
            params.push(("include".to_string(), self.include.join(",")));
        }

        params
    }
}

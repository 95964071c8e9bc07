//! Trove result zones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A partition of the Trove corpus by record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Book,
    Article,
    Picture,
    Map,
    Music,
    Collection,
    Newspaper,
}

impl Zone {
    /// Every zone the API knows about
    pub const ALL: [Zone; 7] = [
        Zone::Book,
        Zone::Article,
        Zone::Picture,
        Zone::Map,
        Zone::Music,
        Zone::Collection,
        Zone::Newspaper,
    ];

    /// Zones narrowed with the dynamic facet catalog
    pub const FACETED: [Zone; 6] = [
        Zone::Book,
        Zone::Article,
        Zone::Picture,
        Zone::Map,
        Zone::Music,
        Zone::Collection,
    ];

    /// Name used in the `zone` request parameter and in responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Book => "book",
            Zone::Article => "article",
            Zone::Picture => "picture",
            Zone::Map => "map",
            Zone::Music => "music",
            Zone::Collection => "collection",
            Zone::Newspaper => "newspaper",
        }
    }

    /// Key under `records` that holds this zone's record list
    pub fn record_key(&self) -> &'static str {
        match self {
            Zone::Newspaper => "article",
            _ => "work",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a zone name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown zone: {0}")]
pub struct UnknownZone(pub String);

impl FromStr for Zone {
    type Err = UnknownZone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "book" => Ok(Zone::Book),
            "article" => Ok(Zone::Article),
            "picture" => Ok(Zone::Picture),
            "map" => Ok(Zone::Map),
            "music" => Ok(Zone::Music),
            "collection" => Ok(Zone::Collection),
            "newspaper" => Ok(Zone::Newspaper),
            other => Err(UnknownZone(other.to_string())),
        }
    }
}

/// Join zones the way the `zone` parameter expects them
pub fn join_zones(zones: &[Zone]) -> String {
    zones
        .iter()
        .map(Zone::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

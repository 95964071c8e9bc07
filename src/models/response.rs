//! Search response models.
//!
//! Only the paths the narrowing loops depend on are typed. Records and every
//! other field are kept as raw JSON and passed through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::zone::Zone;

/// Top-level API response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub response: ResponseBody,
}

/// Body of the response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    /// Query as echoed back by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// One entry per requested zone
    #[serde(default, deserialize_with = "one_or_many")]
    pub zone: Vec<ZoneResult>,
}

/// Results for a single zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneResult {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Records>,

    /// Raw facet section; parsed lazily by the facet extractor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<Value>,
}

/// The `records` block of a zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Records {
    /// Total number of matches; the API sends it as a number or a string
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: Option<u64>,

    /// Record lists and paging fields, keyed by record type
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

impl Records {
    /// Record list stored under `key`, falling back to the first array present
    pub fn items(&self, key: &str) -> &[Value] {
        match self.rest.get(key) {
            Some(Value::Array(items)) => return items,
            Some(single @ Value::Object(_)) => return std::slice::from_ref(single),
            _ => {}
        }
        self.rest
            .values()
            .find_map(|v| match v {
                Value::Array(items) => Some(items.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

impl ZoneResult {
    /// Zone this result belongs to, if the name is recognised
    pub fn zone(&self) -> Option<Zone> {
        self.name.parse().ok()
    }

    /// Total match count, if the response carried one
    pub fn total(&self) -> Option<u64> {
        self.records.as_ref().and_then(|r| r.total)
    }

    /// Records returned for this zone
    pub fn records(&self) -> &[Value] {
        let key = self.zone().map(|z| z.record_key()).unwrap_or("work");
        self.records.as_ref().map(|r| r.items(key)).unwrap_or(&[])
    }
}

impl SearchResponse {
    /// Results for the zone at `index`
    pub fn zone_at(&self, index: usize) -> Option<&ZoneResult> {
        self.response.zone.get(index)
    }

    /// Builder used by tests and the mock API
    pub fn with_zone(mut self, zone: Zone, total: u64, records: Vec<Value>) -> Self {
        let mut rest = serde_json::Map::new();
        if !records.is_empty() {
            rest.insert(zone.record_key().to_string(), Value::Array(records));
        }
        self.response.zone.push(ZoneResult {
            name: zone.as_str().to_string(),
            records: Some(Records {
                total: Some(total),
                rest,
            }),
            facets: None,
        });
        self
    }

    /// Attach a raw facet section to the most recently added zone
    pub fn with_facets(mut self, facets: Value) -> Self {
        if let Some(zone) = self.response.zone.last_mut() {
            zone.facets = Some(facets);
        }
        self
    }
}

/// A JSON value that may be a single item or an array of items
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(OneOrMany::deserialize(deserializer)?.into_vec())
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid total: {:?}", s))),
    }
}

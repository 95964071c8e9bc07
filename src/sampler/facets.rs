//! Flattening facet term trees into a catalog of selectable values.

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::{FacetConstraints, OneOrMany, SearchResponse};

/// Facet names never offered for narrowing besides the `adv*` family
const EXCLUDED_FACETS: &[&str] = &["decade"];

/// A node in a facet's term tree
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawTerm")]
pub enum TermNode {
    Leaf { search: String },
    Branch { search: String, children: Vec<TermNode> },
}

#[derive(Deserialize)]
struct RawTerm {
    search: String,
    #[serde(default)]
    term: Option<OneOrMany<TermNode>>,
}

impl From<RawTerm> for TermNode {
    fn from(raw: RawTerm) -> Self {
        let children = raw.term.map(OneOrMany::into_vec).unwrap_or_default();
        if children.is_empty() {
            TermNode::Leaf { search: raw.search }
        } else {
            TermNode::Branch {
                search: raw.search,
                children,
            }
        }
    }
}

impl TermNode {
    /// Value used when applying this term as a constraint
    pub fn search(&self) -> &str {
        match self {
            TermNode::Leaf { search } | TermNode::Branch { search, .. } => search,
        }
    }

    /// Pre-order walk: this node's value, then each child's subtree
    fn flatten_into(&self, out: &mut Vec<String>) {
        // explicit stack so deep trees cannot overflow
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node.search().to_string());
            if let TermNode::Branch { children, .. } = node {
                stack.extend(children.iter().rev());
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct FacetSection {
    #[serde(default)]
    facet: Option<OneOrMany<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawFacet {
    name: String,
    #[serde(default)]
    term: Option<OneOrMany<TermNode>>,
}

/// Whether a facet may ever be used for narrowing
pub fn is_selectable(name: &str) -> bool {
    !name.starts_with("adv") && !EXCLUDED_FACETS.contains(&name)
}

/// Facet name to flat list of term values, rebuilt from every response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetCatalog {
    facets: BTreeMap<String, Vec<String>>,
}

impl FacetCatalog {
    /// Drop every facet already present in `applied`
    pub fn without(mut self, applied: &FacetConstraints) -> Self {
        self.facets.retain(|name, _| !applied.contains(name));
        self
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.facets.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.facets.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.facets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Pick a facet uniformly, then one of its terms uniformly
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&str, &str)> {
        let (name, terms) = self.facets.iter().choose(rng)?;
        let term = terms.choose(rng)?;
        Some((name.as_str(), term.as_str()))
    }
}

impl FromIterator<(String, Vec<String>)> for FacetCatalog {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut facets = BTreeMap::new();
        for (name, terms) in iter {
            if is_selectable(&name) && !terms.is_empty() {
                facets.insert(name, terms);
            }
        }
        Self { facets }
    }
}

/// Flatten the facet section of the first zone in `response`.
///
/// A missing or unreadable facet section gives an empty catalog: no
/// narrowing is possible, which is not an error.
pub fn extract_facets(response: &SearchResponse) -> FacetCatalog {
    response
        .zone_at(0)
        .and_then(|zone| zone.facets.as_ref())
        .map(extract_from_section)
        .unwrap_or_default()
}

/// Flattened terms of the named facet in the first zone of `response`.
///
/// Unlike [`extract_facets`] this does not filter by name, so facets such as
/// `decade` can still be listed when a caller asks for them explicitly.
pub fn facet_terms(response: &SearchResponse, name: &str) -> Vec<String> {
    response
        .zone_at(0)
        .and_then(|zone| zone.facets.as_ref())
        .map(flatten_section)
        .unwrap_or_default()
        .into_iter()
        .find(|(facet, _)| facet == name)
        .map(|(_, terms)| terms)
        .unwrap_or_default()
}

fn extract_from_section(section: &Value) -> FacetCatalog {
    flatten_section(section).into_iter().collect()
}

fn flatten_section(section: &Value) -> Vec<(String, Vec<String>)> {
    let parsed = match FacetSection::deserialize(section) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("Unreadable facet section, treating as empty: {}", e);
            return Vec::new();
        }
    };

    // each facet is read on its own so one bad entry only drops itself
    parsed
        .facet
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| match RawFacet::deserialize(entry) {
            Ok(facet) => Some(facet),
            Err(e) => {
                tracing::debug!("Skipping unreadable facet entry: {}", e);
                None
            }
        })
        .map(|facet| {
            let mut values = Vec::new();
            for node in facet.term.map(OneOrMany::into_vec).unwrap_or_default() {
                node.flatten_into(&mut values);
            }
            (facet.name, values)
        })
        .collect()
}

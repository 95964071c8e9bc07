//! Data models for Trove search requests and responses.

mod response;
mod search;
mod zone;

pub use response::{Records, ResponseBody, SearchResponse, ZoneResult};
pub(crate) use response::OneOrMany;
pub use search::{FacetConstraints, FacetListing, RecordLevel, SearchRequest, MAX_WINDOW};
pub use zone::{join_zones, UnknownZone, Zone};

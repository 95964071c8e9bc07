//! Reading counts out of raw responses.

use super::SamplerError;
use crate::models::{SearchResponse, Zone};

/// Total match count for the zone at `zone_index`.
///
/// A missing zone or total is a malformed response: nothing downstream can
/// proceed without a count.
pub fn count(response: &SearchResponse, zone_index: usize) -> Result<u64, SamplerError> {
    let zone = response.zone_at(zone_index).ok_or_else(|| {
        SamplerError::MalformedResponse(format!("no zone at index {}", zone_index))
    })?;
    zone.total().ok_or_else(|| {
        SamplerError::MalformedResponse(format!("zone {} has no records.total", zone.name))
    })
}

/// Every recognised zone whose total is strictly positive, in response order
pub fn zones_with_results(response: &SearchResponse) -> Result<Vec<Zone>, SamplerError> {
    let mut zones = Vec::new();
    for (index, result) in response.response.zone.iter().enumerate() {
        let Some(zone) = result.zone() else {
            tracing::debug!("Ignoring unknown zone {:?}", result.name);
            continue;
        };
        if count(response, index)? > 0 {
            zones.push(zone);
        }
    }
    Ok(zones)
}

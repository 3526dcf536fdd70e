//! Fallback center selection for maps without a configured center.

#[cfg(test)]
#[path = "center_test.rs"]
mod center_test;

use crate::config::CenterStrategy;
use crate::geo::LngLat;

/// Neutral center used when there is nothing to derive one from.
pub const NULL_ISLAND: LngLat = LngLat { lng: 0.0, lat: 0.0 };

/// Derive a starting center from the valid pin positions.
///
/// With no pins this is [`NULL_ISLAND`]; the initial framing step is then
/// skipped too, so the configured zoom around (0, 0) stands.
#[must_use]
pub fn fallback_center(strategy: CenterStrategy, positions: &[LngLat]) -> LngLat {
    match strategy {
        CenterStrategy::First => positions.first().copied().unwrap_or(NULL_ISLAND),
        CenterStrategy::Mean => centroid(positions).unwrap_or(NULL_ISLAND),
    }
}

#[allow(clippy::cast_precision_loss)]
fn centroid(positions: &[LngLat]) -> Option<LngLat> {
    if positions.is_empty() {
        return None;
    }
    let (lng, lat) = positions.iter().fold((0.0, 0.0), |(lng, lat), p| (lng + p.lng, lat + p.lat));
    let n = positions.len() as f64;
    Some(LngLat::new(lng / n, lat / n))
}

/// The center the engine starts at: configured, else derived from pins.
#[must_use]
pub fn initial_center(configured: Option<LngLat>, strategy: CenterStrategy, positions: &[LngLat]) -> LngLat {
    configured.unwrap_or_else(|| fallback_center(strategy, positions))
}

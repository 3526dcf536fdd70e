//! Initial camera framing over the pins.

#[cfg(test)]
#[path = "fit_test.rs"]
mod fit_test;

use crate::config::MapConfig;
use crate::engine::MapEngine;
use crate::geo::LngLatBounds;

/// Frame `bounds` unless the map has an explicit center or no valid pins.
///
/// Returns whether the engine was asked to frame anything.
pub fn fit_viewport<E: MapEngine + ?Sized>(engine: &mut E, config: &MapConfig, bounds: Option<LngLatBounds>) -> bool {
    if config.center.is_some() {
        return false;
    }
    let Some(bounds) = bounds else {
        return false;
    };
    engine.fit_bounds(&bounds, config.fit_padding, config.fit_max_zoom);
    true
}

//! Marker rendering: one discrete engine marker per pin.
//!
//! Markers don't depend on the style being loaded, so they are placed as
//! soon as the map exists.

#[cfg(test)]
#[path = "marker_test.rs"]
mod marker_test;

use std::collections::BTreeMap;

use crate::config::{MapConfig, PopupMode};
use crate::consts::MARKER_ICON_WIDTH_PX;
use crate::engine::{MapEngine, MarkerIcon, MarkerId, MarkerSpec, NativePopup};
use crate::geo::LngLatBounds;
use crate::pin::PinRecord;

/// The engine-native popup for a pin, if it has any content.
#[must_use]
pub fn native_popup(pin: &PinRecord) -> Option<NativePopup> {
    let html = pin.popup.as_ref()?;
    Some(NativePopup { html: html.clone(), anchor: pin.anchor, offset: pin.offset })
}

/// Marker definition for a pin under the given popup mode.
#[must_use]
pub fn marker_spec(pin: &PinRecord, mode: PopupMode) -> MarkerSpec {
    MarkerSpec {
        position: pin.position,
        icon: pin.icon.as_ref().map(|url| MarkerIcon { url: url.clone(), width_px: MARKER_ICON_WIDTH_PX }),
        popup: match mode {
            PopupMode::Native => native_popup(pin),
            PopupMode::Custom => None,
        },
        report_clicks: mode == PopupMode::Custom && pin.has_popup(),
    }
}

/// Markers placed for one map, and the region they cover.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerMode {
    /// Marker → pin index, for markers whose clicks open a custom overlay.
    clickable: BTreeMap<MarkerId, usize>,
    bounds: Option<LngLatBounds>,
}

impl MarkerMode {
    /// Place every pin's marker.
    pub fn place<E: MapEngine + ?Sized>(engine: &mut E, pins: &[PinRecord], config: &MapConfig) -> Self {
        let mut mode = Self::default();
        for pin in pins {
            let spec = marker_spec(pin, config.popup_mode);
            let id = engine.add_marker(&spec);
            if spec.report_clicks {
                mode.clickable.insert(id, pin.index);
            }
            match mode.bounds.as_mut() {
                Some(bounds) => bounds.extend(pin.position),
                None => mode.bounds = Some(LngLatBounds::around(pin.position)),
            }
        }
        mode
    }

    /// Pin whose overlay a marker click should open.
    #[must_use]
    pub fn pin_for(&self, marker: MarkerId) -> Option<usize> {
        self.clickable.get(&marker).copied()
    }

    /// Bounds accumulated over every placed marker.
    #[must_use]
    pub fn bounds(&self) -> Option<LngLatBounds> {
        self.bounds
    }
}

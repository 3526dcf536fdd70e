//! Authored markup, captured as plain data.
//!
//! The browser shell copies what it needs out of the DOM into these
//! snapshots once, at start-up. Everything downstream reads typed values
//! from them and never touches the DOM directly.

#[cfg(test)]
#[path = "attrs_test.rs"]
mod attrs_test;

use std::collections::BTreeMap;

use crate::coords::{parse_coordinate_pair, parse_number, parse_offset_pair};
use crate::error::DataError;
use crate::geo::{LngLat, PixelOffset};

// ── Document root ───────────────────────────────────────────────

pub const DOC_TOKEN: &str = "data-mapbox-token";
pub const DOC_STYLE: &str = "data-mapbox-style";

// ── Map root ────────────────────────────────────────────────────

/// Marks an element as a map container.
pub const MAP_ROOT: &str = "data-mapbox";
pub const MAP_TOKEN: &str = "data-map-token";
pub const MAP_STYLE: &str = "data-map-style";
pub const MAP_CENTER: &str = "data-map-center";
pub const MAP_ZOOM: &str = "data-map-zoom";
pub const MAP_DEFAULTS: &str = "data-map-defaults";
pub const MAP_NAV: &str = "data-map-nav";
pub const MAP_CLUSTER: &str = "data-map-cluster";
pub const MAP_CLUSTER_RADIUS: &str = "data-map-cluster-radius";
pub const MAP_CLUSTER_MAX_ZOOM: &str = "data-map-cluster-max-zoom";
pub const MAP_CLUSTER_COLOR: &str = "data-map-cluster-color";
pub const MAP_CLUSTER_TEXT_COLOR: &str = "data-map-cluster-text-color";
pub const MAP_CLUSTER_TEXT_SIZE: &str = "data-map-cluster-text-size";
pub const MAP_POPUP: &str = "data-map-popup";
pub const MAP_POPUP_OFFSET: &str = "data-map-popup-offset";
pub const MAP_POPUP_Z_INDEX: &str = "data-map-popup-z-index";
pub const MAP_FIT_PADDING: &str = "data-map-fit-padding";
pub const MAP_MAX_FIT_ZOOM: &str = "data-map-max-fit-zoom";
pub const MAP_INITIAL_CENTER: &str = "data-map-initial-center";

/// Custom zoom buttons: `data-map-zoom="in"` / `data-map-zoom="out"`.
/// Shares its name with [`MAP_ZOOM`]; only descendants carry these values.
pub const ZOOM_BUTTON: &str = "data-map-zoom";

// ── Pins ────────────────────────────────────────────────────────

pub const PIN_LAT: &str = "data-pin-lat";
pub const PIN_LNG: &str = "data-pin-lng";
pub const PIN_ICON: &str = "data-pin-icon";
pub const PIN_POPUP_ALIGN: &str = "data-pin-popup-align";
pub const PIN_POPUP_OFFSET: &str = "data-pin-popup-offset";

/// Attribute name → value, exactly as authored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Non-empty trimmed text value.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Numeric value. Absent is `Ok(None)`; present but malformed is an error.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidNumber`] when the value is not a finite number.
    pub fn number(&self, name: &'static str) -> Result<Option<f64>, DataError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };
        parse_number(raw)
            .map(Some)
            .ok_or_else(|| DataError::InvalidNumber { attribute: name, value: raw.to_owned() })
    }

    /// Authored `"lat,lng"` pair in engine order.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidPair`] when the value is present but malformed.
    pub fn coordinate(&self, name: &'static str) -> Result<Option<LngLat>, DataError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };
        parse_coordinate_pair(raw)
            .map(Some)
            .ok_or_else(|| DataError::InvalidPair { attribute: name, value: raw.to_owned() })
    }

    /// Authored `"x,y"` pixel offset.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidPair`] when the value is present but malformed.
    pub fn offset(&self, name: &'static str) -> Result<Option<PixelOffset>, DataError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };
        parse_offset_pair(raw)
            .map(Some)
            .ok_or_else(|| DataError::InvalidPair { attribute: name, value: raw.to_owned() })
    }

    /// Presence flag. `"false"` and `"0"` switch it off explicitly.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<bool> {
        let raw = self.get(name)?.trim();
        Some(!(raw.eq_ignore_ascii_case("false") || raw == "0"))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One pin element: its attributes and its authored inner markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinElement {
    pub attributes: Attributes,
    pub inner_html: String,
}

/// One map root element and everything inside it that the widget reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapElement {
    pub attributes: Attributes,
    /// Descendants carrying both [`PIN_LAT`] and [`PIN_LNG`], in document order.
    pub pins: Vec<PinElement>,
    pub zoom_in_buttons: usize,
    pub zoom_out_buttons: usize,
}

impl MapElement {
    /// Whether the author supplied their own zoom buttons.
    #[must_use]
    pub fn has_custom_zoom_buttons(&self) -> bool {
        self.zoom_in_buttons > 0 || self.zoom_out_buttons > 0
    }
}

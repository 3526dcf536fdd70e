//! Pin ingestion: authored pin elements to validated records.
//!
//! Latitude and longitude come from two separate attributes and are
//! validated independently. A pin with either missing or non-numeric is
//! left out of rendering, but its siblings are unaffected and keep their
//! document-order index.

#[cfg(test)]
#[path = "pin_test.rs"]
mod pin_test;

use std::fmt;
use std::str::FromStr;

use crate::attrs::{self, Attributes, PinElement};
use crate::config::MapConfig;
use crate::error::DataError;
use crate::geo::{LngLat, PixelOffset};

/// Which edge or corner of a popup touches its geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 8] = [
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Engine keyword, e.g. `"top-left"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == key)
            .ok_or(DataError::UnknownAnchor(key))
    }
}

/// A validated pin.
#[derive(Debug, Clone, PartialEq)]
pub struct PinRecord {
    /// Position among all pin elements of the map, valid or not.
    pub index: usize,
    pub position: LngLat,
    pub icon: Option<String>,
    /// Authored inner markup, trimmed. `None` means the pin has no popup.
    pub popup: Option<String>,
    pub anchor: Anchor,
    pub offset: PixelOffset,
}

impl PinRecord {
    #[must_use]
    pub fn has_popup(&self) -> bool {
        self.popup.is_some()
    }
}

/// Validate one pin element.
///
/// # Errors
///
/// Returns a [`DataError`] when latitude or longitude is missing or not a
/// finite number. Malformed optional attributes (anchor, offset) fall back
/// to their defaults instead.
pub fn parse_pin(index: usize, el: &PinElement, defaults: &MapConfig) -> Result<PinRecord, DataError> {
    let a = &el.attributes;
    let lat = required_number(a, attrs::PIN_LAT)?;
    let lng = required_number(a, attrs::PIN_LNG)?;

    let anchor = match a.text(attrs::PIN_POPUP_ALIGN).map(str::parse::<Anchor>).transpose() {
        Ok(anchor) => anchor.unwrap_or_default(),
        Err(e) => {
            log::warn!("mapmark: pin {index}: {e}; using bottom");
            Anchor::default()
        }
    };
    let offset = match a.offset(attrs::PIN_POPUP_OFFSET) {
        Ok(offset) => offset.unwrap_or(defaults.popup_offset),
        Err(e) => {
            log::warn!("mapmark: pin {index}: {e}; using default offset");
            defaults.popup_offset
        }
    };

    let body = el.inner_html.trim();
    Ok(PinRecord {
        index,
        position: LngLat::new(lng, lat),
        icon: a.text(attrs::PIN_ICON).map(str::to_owned),
        popup: (!body.is_empty()).then(|| body.to_owned()),
        anchor,
        offset,
    })
}

fn required_number(a: &Attributes, name: &'static str) -> Result<f64, DataError> {
    a.number(name)?.ok_or_else(|| DataError::InvalidNumber {
        attribute: name,
        value: a.get(name).unwrap_or_default().to_owned(),
    })
}

/// Validate every pin element, dropping the invalid ones.
#[must_use]
pub fn ingest(pins: &[PinElement], config: &MapConfig) -> Vec<PinRecord> {
    pins.iter()
        .enumerate()
        .filter_map(|(index, el)| match parse_pin(index, el, config) {
            Ok(pin) => Some(pin),
            Err(e) => {
                log::warn!("mapmark: skipping pin {index}: {e}");
                None
            }
        })
        .collect()
}

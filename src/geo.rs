//! Geographic and screen-space value types.
//!
//! The engine convention is longitude first, so [`LngLat`] stores and
//! serializes `[lng, lat]`. Authored text is latitude first; conversion
//! happens once, in [`crate::coords`].

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use serde::{Deserialize, Serialize};

/// A geographic coordinate in engine order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// A point in screen space (CSS pixels, relative to the map container).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A pixel offset applied after anchoring a popup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelOffset {
    pub x: f64,
    pub y: f64,
}

impl PixelOffset {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for PixelOffset {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLatBounds {
    pub sw: LngLat,
    pub ne: LngLat,
}

impl LngLatBounds {
    /// A degenerate box around one point.
    #[must_use]
    pub fn around(p: LngLat) -> Self {
        Self { sw: p, ne: p }
    }

    /// Grow the box to include `p`.
    pub fn extend(&mut self, p: LngLat) {
        self.sw.lng = self.sw.lng.min(p.lng);
        self.sw.lat = self.sw.lat.min(p.lat);
        self.ne.lng = self.ne.lng.max(p.lng);
        self.ne.lat = self.ne.lat.max(p.lat);
    }

    /// The smallest box containing every point, or `None` for no points.
    pub fn from_points<I: IntoIterator<Item = LngLat>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut bounds = Self::around(iter.next()?);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    /// `[[west, south], [east, north]]`, the engine's array form.
    #[must_use]
    pub fn to_array(&self) -> [[f64; 2]; 2] {
        [self.sw.into(), self.ne.into()]
    }
}

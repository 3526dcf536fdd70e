//! Layered map configuration.
//!
//! A [`MapConfig`] starts from library defaults and is overridden by a
//! sequence of [`ConfigLayer`]s, later layers winning field by field:
//!
//! 1. document-root attributes (`data-mapbox-token`, `data-mapbox-style`)
//! 2. the global access-token variable
//! 3. the page-wide override object
//! 4. the per-map `data-map-defaults` JSON blob
//! 5. per-map scalar attributes
//!
//! Layers 1–3 are folded once into a [`PageSnapshot`] at start-up. Each
//! map then resolves layers 4–5 on top of that snapshot. A field left
//! unset in a layer never erases what an earlier layer set.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::attrs::{self, Attributes};
use crate::consts::{
    DEFAULT_CLUSTER_COLOR, DEFAULT_CLUSTER_MAX_ZOOM, DEFAULT_CLUSTER_RADIUS, DEFAULT_CLUSTER_TEXT_COLOR,
    DEFAULT_CLUSTER_TEXT_SIZE, DEFAULT_FIT_MAX_ZOOM, DEFAULT_FIT_PADDING, DEFAULT_POPUP_OFFSET,
    DEFAULT_POPUP_Z_INDEX, DEFAULT_STYLE, DEFAULT_ZOOM,
};
use crate::coords::{parse_coordinate_pair, parse_number, parse_offset_pair};
use crate::error::{ConfigError, DataError};
use crate::geo::{LngLat, PixelOffset};

/// How to pick a starting center when none is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CenterStrategy {
    /// The first valid pin.
    #[default]
    First,
    /// The arithmetic mean of all valid pins.
    Mean,
}

impl FromStr for CenterStrategy {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "mean" | "centroid" => Ok(Self::Mean),
            other => Err(DataError::UnknownStrategy(other.to_owned())),
        }
    }
}

/// Which popup implementation pins use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupMode {
    /// The engine's built-in popup.
    #[default]
    Native,
    /// A DOM overlay cloned from the pin's authored markup.
    Custom,
}

impl FromStr for PopupMode {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "custom" | "overlay" => Ok(Self::Custom),
            other => Err(DataError::UnknownPopupMode(other.to_owned())),
        }
    }
}

/// Cluster source and paint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOptions {
    pub enabled: bool,
    /// Cluster radius in pixels.
    pub radius: u32,
    /// Zoom above which points are never clustered.
    pub max_zoom: f64,
    pub color: String,
    pub text_color: String,
    pub text_size: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: DEFAULT_CLUSTER_RADIUS,
            max_zoom: DEFAULT_CLUSTER_MAX_ZOOM,
            color: DEFAULT_CLUSTER_COLOR.to_owned(),
            text_color: DEFAULT_CLUSTER_TEXT_COLOR.to_owned(),
            text_size: DEFAULT_CLUSTER_TEXT_SIZE,
        }
    }
}

/// Effective configuration of one map instance. Immutable once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub token: String,
    pub style: String,
    pub zoom: f64,
    /// Explicit starting center. When set, the initial view is never refit.
    pub center: Option<LngLat>,
    pub fit_padding: f64,
    pub fit_max_zoom: f64,
    pub initial_center: CenterStrategy,
    pub popup_mode: PopupMode,
    pub popup_offset: PixelOffset,
    pub popup_z_index: i32,
    pub cooperative_gestures: bool,
    pub cluster: ClusterOptions,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            style: DEFAULT_STYLE.to_owned(),
            zoom: DEFAULT_ZOOM,
            center: None,
            fit_padding: DEFAULT_FIT_PADDING,
            fit_max_zoom: DEFAULT_FIT_MAX_ZOOM,
            initial_center: CenterStrategy::default(),
            popup_mode: PopupMode::default(),
            popup_offset: DEFAULT_POPUP_OFFSET.into(),
            popup_z_index: DEFAULT_POPUP_Z_INDEX,
            cooperative_gestures: true,
            cluster: ClusterOptions::default(),
        }
    }
}

impl MapConfig {
    /// Overwrite every field the layer sets.
    pub fn apply(&mut self, layer: &ConfigLayer) {
        if let Some(ref v) = layer.token {
            self.token.clone_from(v);
        }
        if let Some(ref v) = layer.style {
            self.style.clone_from(v);
        }
        if let Some(v) = layer.zoom {
            self.zoom = v;
        }
        if let Some(v) = layer.center {
            self.center = Some(v);
        }
        if let Some(v) = layer.fit_bounds_padding {
            self.fit_padding = v;
        }
        if let Some(v) = layer.fit_bounds_max_zoom {
            self.fit_max_zoom = v;
        }
        if let Some(v) = layer.initial_center {
            self.initial_center = v;
        }
        if let Some(v) = layer.popup_mode {
            self.popup_mode = v;
        }
        if let Some(v) = layer.popup_offset {
            self.popup_offset = v;
        }
        if let Some(v) = layer.popup_z_index {
            self.popup_z_index = v;
        }
        if let Some(v) = layer.cooperative_gestures {
            self.cooperative_gestures = v;
        }
        if let Some(v) = layer.cluster {
            self.cluster.enabled = v;
        }
        if let Some(v) = layer.cluster_radius {
            self.cluster.radius = v;
        }
        if let Some(v) = layer.cluster_max_zoom {
            self.cluster.max_zoom = v;
        }
        if let Some(ref v) = layer.cluster_color {
            self.cluster.color.clone_from(v);
        }
        if let Some(ref v) = layer.cluster_text_color {
            self.cluster.text_color.clone_from(v);
        }
        if let Some(v) = layer.cluster_text_size {
            self.cluster.text_size = v;
        }
    }

    /// Check the fields without which the engine cannot start.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] when no layer supplied a token.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }
}

/// Sparse configuration. Only present fields override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLayer {
    pub token: Option<String>,
    pub style: Option<String>,
    pub zoom: Option<f64>,
    pub center: Option<LngLat>,
    pub fit_bounds_padding: Option<f64>,
    pub fit_bounds_max_zoom: Option<f64>,
    pub initial_center: Option<CenterStrategy>,
    pub popup_mode: Option<PopupMode>,
    pub popup_offset: Option<PixelOffset>,
    pub popup_z_index: Option<i32>,
    pub cooperative_gestures: Option<bool>,
    pub cluster: Option<bool>,
    pub cluster_radius: Option<u32>,
    pub cluster_max_zoom: Option<f64>,
    pub cluster_color: Option<String>,
    pub cluster_text_color: Option<String>,
    pub cluster_text_size: Option<f64>,
}

/// A recognized key of a JSON override object and its value.
type Entry<'a> = (&'static str, &'a Value);

/// `null` counts as absent.
fn entry<'a>(object: &'a Map<String, Value>, key: &'static str) -> Option<Entry<'a>> {
    object.get(key).filter(|v| !v.is_null()).map(|v| (key, v))
}

fn json_text((key, value): Entry<'_>) -> Result<String, DataError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(DataError::InvalidText { attribute: key, value: other.to_string() }),
    }
}

/// A JSON number, or a string holding one.
fn json_number((key, value): Entry<'_>) -> Result<f64, DataError> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    };
    n.ok_or_else(|| DataError::InvalidNumber { attribute: key, value: value.to_string() })
}

/// Booleans as-is; strings and numbers follow the attribute flag rules.
fn json_bool((key, value): Entry<'_>) -> Result<bool, DataError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => {
            let s = s.trim();
            Ok(!(s.is_empty() || s.eq_ignore_ascii_case("false") || s == "0"))
        }
        Value::Number(n) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
        other => Err(DataError::InvalidText { attribute: key, value: other.to_string() }),
    }
}

/// `"a,b"` text via `parse`, or a two-number array taken as-is.
fn json_pair<T>(
    (key, value): Entry<'_>,
    parse: fn(&str) -> Option<T>,
    from: fn(f64, f64) -> T,
) -> Result<T, DataError> {
    let parsed = match value {
        Value::String(s) => parse(s),
        Value::Array(items) => match items.as_slice() {
            [a, b] => a.as_f64().zip(b.as_f64()).map(|(a, b)| from(a, b)),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| DataError::InvalidPair { attribute: key, value: value.to_string() })
}

impl ConfigLayer {
    /// Parse a JSON override object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverrides`] when the text is not a JSON
    /// object. Recognized keys with unusable values are logged and skipped.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let object: Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self::from_object(&object))
    }

    /// Lift the recognized camelCase keys of an override object, one key at
    /// a time. Unknown keys are ignored.
    #[must_use]
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let text = |key| lenient(entry(object, key).map(json_text).transpose());
        let number = |key| lenient(entry(object, key).map(json_number).transpose());
        Self {
            token: text("token"),
            style: text("style"),
            zoom: number("zoom"),
            center: lenient(
                entry(object, "center").map(|e| json_pair(e, parse_coordinate_pair, LngLat::new)).transpose(),
            ),
            fit_bounds_padding: number("fitBoundsPadding"),
            fit_bounds_max_zoom: number("fitBoundsMaxZoom").or_else(|| number("maxFitZoom")),
            initial_center: lenient(
                entry(object, "initialCenter").map(|e| json_text(e).and_then(|s| s.parse())).transpose(),
            ),
            popup_mode: lenient(entry(object, "popupMode").map(|e| json_text(e).and_then(|s| s.parse())).transpose()),
            popup_offset: lenient(
                entry(object, "popupOffset").map(|e| json_pair(e, parse_offset_pair, PixelOffset::new)).transpose(),
            ),
            popup_z_index: number("popupZIndex").map(round_i32),
            cooperative_gestures: lenient(entry(object, "cooperativeGestures").map(json_bool).transpose()),
            cluster: lenient(entry(object, "cluster").map(json_bool).transpose()),
            cluster_radius: number("clusterRadius").map(round_u32),
            cluster_max_zoom: number("clusterMaxZoom"),
            cluster_color: text("clusterColor"),
            cluster_text_color: text("clusterTextColor"),
            cluster_text_size: number("clusterTextSize"),
        }
    }

    /// Parse a JSON override object, degrading to an empty layer on failure.
    #[must_use]
    pub fn from_json_lenient(text: Option<&str>, source: &str) -> Self {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self::default();
        };
        match Self::from_json(text) {
            Ok(layer) => layer,
            Err(e) => {
                log::warn!("mapmark: {source}: {e}; ignoring");
                Self::default()
            }
        }
    }

    /// Page-level settings read from the document root.
    #[must_use]
    pub fn from_document(attributes: &Attributes) -> Self {
        Self {
            token: attributes.text(attrs::DOC_TOKEN).map(str::to_owned),
            style: attributes.text(attrs::DOC_STYLE).map(str::to_owned),
            ..Self::default()
        }
    }

    /// Scalar overrides read from a map root. Malformed values are logged and skipped.
    #[must_use]
    pub fn from_map_attributes(a: &Attributes) -> Self {
        Self {
            token: a.text(attrs::MAP_TOKEN).map(str::to_owned),
            style: a.text(attrs::MAP_STYLE).map(str::to_owned),
            zoom: lenient(a.number(attrs::MAP_ZOOM)),
            center: lenient(a.coordinate(attrs::MAP_CENTER)),
            fit_bounds_padding: lenient(a.number(attrs::MAP_FIT_PADDING)),
            fit_bounds_max_zoom: lenient(a.number(attrs::MAP_MAX_FIT_ZOOM)),
            initial_center: lenient(a.text(attrs::MAP_INITIAL_CENTER).map(str::parse).transpose()),
            popup_mode: lenient(a.text(attrs::MAP_POPUP).map(str::parse).transpose()),
            popup_offset: lenient(a.offset(attrs::MAP_POPUP_OFFSET)),
            popup_z_index: lenient(a.number(attrs::MAP_POPUP_Z_INDEX)).map(round_i32),
            cooperative_gestures: None,
            cluster: a.flag(attrs::MAP_CLUSTER),
            cluster_radius: lenient(a.number(attrs::MAP_CLUSTER_RADIUS)).map(round_u32),
            cluster_max_zoom: lenient(a.number(attrs::MAP_CLUSTER_MAX_ZOOM)),
            cluster_color: a.text(attrs::MAP_CLUSTER_COLOR).map(str::to_owned),
            cluster_text_color: a.text(attrs::MAP_CLUSTER_TEXT_COLOR).map(str::to_owned),
            cluster_text_size: lenient(a.number(attrs::MAP_CLUSTER_TEXT_SIZE)),
        }
    }

    /// Combine two layers; `later` wins wherever it sets a field.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        Self {
            token: later.token.or(self.token),
            style: later.style.or(self.style),
            zoom: later.zoom.or(self.zoom),
            center: later.center.or(self.center),
            fit_bounds_padding: later.fit_bounds_padding.or(self.fit_bounds_padding),
            fit_bounds_max_zoom: later.fit_bounds_max_zoom.or(self.fit_bounds_max_zoom),
            initial_center: later.initial_center.or(self.initial_center),
            popup_mode: later.popup_mode.or(self.popup_mode),
            popup_offset: later.popup_offset.or(self.popup_offset),
            popup_z_index: later.popup_z_index.or(self.popup_z_index),
            cooperative_gestures: later.cooperative_gestures.or(self.cooperative_gestures),
            cluster: later.cluster.or(self.cluster),
            cluster_radius: later.cluster_radius.or(self.cluster_radius),
            cluster_max_zoom: later.cluster_max_zoom.or(self.cluster_max_zoom),
            cluster_color: later.cluster_color.or(self.cluster_color),
            cluster_text_color: later.cluster_text_color.or(self.cluster_text_color),
            cluster_text_size: later.cluster_text_size.or(self.cluster_text_size),
        }
    }
}

fn lenient<T>(value: Result<Option<T>, DataError>) -> Option<T> {
    match value {
        Ok(v) => v,
        Err(e) => {
            log::warn!("mapmark: {e}; ignoring");
            None
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_i32(v: f64) -> i32 {
    v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_u32(v: f64) -> u32 {
    v.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Fold layers, in order, over the library defaults.
#[must_use]
pub fn resolve<'a, I: IntoIterator<Item = &'a ConfigLayer>>(base: &MapConfig, layers: I) -> MapConfig {
    let mut config = base.clone();
    for layer in layers {
        config.apply(layer);
    }
    config
}

/// Page-wide defaults, captured once before any map is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSnapshot {
    defaults: MapConfig,
}

impl PageSnapshot {
    /// Fold the page-level layers over the library defaults.
    ///
    /// `global_token` is the page's access-token variable; `global_overrides`
    /// is the page-wide override object serialized as JSON.
    #[must_use]
    pub fn capture(document: &Attributes, global_token: Option<&str>, global_overrides: Option<&str>) -> Self {
        let document = ConfigLayer::from_document(document);
        let token = ConfigLayer {
            token: global_token.map(str::trim).filter(|t| !t.is_empty()).map(str::to_owned),
            ..ConfigLayer::default()
        };
        let overrides = ConfigLayer::from_json_lenient(global_overrides, "page defaults");
        Self { defaults: resolve(&MapConfig::default(), [&document, &token, &overrides]) }
    }

    #[must_use]
    pub fn defaults(&self) -> &MapConfig {
        &self.defaults
    }

    /// Resolve one map root's configuration on top of the page defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] when no layer supplied a token.
    pub fn resolve(&self, map_attributes: &Attributes) -> Result<MapConfig, ConfigError> {
        let blob = ConfigLayer::from_json_lenient(map_attributes.get(attrs::MAP_DEFAULTS), attrs::MAP_DEFAULTS);
        let scalars = ConfigLayer::from_map_attributes(map_attributes);
        let config = resolve(&self.defaults, [&blob, &scalars]);
        config.validate()?;
        Ok(config)
    }
}

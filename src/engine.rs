//! Contract with the mapping engine.
//!
//! The widget never draws anything itself. It drives an engine through
//! [`MapEngine`] and receives everything asynchronous back as a
//! [`MapEvent`]: style readiness, icon loads, clicks, cluster-expansion
//! answers, camera movement, and DOM controls. The browser shell
//! implements the trait over the page's engine; tests use a recording fake.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::Deserialize;

use crate::error::ResourceError;
use crate::geo::{LngLat, LngLatBounds, PixelOffset, Point};
use crate::pin::Anchor;

/// Construction options for one engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub token: String,
    pub style: String,
    pub center: LngLat,
    pub zoom: f64,
    /// Require a modifier key to scroll-zoom and two fingers to pan.
    pub cooperative_gestures: bool,
}

/// Handle to a marker placed by [`MapEngine::add_marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub usize);

/// Handle to a view-change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Image that replaces the default marker graphic.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    pub url: String,
    pub width_px: f64,
}

/// An engine-native popup.
#[derive(Debug, Clone, PartialEq)]
pub struct NativePopup {
    pub html: String,
    pub anchor: Anchor,
    pub offset: PixelOffset,
}

/// One discrete marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LngLat,
    pub icon: Option<MarkerIcon>,
    /// Popup the engine opens by itself on click.
    pub popup: Option<NativePopup>,
    /// Report clicks back as [`MapEvent::MarkerClicked`].
    pub report_clicks: bool,
}

/// The fallback point icon, drawn rather than fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct DotImage {
    pub size_px: u32,
    pub radius_px: f64,
    pub color: String,
    pub pixel_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct FeatureGeometry {
    coordinates: LngLat,
}

/// A rendered feature under a click, as the engine reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClickedFeature {
    geometry: FeatureGeometry,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl ClickedFeature {
    #[must_use]
    pub fn new(coordinates: LngLat, properties: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { geometry: FeatureGeometry { coordinates }, properties }
    }

    #[must_use]
    pub fn coordinates(&self) -> LngLat {
        self.geometry.coordinates
    }

    /// Engine-assigned cluster id, present only on cluster features.
    #[must_use]
    pub fn cluster_id(&self) -> Option<u64> {
        self.properties.get("cluster_id").and_then(serde_json::Value::as_u64)
    }

    #[must_use]
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Everything that reaches a map instance after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The style finished loading; sources and layers may now be added.
    StyleLoaded,
    /// An icon requested with [`MapEngine::load_image`] finished, either way.
    IconSettled { url: String, result: Result<(), ResourceError> },
    /// A click landed on a layer registered with [`MapEngine::listen_layer_clicks`].
    LayerClicked { layer: String, feature: ClickedFeature },
    MarkerClicked(MarkerId),
    /// Answer to [`MapEngine::request_expansion_zoom`].
    ExpansionZoom { cluster_id: u64, center: LngLat, result: Result<f64, ResourceError> },
    /// The camera moved; fired every frame while a subscription is live.
    ViewChanged(SubscriptionId),
    /// The open overlay's close button was activated.
    OverlayClosed,
    /// A custom zoom button was activated.
    Zoom(ZoomDirection),
}

/// Operations the widget needs from a mapping engine.
pub trait MapEngine {
    /// Zoom around the pointer rather than the view center.
    fn enable_scroll_zoom(&mut self);

    /// Attach the engine's own zoom control (no compass).
    fn add_navigation_control(&mut self);

    fn zoom_in(&mut self);

    fn zoom_out(&mut self);

    fn add_marker(&mut self, marker: &MarkerSpec) -> MarkerId;

    /// Open an engine-native popup at `at`.
    fn show_popup(&mut self, at: LngLat, popup: &NativePopup);

    /// Register a source. Only valid after [`MapEvent::StyleLoaded`].
    fn add_source(&mut self, id: &str, source: &serde_json::Value);

    /// Register a style layer. Only valid after [`MapEvent::StyleLoaded`].
    fn add_layer(&mut self, layer: &serde_json::Value);

    fn has_image(&self, name: &str) -> bool;

    fn add_dot_image(&mut self, name: &str, dot: &DotImage);

    /// Fetch `url` and register it as `name`. Completion arrives as
    /// [`MapEvent::IconSettled`] carrying the same `url`.
    fn load_image(&mut self, url: &str, name: &str);

    /// Report clicks on `layer_id` as [`MapEvent::LayerClicked`].
    fn listen_layer_clicks(&mut self, layer_id: &str);

    /// Ask for the zoom at which `cluster_id` splits apart. The answer
    /// arrives as [`MapEvent::ExpansionZoom`] carrying `center` back.
    fn request_expansion_zoom(&mut self, source_id: &str, cluster_id: u64, center: LngLat);

    fn ease_to(&mut self, center: LngLat, zoom: f64);

    fn fit_bounds(&mut self, bounds: &LngLatBounds, padding: f64, max_zoom: f64);

    /// Current screen position of a coordinate, relative to the container.
    fn project(&self, at: LngLat) -> Point;

    /// Start reporting camera movement as [`MapEvent::ViewChanged`].
    fn subscribe_view_changes(&mut self) -> SubscriptionId;

    fn unsubscribe_view_changes(&mut self, id: SubscriptionId);
}

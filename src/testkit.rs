//! Recording fakes for the engine and overlay DOM seams.

use std::collections::{BTreeMap, BTreeSet};

use crate::engine::{DotImage, MapEngine, MarkerId, MarkerSpec, NativePopup, SubscriptionId};
use crate::geo::{LngLat, LngLatBounds, Point};
use crate::overlay::OverlayDom;
use crate::pin::PinRecord;

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ScrollZoom,
    NavigationControl,
    ZoomIn,
    ZoomOut,
    Marker(MarkerSpec),
    Popup { at: LngLat, popup: NativePopup },
    Source { id: String, source: serde_json::Value },
    Layer(serde_json::Value),
    DotImage { name: String, dot: DotImage },
    LoadImage { url: String, name: String },
    ListenLayer(String),
    ExpansionZoom { source: String, cluster_id: u64, center: LngLat },
    EaseTo { center: LngLat, zoom: f64 },
    FitBounds { bounds: LngLatBounds, padding: f64, max_zoom: f64 },
    Subscribe(SubscriptionId),
    Unsubscribe(SubscriptionId),
}

/// Engine fake with a linear projection: `x = lng * scale + pan.x`, `y = -lat * scale + pan.y`.
pub struct FakeEngine {
    pub calls: Vec<Call>,
    pub pan: Point,
    pub scale: f64,
    images: BTreeSet<String>,
    live: BTreeSet<SubscriptionId>,
    next_marker: usize,
    next_subscription: u64,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            pan: Point::new(0.0, 0.0),
            scale: 10.0,
            images: BTreeSet::new(),
            live: BTreeSet::new(),
            next_marker: 0,
            next_subscription: 0,
        }
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn layers(&self) -> Vec<&serde_json::Value> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Layer(layer) => Some(layer),
                _ => None,
            })
            .collect()
    }

    pub fn layer_ids(&self) -> Vec<String> {
        self.layers()
            .into_iter()
            .filter_map(|l| l.get("id").and_then(serde_json::Value::as_str).map(str::to_owned))
            .collect()
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Source { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Image names requested through `load_image`, in call order.
    pub fn loaded_images(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::LoadImage { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn markers(&self) -> Vec<&MarkerSpec> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Marker(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn fits(&self) -> Vec<(LngLatBounds, f64, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::FitBounds { bounds, padding, max_zoom } => Some((*bounds, *padding, *max_zoom)),
                _ => None,
            })
            .collect()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.live.len()
    }

    pub fn register_image(&mut self, name: &str) {
        self.images.insert(name.to_owned());
    }
}

impl MapEngine for FakeEngine {
    fn enable_scroll_zoom(&mut self) {
        self.calls.push(Call::ScrollZoom);
    }

    fn add_navigation_control(&mut self) {
        self.calls.push(Call::NavigationControl);
    }

    fn zoom_in(&mut self) {
        self.calls.push(Call::ZoomIn);
    }

    fn zoom_out(&mut self) {
        self.calls.push(Call::ZoomOut);
    }

    fn add_marker(&mut self, marker: &MarkerSpec) -> MarkerId {
        self.calls.push(Call::Marker(marker.clone()));
        self.next_marker += 1;
        MarkerId(self.next_marker - 1)
    }

    fn show_popup(&mut self, at: LngLat, popup: &NativePopup) {
        self.calls.push(Call::Popup { at, popup: popup.clone() });
    }

    fn add_source(&mut self, id: &str, source: &serde_json::Value) {
        self.calls.push(Call::Source { id: id.to_owned(), source: source.clone() });
    }

    fn add_layer(&mut self, layer: &serde_json::Value) {
        self.calls.push(Call::Layer(layer.clone()));
    }

    fn has_image(&self, name: &str) -> bool {
        self.images.contains(name)
    }

    fn add_dot_image(&mut self, name: &str, dot: &DotImage) {
        self.images.insert(name.to_owned());
        self.calls.push(Call::DotImage { name: name.to_owned(), dot: dot.clone() });
    }

    fn load_image(&mut self, url: &str, name: &str) {
        self.calls.push(Call::LoadImage { url: url.to_owned(), name: name.to_owned() });
    }

    fn listen_layer_clicks(&mut self, layer_id: &str) {
        self.calls.push(Call::ListenLayer(layer_id.to_owned()));
    }

    fn request_expansion_zoom(&mut self, source_id: &str, cluster_id: u64, center: LngLat) {
        self.calls.push(Call::ExpansionZoom { source: source_id.to_owned(), cluster_id, center });
    }

    fn ease_to(&mut self, center: LngLat, zoom: f64) {
        self.calls.push(Call::EaseTo { center, zoom });
    }

    fn fit_bounds(&mut self, bounds: &LngLatBounds, padding: f64, max_zoom: f64) {
        self.calls.push(Call::FitBounds { bounds: *bounds, padding, max_zoom });
    }

    fn project(&self, at: LngLat) -> Point {
        Point::new(at.lng * self.scale + self.pan.x, -at.lat * self.scale + self.pan.y)
    }

    fn subscribe_view_changes(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.live.insert(id);
        self.calls.push(Call::Subscribe(id));
        id
    }

    fn unsubscribe_view_changes(&mut self, id: SubscriptionId) {
        self.live.remove(&id);
        self.calls.push(Call::Unsubscribe(id));
    }
}

/// A node the fake DOM has mounted.
#[derive(Debug, Clone, PartialEq)]
pub struct Mounted {
    pub pin_index: usize,
    pub class: String,
    pub z_index: i32,
    pub at: Option<Point>,
    pub transform: String,
}

/// Overlay DOM fake. Nodes are plain integers.
#[derive(Default)]
pub struct FakeDom {
    pub nodes: BTreeMap<usize, Mounted>,
    pub unmounts: usize,
    next: usize,
}

impl FakeDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(&self, class: &str) -> Vec<&Mounted> {
        self.nodes.values().filter(|m| m.class == class).collect()
    }
}

impl OverlayDom for FakeDom {
    type Node = usize;

    fn remove_all(&mut self, class: &str) {
        self.nodes.retain(|_, m| m.class != class);
    }

    fn mount(&mut self, pin: &PinRecord, class: &str, z_index: i32) -> usize {
        let id = self.next;
        self.next += 1;
        self.nodes.insert(
            id,
            Mounted { pin_index: pin.index, class: class.to_owned(), z_index, at: None, transform: String::new() },
        );
        id
    }

    fn place(&mut self, node: &usize, at: Point, transform: &str) {
        if let Some(m) = self.nodes.get_mut(node) {
            m.at = Some(at);
            transform.clone_into(&mut m.transform);
        }
    }

    fn unmount(&mut self, node: &usize) {
        if self.nodes.remove(node).is_some() {
            self.unmounts += 1;
        }
    }
}

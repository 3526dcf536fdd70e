//! Cluster rendering: one clustered point source and three layers per map.
//!
//! Sources and layers can only be registered once the style has loaded,
//! so this mode is a small state machine:
//!
//! ```text
//! Unloaded --StyleLoaded--> AwaitingIcons --last IconSettled--> Ready
//!     \__________________(no custom icons)__________________/
//! ```
//!
//! On `StyleLoaded` the source, the cluster circles and the count labels
//! go in, and every distinct custom icon starts loading. The unclustered
//! point layer and both click listeners wait until every icon has settled,
//! successfully or not. A failed icon is replaced by the fallback dot
//! registered under the same image name, so features keep their name.
//!
//! Every identifier carries the map index, so any number of maps on one
//! page get independent sources, layers, images and click routing.

#[cfg(test)]
#[path = "cluster_test.rs"]
mod cluster_test;

use std::collections::BTreeSet;

use serde_json::{Value, json};

use crate::config::{ClusterOptions, MapConfig};
use crate::consts::{
    CLUSTER_BASE_RADIUS, CLUSTER_CIRCLE_OPACITY, CLUSTER_FONT, CLUSTER_RADIUS_STEPS, DEFAULT_ICON_NAME,
    DEFAULT_ICON_PIXEL_RATIO, DEFAULT_ICON_RADIUS_PX, DEFAULT_ICON_SIZE_PX,
};
use crate::engine::{ClickedFeature, DotImage, MapEngine};
use crate::error::ResourceError;
use crate::geo::LngLat;
use crate::pin::PinRecord;

/// Source and layer identifiers of one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIds {
    pub source: String,
    pub clusters: String,
    pub count: String,
    pub unclustered: String,
}

impl ClusterIds {
    #[must_use]
    pub fn for_map(map_index: usize) -> Self {
        Self {
            source: format!("pins-{map_index}"),
            clusters: format!("clusters-{map_index}"),
            count: format!("cluster-count-{map_index}"),
            unclustered: format!("unclustered-{map_index}"),
        }
    }
}

/// Stable feature id, `"{map}_{pin}"`.
#[must_use]
pub fn feature_id(map_index: usize, pin_index: usize) -> String {
    format!("{map_index}_{pin_index}")
}

/// Split a feature id back into `(map, pin)`.
#[must_use]
pub fn parse_feature_id(id: &str) -> Option<(usize, usize)> {
    let (map, pin) = id.split_once('_')?;
    match (map.parse(), pin.parse()) {
        (Ok(map), Ok(pin)) => Some((map, pin)),
        _ => None,
    }
}

/// Image name of the `n`th distinct custom icon of a map.
#[must_use]
pub fn icon_name(map_index: usize, n: usize) -> String {
    format!("img-{map_index}-{n}")
}

/// Circle radius for a cluster of `point_count` points.
///
/// Each step applies from its lower edge inclusive: 5 → 15, 10 → 20, 30 → 25.
#[must_use]
pub fn cluster_radius(point_count: u64) -> f64 {
    CLUSTER_RADIUS_STEPS
        .iter()
        .rev()
        .find(|(min, _)| point_count >= *min)
        .map_or(CLUSTER_BASE_RADIUS, |(_, radius)| *radius)
}

/// The same step function as an engine expression.
#[must_use]
pub fn radius_expression() -> Value {
    let mut expr = vec![json!("step"), json!(["get", "point_count"]), json!(CLUSTER_BASE_RADIUS)];
    for (min, radius) in CLUSTER_RADIUS_STEPS {
        expr.push(json!(min));
        expr.push(json!(radius));
    }
    Value::Array(expr)
}

/// The fallback dot, drawn in the cluster color.
#[must_use]
pub fn default_dot(options: &ClusterOptions) -> DotImage {
    DotImage {
        size_px: DEFAULT_ICON_SIZE_PX,
        radius_px: DEFAULT_ICON_RADIUS_PX,
        color: options.color.clone(),
        pixel_ratio: DEFAULT_ICON_PIXEL_RATIO,
    }
}

/// Distinct custom icon URLs in first-seen order, with their image names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconPlan {
    icons: Vec<(String, String)>,
}

impl IconPlan {
    #[must_use]
    pub fn new(map_index: usize, pins: &[PinRecord]) -> Self {
        let mut icons: Vec<(String, String)> = Vec::new();
        for url in pins.iter().filter_map(|p| p.icon.as_deref()) {
            if !icons.iter().any(|(u, _)| u == url) {
                icons.push((url.to_owned(), icon_name(map_index, icons.len())));
            }
        }
        Self { icons }
    }

    /// Image name a pin's feature renders with.
    #[must_use]
    pub fn image_for(&self, pin: &PinRecord) -> &str {
        pin.icon
            .as_deref()
            .and_then(|url| self.name_of(url))
            .unwrap_or(DEFAULT_ICON_NAME)
    }

    #[must_use]
    pub fn name_of(&self, url: &str) -> Option<&str> {
        self.icons.iter().find(|(u, _)| u == url).map(|(_, n)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.icons.iter().map(|(u, n)| (u.as_str(), n.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

/// Counts outstanding icon loads. The last one to settle opens the barrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBarrier {
    pending: BTreeSet<String>,
}

impl IconBarrier {
    #[must_use]
    pub fn new(plan: &IconPlan) -> Self {
        Self { pending: plan.iter().map(|(url, _)| url.to_owned()).collect() }
    }

    /// Mark `url` settled. Returns `true` exactly once: when the last load settles.
    /// Unknown or repeated URLs change nothing.
    pub fn settle(&mut self, url: &str) -> bool {
        self.pending.remove(url) && self.pending.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

/// GeoJSON source definition with clustering switched on.
#[must_use]
pub fn source(map_index: usize, pins: &[PinRecord], plan: &IconPlan, options: &ClusterOptions) -> Value {
    let features: Vec<Value> = pins
        .iter()
        .map(|pin| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": pin.position },
                "properties": {
                    "id": feature_id(map_index, pin.index),
                    "popup": pin.popup.as_deref().unwrap_or_default(),
                    "icon": plan.image_for(pin),
                },
            })
        })
        .collect();
    json!({
        "type": "geojson",
        "data": { "type": "FeatureCollection", "features": features },
        "cluster": true,
        "clusterRadius": options.radius,
        "clusterMaxZoom": options.max_zoom,
    })
}

#[must_use]
pub fn circle_layer(ids: &ClusterIds, options: &ClusterOptions) -> Value {
    json!({
        "id": ids.clusters,
        "type": "circle",
        "source": ids.source,
        "filter": ["has", "point_count"],
        "paint": {
            "circle-color": options.color,
            "circle-radius": radius_expression(),
            "circle-opacity": CLUSTER_CIRCLE_OPACITY,
        },
    })
}

#[must_use]
pub fn count_layer(ids: &ClusterIds, options: &ClusterOptions) -> Value {
    json!({
        "id": ids.count,
        "type": "symbol",
        "source": ids.source,
        "filter": ["has", "point_count"],
        "layout": {
            "text-field": ["get", "point_count"],
            "text-font": [CLUSTER_FONT],
            "text-size": options.text_size,
        },
        "paint": { "text-color": options.text_color },
    })
}

#[must_use]
pub fn unclustered_layer(ids: &ClusterIds) -> Value {
    json!({
        "id": ids.unclustered,
        "type": "symbol",
        "source": ids.source,
        "filter": ["!", ["has", "point_count"]],
        "layout": { "icon-image": ["get", "icon"], "icon-size": 1 },
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Unloaded,
    AwaitingIcons(IconBarrier),
    Ready,
}

/// What a click on one of this map's layers asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterClick {
    /// Zoom into a cluster.
    Expand { cluster_id: u64, center: LngLat },
    /// Open the popup of a single point.
    Point { pin_index: usize },
    Ignored,
}

/// Cluster-mode state of one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterMode {
    map_index: usize,
    ids: ClusterIds,
    plan: IconPlan,
    phase: Phase,
}

impl ClusterMode {
    #[must_use]
    pub fn new(map_index: usize, pins: &[PinRecord]) -> Self {
        Self {
            map_index,
            ids: ClusterIds::for_map(map_index),
            plan: IconPlan::new(map_index, pins),
            phase: Phase::Unloaded,
        }
    }

    #[must_use]
    pub fn ids(&self) -> &ClusterIds {
        &self.ids
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Register the source and cluster layers, and start icon loads.
    ///
    /// Returns `true` the first time, `false` for a repeated load signal.
    pub fn on_style_loaded<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        config: &MapConfig,
        pins: &[PinRecord],
    ) -> bool {
        if self.phase != Phase::Unloaded {
            return false;
        }
        let options = &config.cluster;
        engine.add_source(&self.ids.source, &source(self.map_index, pins, &self.plan, options));
        engine.add_layer(&circle_layer(&self.ids, options));
        engine.add_layer(&count_layer(&self.ids, options));

        if !engine.has_image(DEFAULT_ICON_NAME) {
            engine.add_dot_image(DEFAULT_ICON_NAME, &default_dot(options));
        }

        if self.plan.is_empty() {
            self.finalize(engine);
        } else {
            for (url, name) in self.plan.iter() {
                engine.load_image(url, name);
            }
            self.phase = Phase::AwaitingIcons(IconBarrier::new(&self.plan));
        }
        true
    }

    /// Record one icon load outcome; finalize after the last one.
    pub fn on_icon_settled<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        config: &MapConfig,
        url: &str,
        result: Result<(), ResourceError>,
    ) {
        let Phase::AwaitingIcons(ref mut barrier) = self.phase else {
            log::debug!("mapmark: map {}: icon {url} settled outside loading", self.map_index);
            return;
        };
        if let Err(e) = result {
            log::warn!("mapmark: map {}: {e}; using default icon", self.map_index);
            if let Some(name) = self.plan.name_of(url) {
                engine.add_dot_image(name, &default_dot(&config.cluster));
            }
        }
        if barrier.settle(url) {
            self.finalize(engine);
        }
    }

    fn finalize<E: MapEngine + ?Sized>(&mut self, engine: &mut E) {
        engine.add_layer(&unclustered_layer(&self.ids));
        engine.listen_layer_clicks(&self.ids.unclustered);
        engine.listen_layer_clicks(&self.ids.clusters);
        self.phase = Phase::Ready;
    }

    /// Route a layer click to what it should do.
    #[must_use]
    pub fn route_click(&self, layer: &str, feature: &ClickedFeature) -> ClusterClick {
        if layer == self.ids.clusters {
            return match feature.cluster_id() {
                Some(cluster_id) => ClusterClick::Expand { cluster_id, center: feature.coordinates() },
                None => ClusterClick::Ignored,
            };
        }
        if layer == self.ids.unclustered {
            return match feature.property_str("id").and_then(parse_feature_id) {
                Some((map, pin_index)) if map == self.map_index => ClusterClick::Point { pin_index },
                _ => ClusterClick::Ignored,
            };
        }
        ClusterClick::Ignored
    }

    /// Ease into an expanded cluster, or do nothing if the lookup failed.
    pub fn on_expansion_zoom<E: MapEngine + ?Sized>(
        &self,
        engine: &mut E,
        center: LngLat,
        result: Result<f64, ResourceError>,
    ) {
        match result {
            Ok(zoom) => engine.ease_to(center, zoom),
            Err(e) => log::debug!("mapmark: map {}: {e}", self.map_index),
        }
    }
}

//! One map instance: configuration, pins, rendering mode and overlay.
//!
//! [`MapPlan`] is everything decided before the engine exists: resolved
//! configuration, validated pins, construction options, control policy.
//! [`MapInstance`] owns the engine and the overlay DOM once built, and
//! reacts to every [`MapEvent`] the engine or page reports back.

#[cfg(test)]
#[path = "instance_test.rs"]
mod instance_test;

use crate::attrs::{self, MapElement};
use crate::center::initial_center;
use crate::cluster::{ClusterClick, ClusterMode};
use crate::config::{MapConfig, PageSnapshot, PopupMode};
use crate::consts::OVERLAY_CLASS;
use crate::engine::{MapEngine, MapEvent, MapOptions, ZoomDirection};
use crate::error::ConfigError;
use crate::fit::fit_viewport;
use crate::geo::{LngLat, LngLatBounds};
use crate::marker::{MarkerMode, native_popup};
use crate::overlay::{OverlayDom, OverlayLayer};
use crate::pin::{PinRecord, ingest};

/// Which zoom controls a map gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Author-supplied `data-map-zoom` buttons drive the camera.
    Custom,
    /// The engine's own control.
    Builtin,
    None,
}

impl Navigation {
    /// Custom buttons win; otherwise `data-map-nav` asks for the built-in control.
    #[must_use]
    pub fn for_element(el: &MapElement) -> Self {
        if el.has_custom_zoom_buttons() {
            Self::Custom
        } else if el.attributes.has(attrs::MAP_NAV) {
            Self::Builtin
        } else {
            Self::None
        }
    }
}

/// Everything decided about a map before its engine is created.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPlan {
    pub index: usize,
    pub config: MapConfig,
    pub pins: Vec<PinRecord>,
    pub options: MapOptions,
    pub navigation: Navigation,
}

impl MapPlan {
    /// Resolve configuration and pins for the `index`th map root.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the map cannot be configured; other
    /// maps on the page are unaffected.
    pub fn prepare(page: &PageSnapshot, index: usize, el: &MapElement) -> Result<Self, ConfigError> {
        let config = page.resolve(&el.attributes)?;
        let pins = ingest(&el.pins, &config);
        let positions: Vec<LngLat> = pins.iter().map(|p| p.position).collect();
        let options = MapOptions {
            token: config.token.clone(),
            style: config.style.clone(),
            center: initial_center(config.center, config.initial_center, &positions),
            zoom: config.zoom,
            cooperative_gestures: config.cooperative_gestures,
        };
        Ok(Self { index, config, pins, options, navigation: Navigation::for_element(el) })
    }

    /// Wire controls and start rendering on a freshly created engine.
    pub fn build<E: MapEngine, D: OverlayDom>(self, engine: E, dom: D) -> MapInstance<E, D> {
        MapInstance::new(self, engine, dom)
    }
}

enum Rendering {
    /// No valid pins: nothing to draw or frame.
    Empty,
    Markers(MarkerMode),
    Cluster(ClusterMode),
}

/// A live map.
pub struct MapInstance<E, D: OverlayDom> {
    index: usize,
    config: MapConfig,
    pins: Vec<PinRecord>,
    navigation: Navigation,
    engine: E,
    dom: D,
    overlay: OverlayLayer<D::Node>,
    rendering: Rendering,
}

impl<E: MapEngine, D: OverlayDom> MapInstance<E, D> {
    fn new(plan: MapPlan, mut engine: E, dom: D) -> Self {
        let MapPlan { index, config, pins, navigation, .. } = plan;

        engine.enable_scroll_zoom();
        if navigation == Navigation::Builtin {
            engine.add_navigation_control();
        }

        let rendering = if pins.is_empty() {
            Rendering::Empty
        } else if config.cluster.enabled {
            Rendering::Cluster(ClusterMode::new(index, &pins))
        } else {
            let markers = MarkerMode::place(&mut engine, &pins, &config);
            fit_viewport(&mut engine, &config, markers.bounds());
            Rendering::Markers(markers)
        };
        log::debug!("mapmark: map {index}: {} pins, cluster={}", pins.len(), config.cluster.enabled);

        Self {
            index,
            overlay: OverlayLayer::new(OVERLAY_CLASS, config.popup_z_index),
            config,
            pins,
            navigation,
            engine,
            dom,
            rendering,
        }
    }

    /// React to one asynchronous event.
    pub fn handle(&mut self, event: MapEvent) {
        match event {
            MapEvent::StyleLoaded => self.on_style_loaded(),
            MapEvent::IconSettled { url, result } => {
                if let Rendering::Cluster(mode) = &mut self.rendering {
                    mode.on_icon_settled(&mut self.engine, &self.config, &url, result);
                }
            }
            MapEvent::LayerClicked { layer, feature } => {
                let Rendering::Cluster(mode) = &self.rendering else {
                    return;
                };
                match mode.route_click(&layer, &feature) {
                    ClusterClick::Expand { cluster_id, center } => {
                        let source = mode.ids().source.clone();
                        self.engine.request_expansion_zoom(&source, cluster_id, center);
                    }
                    ClusterClick::Point { pin_index } => self.open_popup(pin_index),
                    ClusterClick::Ignored => {}
                }
            }
            MapEvent::MarkerClicked(marker) => {
                let pin = match &self.rendering {
                    Rendering::Markers(mode) => mode.pin_for(marker),
                    _ => None,
                };
                if let Some(pin_index) = pin {
                    self.open_popup(pin_index);
                }
            }
            MapEvent::ExpansionZoom { center, result, .. } => {
                if let Rendering::Cluster(mode) = &self.rendering {
                    mode.on_expansion_zoom(&mut self.engine, center, result);
                }
            }
            MapEvent::ViewChanged(subscription) => {
                if !self.overlay.reposition(subscription, &self.engine, &mut self.dom) {
                    log::debug!("mapmark: map {}: stale view subscription {subscription:?}", self.index);
                }
            }
            MapEvent::OverlayClosed => self.overlay.close(&mut self.engine, &mut self.dom),
            MapEvent::Zoom(direction) => {
                if self.navigation != Navigation::Custom {
                    return;
                }
                match direction {
                    ZoomDirection::In => self.engine.zoom_in(),
                    ZoomDirection::Out => self.engine.zoom_out(),
                }
            }
        }
    }

    fn on_style_loaded(&mut self) {
        let Rendering::Cluster(mode) = &mut self.rendering else {
            return;
        };
        if mode.on_style_loaded(&mut self.engine, &self.config, &self.pins) {
            let bounds = LngLatBounds::from_points(self.pins.iter().map(|p| p.position));
            fit_viewport(&mut self.engine, &self.config, bounds);
        }
    }

    /// Open the popup of the pin with DOM index `pin_index`, the same way in
    /// every rendering mode: the pin's anchor and offset always apply.
    pub fn open_popup(&mut self, pin_index: usize) {
        let Some(pin) = self.pins.iter().find(|p| p.index == pin_index) else {
            log::debug!("mapmark: map {}: no pin {pin_index}", self.index);
            return;
        };
        match self.config.popup_mode {
            PopupMode::Native => {
                if let Some(popup) = native_popup(pin) {
                    self.engine.show_popup(pin.position, &popup);
                }
            }
            PopupMode::Custom => {
                if pin.has_popup() {
                    self.overlay.open(&mut self.engine, &mut self.dom, pin);
                }
            }
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    #[must_use]
    pub fn pins(&self) -> &[PinRecord] {
        &self.pins
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[must_use]
    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Pin whose custom overlay is currently open.
    #[must_use]
    pub fn open_overlay(&self) -> Option<usize> {
        self.overlay.open_pin()
    }

    /// Whether cluster layers and click handlers are fully registered.
    #[must_use]
    pub fn is_cluster_ready(&self) -> bool {
        matches!(&self.rendering, Rendering::Cluster(mode) if mode.is_ready())
    }
}

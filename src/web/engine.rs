//! [`MapEngine`] over a `mapboxgl.Map`.

use std::collections::BTreeMap;

use js_sys::{Array, Function, Reflect};
use serde_json::json;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, ImageData};

use super::mapbox::{GeoJsonSource, Map, Marker, NavigationControl, Popup};
use super::{Dispatcher, describe, lng_lat, to_js};
use crate::engine::{
    ClickedFeature, DotImage, MapEngine, MapEvent, MapOptions, MarkerId, MarkerSpec, NativePopup, SubscriptionId,
};
use crate::error::ResourceError;
use crate::geo::{LngLat, LngLatBounds, Point};

type Listener = Closure<dyn FnMut(JsValue)>;

pub(super) struct WebEngine {
    map: Map,
    events: Dispatcher,
    markers: usize,
    /// Layer and lifecycle listeners, kept alive with the map.
    listeners: Vec<Listener>,
    views: BTreeMap<SubscriptionId, Listener>,
    next_view: u64,
}

impl WebEngine {
    /// Construct the map inside `container` and report style readiness.
    pub(super) fn create(container: &HtmlElement, options: &MapOptions, events: Dispatcher) -> Result<Self, JsValue> {
        let js_options = to_js(&json!({
            "accessToken": options.token,
            "style": options.style,
            "center": [options.center.lng, options.center.lat],
            "zoom": options.zoom,
            "cooperativeGestures": options.cooperative_gestures,
        }));
        Reflect::set(&js_options, &JsValue::from_str("container"), container)?;
        let map = Map::new(&js_options)?;

        let mut engine = Self { map, events, markers: 0, listeners: Vec::new(), views: BTreeMap::new(), next_view: 0 };
        let events = engine.events.clone();
        engine.listen("load", move |_: JsValue| events.send(MapEvent::StyleLoaded));
        Ok(engine)
    }

    fn listen(&mut self, event: &str, handler: impl FnMut(JsValue) + 'static) {
        let listener: Listener = Closure::wrap(Box::new(handler) as Box<dyn FnMut(JsValue)>);
        self.map.on(event, listener.as_ref().unchecked_ref());
        self.listeners.push(listener);
    }

    fn icon_element(url: &str, width_px: f64) -> Result<HtmlElement, JsValue> {
        let img = document()?.create_element("img")?;
        img.set_attribute("src", url)?;
        let img: HtmlElement = img.dyn_into().map_err(JsValue::from)?;
        img.style().set_property("width", &format!("{width_px}px"))?;
        Ok(img)
    }
}

fn document() -> Result<web_sys::Document, JsValue> {
    web_sys::window().and_then(|w| w.document()).ok_or_else(|| JsValue::from_str("no document"))
}

fn popup(spec: &NativePopup) -> Popup {
    let options = to_js(&json!({
        "anchor": spec.anchor.as_str(),
        "offset": [spec.offset.x, spec.offset.y],
    }));
    Popup::new(&options).set_html(&spec.html)
}

/// Rasterize a filled circle for `addImage`.
fn draw_dot(dot: &DotImage) -> Result<ImageData, JsValue> {
    let canvas: HtmlCanvasElement = document()?.create_element("canvas")?.dyn_into().map_err(JsValue::from)?;
    canvas.set_width(dot.size_px);
    canvas.set_height(dot.size_px);
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()
        .map_err(JsValue::from)?;

    let size = f64::from(dot.size_px);
    ctx.set_fill_style_str(&dot.color);
    ctx.begin_path();
    ctx.arc(size / 2.0, size / 2.0, dot.radius_px, 0.0, std::f64::consts::TAU)?;
    ctx.fill();
    ctx.get_image_data(0.0, 0.0, size, size)
}

fn number(object: &JsValue, key: &str) -> f64 {
    match Reflect::get(object, &JsValue::from_str(key)) {
        Ok(value) => value.as_f64().unwrap_or_default(),
        Err(_) => 0.0,
    }
}

fn is_error(value: &JsValue) -> bool {
    !(value.is_null() || value.is_undefined())
}

/// First feature of a layer click event.
fn clicked_feature(event: &JsValue) -> Option<ClickedFeature> {
    let features = match Reflect::get(event, &JsValue::from_str("features")) {
        Ok(features) => Array::from(&features),
        Err(_) => return None,
    };
    let first = features.get(0);
    if first.is_undefined() {
        return None;
    }
    let text = match js_sys::JSON::stringify(&first) {
        Ok(text) => String::from(text),
        Err(e) => {
            log::debug!("mapmark: clicked feature not serializable: {}", describe(&e));
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(feature) => Some(feature),
        Err(e) => {
            log::debug!("mapmark: unexpected clicked feature: {e}");
            None
        }
    }
}

impl MapEngine for WebEngine {
    fn enable_scroll_zoom(&mut self) {
        self.map.scroll_zoom().enable(&JsValue::UNDEFINED);
    }

    fn add_navigation_control(&mut self) {
        let control = NavigationControl::new(&to_js(&json!({ "showCompass": false })));
        self.map.add_control(&control, "top-right");
    }

    fn zoom_in(&mut self) {
        self.map.zoom_in();
    }

    fn zoom_out(&mut self) {
        self.map.zoom_out();
    }

    fn add_marker(&mut self, spec: &MarkerSpec) -> MarkerId {
        let options = js_sys::Object::new();
        if let Some(icon) = &spec.icon {
            let element = Self::icon_element(&icon.url, icon.width_px)
                .and_then(|img| Reflect::set(&options, &JsValue::from_str("element"), &img));
            if let Err(e) = element {
                log::warn!("mapmark: marker icon {}: {}", icon.url, describe(&e));
            }
        }
        let marker = Marker::new(&options).set_lng_lat(&lng_lat(spec.position));
        if let Some(native) = &spec.popup {
            marker.set_popup(&popup(native));
        }
        marker.add_to(&self.map);

        let id = MarkerId(self.markers);
        self.markers += 1;
        if spec.report_clicks {
            let events = self.events.clone();
            let on_click: Listener =
                Closure::wrap(Box::new(move |_: JsValue| events.send(MapEvent::MarkerClicked(id))) as Box<dyn FnMut(JsValue)>);
            if let Err(e) = marker.element().add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref()) {
                log::warn!("mapmark: marker click not wired: {}", describe(&e));
            }
            // Markers are never removed.
            on_click.forget();
        }
        id
    }

    fn show_popup(&mut self, at: LngLat, spec: &NativePopup) {
        popup(spec).set_lng_lat(&lng_lat(at)).add_to(&self.map);
    }

    fn add_source(&mut self, id: &str, source: &serde_json::Value) {
        if let Err(e) = self.map.add_source(id, &to_js(source)) {
            log::error!("mapmark: source {id}: {}", describe(&e));
        }
    }

    fn add_layer(&mut self, layer: &serde_json::Value) {
        if let Err(e) = self.map.add_layer(&to_js(layer)) {
            log::error!("mapmark: layer {}: {}", layer["id"], describe(&e));
        }
    }

    fn has_image(&self, name: &str) -> bool {
        self.map.has_image(name)
    }

    fn add_dot_image(&mut self, name: &str, dot: &DotImage) {
        let added = draw_dot(dot).and_then(|image| {
            self.map.add_image(name, &image, &to_js(&json!({ "pixelRatio": dot.pixel_ratio })))
        });
        if let Err(e) = added {
            log::warn!("mapmark: image {name}: {}", describe(&e));
        }
    }

    fn load_image(&mut self, url: &str, name: &str) {
        let map = self.map.clone();
        let events = self.events.clone();
        let (url_owned, name) = (url.to_owned(), name.to_owned());
        let callback = Closure::once_into_js(move |error: JsValue, image: JsValue| {
            let failed = |reason: String| ResourceError::IconLoad { url: url_owned.clone(), reason };
            let result = if is_error(&error) {
                Err(failed(describe(&error)))
            } else if map.has_image(&name) {
                Ok(())
            } else {
                map.add_image(&name, &image, &JsValue::UNDEFINED).map_err(|e| failed(describe(&e)))
            };
            events.send(MapEvent::IconSettled { url: url_owned.clone(), result });
        });
        self.map.load_image(url, callback.unchecked_ref::<Function>());
    }

    fn listen_layer_clicks(&mut self, layer_id: &str) {
        let events = self.events.clone();
        let layer = layer_id.to_owned();
        let listener: Listener = Closure::wrap(Box::new(move |event: JsValue| match clicked_feature(&event) {
            Some(feature) => events.send(MapEvent::LayerClicked { layer: layer.clone(), feature }),
            None => log::debug!("mapmark: click on {layer} without a feature"),
        }) as Box<dyn FnMut(JsValue)>);
        self.map.on_layer("click", layer_id, listener.as_ref().unchecked_ref());
        self.listeners.push(listener);
    }

    #[allow(clippy::cast_precision_loss)]
    fn request_expansion_zoom(&mut self, source_id: &str, cluster_id: u64, center: LngLat) {
        let source = self.map.get_source(source_id);
        if source.is_undefined() {
            let reason = format!("no source {source_id}");
            let result = Err(ResourceError::ExpansionZoom { cluster_id, reason });
            self.events.send(MapEvent::ExpansionZoom { cluster_id, center, result });
            return;
        }
        let events = self.events.clone();
        let callback = Closure::once_into_js(move |error: JsValue, zoom: JsValue| {
            let result = if is_error(&error) {
                Err(ResourceError::ExpansionZoom { cluster_id, reason: describe(&error) })
            } else {
                zoom.as_f64()
                    .ok_or_else(|| ResourceError::ExpansionZoom { cluster_id, reason: "no zoom returned".into() })
            };
            events.send(MapEvent::ExpansionZoom { cluster_id, center, result });
        });
        source
            .unchecked_into::<GeoJsonSource>()
            .get_cluster_expansion_zoom(cluster_id as f64, callback.unchecked_ref::<Function>());
    }

    fn ease_to(&mut self, center: LngLat, zoom: f64) {
        self.map.ease_to(&to_js(&json!({ "center": [center.lng, center.lat], "zoom": zoom })));
    }

    fn fit_bounds(&mut self, bounds: &LngLatBounds, padding: f64, max_zoom: f64) {
        let options = to_js(&json!({ "padding": padding, "maxZoom": max_zoom }));
        self.map.fit_bounds(&to_js(&json!(bounds.to_array())), &options);
    }

    fn project(&self, at: LngLat) -> Point {
        let point = self.map.project(&lng_lat(at));
        Point::new(number(&point, "x"), number(&point, "y"))
    }

    fn subscribe_view_changes(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_view);
        self.next_view += 1;
        let events = self.events.clone();
        let listener: Listener =
            Closure::wrap(Box::new(move |_: JsValue| events.send(MapEvent::ViewChanged(id))) as Box<dyn FnMut(JsValue)>);
        self.map.on("move", listener.as_ref().unchecked_ref());
        self.views.insert(id, listener);
        id
    }

    fn unsubscribe_view_changes(&mut self, id: SubscriptionId) {
        if let Some(listener) = self.views.remove(&id) {
            self.map.off("move", listener.as_ref().unchecked_ref());
        }
    }
}

//! Bindings to the page's `mapboxgl` global.
//!
//! Only the surface the widget drives is declared. Option objects and
//! style definitions cross the boundary as plain JS values.

use js_sys::Function;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[derive(Clone)]
    pub type Map;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "Map", catch)]
    pub fn new(options: &JsValue) -> Result<Map, JsValue>;

    #[wasm_bindgen(method)]
    pub fn on(this: &Map, event: &str, handler: &Function);

    #[wasm_bindgen(method, js_name = on)]
    pub fn on_layer(this: &Map, event: &str, layer_id: &str, handler: &Function);

    #[wasm_bindgen(method)]
    pub fn off(this: &Map, event: &str, handler: &Function);

    #[wasm_bindgen(method, getter, js_name = scrollZoom)]
    pub fn scroll_zoom(this: &Map) -> ScrollZoomHandler;

    #[wasm_bindgen(method, js_name = addControl)]
    pub fn add_control(this: &Map, control: &NavigationControl, position: &str);

    #[wasm_bindgen(method, js_name = zoomIn)]
    pub fn zoom_in(this: &Map);

    #[wasm_bindgen(method, js_name = zoomOut)]
    pub fn zoom_out(this: &Map);

    #[wasm_bindgen(method, js_name = addSource, catch)]
    pub fn add_source(this: &Map, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getSource)]
    pub fn get_source(this: &Map, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = addLayer, catch)]
    pub fn add_layer(this: &Map, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = hasImage)]
    pub fn has_image(this: &Map, name: &str) -> bool;

    #[wasm_bindgen(method, js_name = addImage, catch)]
    pub fn add_image(this: &Map, name: &str, image: &JsValue, options: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = loadImage)]
    pub fn load_image(this: &Map, url: &str, callback: &Function);

    #[wasm_bindgen(method, js_name = easeTo)]
    pub fn ease_to(this: &Map, options: &JsValue);

    #[wasm_bindgen(method, js_name = fitBounds)]
    pub fn fit_bounds(this: &Map, bounds: &JsValue, options: &JsValue);

    /// Returns a `{x, y}` point in container pixels.
    #[wasm_bindgen(method)]
    pub fn project(this: &Map, lng_lat: &JsValue) -> JsValue;

    pub type ScrollZoomHandler;

    #[wasm_bindgen(method)]
    pub fn enable(this: &ScrollZoomHandler, options: &JsValue);

    pub type GeoJsonSource;

    #[wasm_bindgen(method, js_name = getClusterExpansionZoom)]
    pub fn get_cluster_expansion_zoom(this: &GeoJsonSource, cluster_id: f64, callback: &Function);

    pub type Marker;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "Marker")]
    pub fn new(options: &JsValue) -> Marker;

    #[wasm_bindgen(method, js_name = setLngLat)]
    pub fn set_lng_lat(this: &Marker, lng_lat: &JsValue) -> Marker;

    #[wasm_bindgen(method, js_name = setPopup)]
    pub fn set_popup(this: &Marker, popup: &Popup) -> Marker;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &Marker, map: &Map) -> Marker;

    #[wasm_bindgen(method, js_name = getElement)]
    pub fn element(this: &Marker) -> web_sys::HtmlElement;

    pub type Popup;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "Popup")]
    pub fn new(options: &JsValue) -> Popup;

    #[wasm_bindgen(method, js_name = setLngLat)]
    pub fn set_lng_lat(this: &Popup, lng_lat: &JsValue) -> Popup;

    #[wasm_bindgen(method, js_name = setHTML)]
    pub fn set_html(this: &Popup, html: &str) -> Popup;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &Popup, map: &Map) -> Popup;

    pub type NavigationControl;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "NavigationControl")]
    pub fn new(options: &JsValue) -> NavigationControl;
}

/// Whether the `mapboxgl` global is present.
pub fn is_loaded() -> bool {
    match js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("mapboxgl")) {
        Ok(value) => value.is_object(),
        Err(_) => false,
    }
}

//! Document scanning and the overlay host.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, NodeList};

use super::{Dispatcher, describe};
use crate::attrs::{self, Attributes, MapElement, PinElement};
use crate::consts::OVERLAY_CLOSE_CLASS;
use crate::engine::{MapEvent, ZoomDirection};
use crate::geo::Point;
use crate::overlay::OverlayDom;
use crate::pin::PinRecord;

// ── Scanning ────────────────────────────────────────────────────

/// A map root and the live pin elements its snapshot was read from.
pub(super) struct ScannedRoot {
    pub container: HtmlElement,
    pub snapshot: MapElement,
    /// Same order as `snapshot.pins`, so a pin index finds its template.
    pub pins: Vec<Element>,
}

/// Attributes of the document root element.
pub(super) fn root_attributes(document: &Document) -> Attributes {
    document.document_element().map(|el| attributes_of(&el)).unwrap_or_default()
}

/// Every map root in document order.
pub(super) fn scan(document: &Document) -> Vec<ScannedRoot> {
    let roots = match document.query_selector_all(&format!("[{}]", attrs::MAP_ROOT)) {
        Ok(list) => elements(&list),
        Err(e) => {
            log::warn!("mapmark: scanning map roots failed: {}", describe(&e));
            return Vec::new();
        }
    };
    roots.iter().filter_map(|el| el.dyn_ref::<HtmlElement>().cloned()).map(scan_root).collect()
}

fn scan_root(container: HtmlElement) -> ScannedRoot {
    let pins = select(&container, &format!("[{}][{}]", attrs::PIN_LAT, attrs::PIN_LNG));
    let snapshot = MapElement {
        attributes: attributes_of(&container),
        pins: pins
            .iter()
            .map(|el| PinElement { attributes: attributes_of(el), inner_html: el.inner_html() })
            .collect(),
        zoom_in_buttons: select(&container, &zoom_selector(ZoomDirection::In)).len(),
        zoom_out_buttons: select(&container, &zoom_selector(ZoomDirection::Out)).len(),
    };
    ScannedRoot { container, snapshot, pins }
}

fn zoom_selector(direction: ZoomDirection) -> String {
    let value = match direction {
        ZoomDirection::In => "in",
        ZoomDirection::Out => "out",
    };
    format!("[{}=\"{value}\"]", attrs::ZOOM_BUTTON)
}

fn attributes_of(el: &Element) -> Attributes {
    el.get_attribute_names()
        .iter()
        .filter_map(|name| name.as_string())
        .filter_map(|name| el.get_attribute(&name).map(|value| (name, value)))
        .collect()
}

fn select(root: &Element, selector: &str) -> Vec<Element> {
    match root.query_selector_all(selector) {
        Ok(list) => elements(&list),
        Err(e) => {
            log::warn!("mapmark: selector {selector} failed: {}", describe(&e));
            Vec::new()
        }
    }
}

fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length()).filter_map(|i| list.get(i)).filter_map(|node| node.dyn_ref::<Element>().cloned()).collect()
}

// ── Container wiring ────────────────────────────────────────────

/// Overlays are absolutely positioned, so the container must be a containing block.
pub(super) fn ensure_positioned(container: &HtmlElement) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let position = match window.get_computed_style(container) {
        Ok(Some(style)) => style.get_property_value("position").unwrap_or_default(),
        _ => return,
    };
    if position == "static" {
        if let Err(e) = container.style().set_property("position", "relative") {
            log::warn!("mapmark: cannot position map container: {}", describe(&e));
        }
    }
}

/// Route clicks on author-supplied zoom buttons to the instance.
pub(super) fn wire_zoom_buttons(container: &HtmlElement, events: &Dispatcher) {
    for direction in [ZoomDirection::In, ZoomDirection::Out] {
        for button in select(container, &zoom_selector(direction)) {
            let events = events.clone();
            let on_click = Closure::wrap(Box::new(move |event: web_sys::Event| {
                event.prevent_default();
                events.send(MapEvent::Zoom(direction));
            }) as Box<dyn FnMut(web_sys::Event)>);
            if let Err(e) = button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref()) {
                log::warn!("mapmark: zoom button not wired: {}", describe(&e));
            }
            // Lives as long as the page.
            on_click.forget();
        }
    }
}

// ── Overlay host ────────────────────────────────────────────────

type CloseListener = Closure<dyn FnMut(web_sys::Event)>;

/// The close button of the mounted overlay and its click listener.
struct CloseHandle {
    button: Element,
    listener: CloseListener,
}

/// Overlay DOM backed by the map container.
pub(super) struct WebDom {
    container: HtmlElement,
    templates: Vec<Element>,
    events: Dispatcher,
    close: Option<CloseHandle>,
    /// The last detached listener. It may be the one running right now (the
    /// close button closes its own overlay), so it is dropped one unmount later.
    spent: Option<CloseListener>,
}

impl WebDom {
    pub(super) fn new(container: HtmlElement, templates: Vec<Element>, events: Dispatcher) -> Self {
        Self { container, templates, events, close: None, spent: None }
    }

    fn build(&self, pin: &PinRecord, class: &str, z_index: i32) -> Result<(HtmlElement, CloseHandle), JsValue> {
        let template = self
            .templates
            .get(pin.index)
            .ok_or_else(|| JsValue::from_str("pin element no longer available"))?;
        let node: HtmlElement = template.clone_node_with_deep(true)?.dyn_into().map_err(JsValue::from)?;

        // The clone must not match pin selectors or author CSS hiding pins.
        node.remove_attribute(attrs::PIN_LAT)?;
        node.remove_attribute(attrs::PIN_LNG)?;
        node.class_list().add_1(class)?;

        let style = node.style();
        style.set_property("display", "block")?;
        style.set_property("position", "absolute")?;
        style.set_property("left", "0px")?;
        style.set_property("top", "0px")?;
        style.set_property("z-index", &z_index.to_string())?;

        let close = self.close_button()?;
        node.append_child(&close.button)?;
        self.container.append_child(&node)?;
        Ok((node, close))
    }

    fn close_button(&self) -> Result<CloseHandle, JsValue> {
        let document = self.container.owner_document().ok_or_else(|| JsValue::from_str("detached container"))?;
        let button = document.create_element("button")?;
        button.set_class_name(OVERLAY_CLOSE_CLASS);
        button.set_attribute("type", "button")?;
        button.set_attribute("aria-label", "Close")?;
        button.set_text_content(Some("\u{00d7}"));

        let events = self.events.clone();
        let listener: CloseListener = Closure::wrap(Box::new(move |event: web_sys::Event| {
            event.prevent_default();
            events.send(MapEvent::OverlayClosed);
        }) as Box<dyn FnMut(web_sys::Event)>);
        button.add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())?;
        Ok(CloseHandle { button, listener })
    }

    fn release_close(&mut self) {
        let Some(close) = self.close.take() else {
            return;
        };
        let detached =
            close.button.remove_event_listener_with_callback("click", close.listener.as_ref().unchecked_ref());
        if let Err(e) = detached {
            log::debug!("mapmark: close listener not detached: {}", describe(&e));
        }
        // Frees the listener detached the time before.
        drop(self.spent.replace(close.listener));
    }
}

impl OverlayDom for WebDom {
    /// `None` when the overlay could not be built; placing and removing it are no-ops.
    type Node = Option<HtmlElement>;

    fn remove_all(&mut self, class: &str) {
        for el in select(&self.container, &format!(".{class}")) {
            el.remove();
        }
    }

    fn mount(&mut self, pin: &PinRecord, class: &str, z_index: i32) -> Self::Node {
        self.release_close();
        match self.build(pin, class, z_index) {
            Ok((node, close)) => {
                self.close = Some(close);
                Some(node)
            }
            Err(e) => {
                log::warn!("mapmark: overlay for pin {} not built: {}", pin.index, describe(&e));
                None
            }
        }
    }

    fn place(&mut self, node: &Self::Node, at: Point, transform: &str) {
        let Some(node) = node else {
            return;
        };
        let style = node.style();
        let placed = style
            .set_property("left", &format!("{}px", at.x))
            .and_then(|()| style.set_property("top", &format!("{}px", at.y)))
            .and_then(|()| style.set_property("transform", transform));
        if let Err(e) = placed {
            log::debug!("mapmark: overlay placement failed: {}", describe(&e));
        }
    }

    fn unmount(&mut self, node: &Self::Node) {
        if let Some(node) = node {
            node.remove();
        }
        self.release_close();
    }
}

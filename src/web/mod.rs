//! Browser entry point.
//!
//! Scans the document for map roots, creates one `mapboxgl` map per root,
//! and feeds every JS callback back into its [`MapInstance`] as a
//! [`MapEvent`].
//!
//! Callbacks can fire while the instance is already handling an event
//! (an engine call that synchronously emits). Events are therefore queued
//! per instance and drained by whoever holds the instance borrow.

mod dom;
mod engine;
mod mapbox;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;

use crate::config::PageSnapshot;
use crate::engine::MapEvent;
use crate::geo::LngLat;
use crate::instance::{MapInstance, MapPlan};
use crate::page::plan_page;

use dom::WebDom;
use engine::WebEngine;

const GLOBAL_TOKEN: &str = "MAPBOX_ACCESS_TOKEN";
const GLOBAL_DEFAULTS: &str = "MapboxDefaults";

type WebInstance = MapInstance<WebEngine, WebDom>;

/// One map's instance slot and pending events.
#[derive(Default)]
struct Shared {
    instance: RefCell<Option<WebInstance>>,
    queue: RefCell<VecDeque<MapEvent>>,
}

impl Shared {
    fn drain(&self) {
        // Already borrowed: the holder drains before releasing.
        let Ok(mut slot) = self.instance.try_borrow_mut() else {
            return;
        };
        let Some(instance) = slot.as_mut() else {
            return;
        };
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            instance.handle(event);
        }
    }
}

/// Sends events from JS callbacks to one map instance.
#[derive(Clone)]
pub(crate) struct Dispatcher(Weak<Shared>);

impl Dispatcher {
    pub(crate) fn send(&self, event: MapEvent) {
        let Some(shared) = self.0.upgrade() else {
            return;
        };
        shared.queue.borrow_mut().push_back(event);
        shared.drain();
    }
}

thread_local! {
    static MAPS: RefCell<Vec<Rc<Shared>>> = const { RefCell::new(Vec::new()) };
}

/// Install logging and the panic hook, then initialize every map on the page.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        log::debug!("mapmark: logger already installed: {e}");
    }
    mount_all();
}

fn mount_all() {
    if !mapbox::is_loaded() {
        log::error!("mapmark: mapboxgl is not loaded; no maps initialized");
        return;
    }
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };

    let page = PageSnapshot::capture(
        &dom::root_attributes(&document),
        global_string(GLOBAL_TOKEN).as_deref(),
        global_json(GLOBAL_DEFAULTS).as_deref(),
    );
    let roots = dom::scan(&document);
    let elements: Vec<_> = roots.iter().map(|root| root.snapshot.clone()).collect();

    let mut mounted = 0;
    for plan in plan_page(&page, &elements) {
        let Some(root) = roots.get(plan.index) else {
            continue;
        };
        if mount(plan, root) {
            mounted += 1;
        }
    }
    log::info!("mapmark: initialized {mounted} of {} maps", roots.len());
}

fn mount(plan: MapPlan, root: &dom::ScannedRoot) -> bool {
    let shared = Rc::new(Shared::default());
    let events = Dispatcher(Rc::downgrade(&shared));

    dom::ensure_positioned(&root.container);
    let engine = match WebEngine::create(&root.container, &plan.options, events.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("mapmark: map {}: engine construction failed: {}", plan.index, describe(&e));
            return false;
        }
    };
    dom::wire_zoom_buttons(&root.container, &events);
    let dom = WebDom::new(root.container.clone(), root.pins.clone(), events);

    let instance = plan.build(engine, dom);
    shared.instance.replace(Some(instance));
    shared.drain();
    MAPS.with(|maps| maps.borrow_mut().push(shared));
    true
}

fn global_string(name: &str) -> Option<String> {
    match js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(name)) {
        Ok(value) => value.as_string(),
        Err(_) => None,
    }
}

/// A global object re-serialized as JSON text, for the typed config parser.
fn global_json(name: &str) -> Option<String> {
    let value = match js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(name)) {
        Ok(value) if value.is_object() => value,
        _ => return None,
    };
    match js_sys::JSON::stringify(&value) {
        Ok(text) => Some(String::from(text)),
        Err(e) => {
            log::warn!("mapmark: {name}: not serializable: {}", describe(&e));
            None
        }
    }
}

/// Convert a JSON value into the equivalent JS value.
pub(crate) fn to_js(value: &serde_json::Value) -> JsValue {
    match js_sys::JSON::parse(&value.to_string()) {
        Ok(js) => js,
        Err(e) => {
            log::warn!("mapmark: cannot convert {value}: {}", describe(&e));
            JsValue::UNDEFINED
        }
    }
}

/// `[lng, lat]`, the engine's coordinate form.
pub(crate) fn lng_lat(at: LngLat) -> JsValue {
    to_js(&serde_json::json!([at.lng, at.lat]))
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(error: &JsValue) -> String {
    if let Some(text) = error.as_string() {
        return text;
    }
    match js_sys::Reflect::get(error, &JsValue::from_str("message")) {
        Ok(message) => message.as_string().unwrap_or_else(|| format!("{error:?}")),
        Err(_) => format!("{error:?}"),
    }
}

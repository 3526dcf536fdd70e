//! Custom popup overlays that track the map camera.
//!
//! An overlay is a deep clone of a pin's authored element, positioned
//! absolutely inside the map container at the screen projection of the
//! pin's coordinate. While it is open, a view-change subscription
//! re-projects it on every camera frame.
//!
//! Invariants:
//! - at most one overlay per map instance is open; opening tears down the
//!   previous one first, whether or not it was ever closed;
//! - the subscription lives exactly as long as the node: every removal
//!   path goes through [`OverlayLayer::close`], which releases both;
//! - an overlay whose pin pans off-screen stays open and keeps tracking.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use crate::engine::{MapEngine, SubscriptionId};
use crate::geo::{LngLat, PixelOffset, Point};
use crate::pin::{Anchor, PinRecord};

/// The DOM operations an overlay needs from the page.
pub trait OverlayDom {
    type Node;

    /// Remove every node inside the map container that carries `class`.
    fn remove_all(&mut self, class: &str);

    /// Deep-clone the pin's authored element, tag it with `class`, give it a
    /// close button, and attach it to the map container.
    fn mount(&mut self, pin: &PinRecord, class: &str, z_index: i32) -> Self::Node;

    /// Position `node` with its reference point at `at`, then apply `transform`.
    fn place(&mut self, node: &Self::Node, at: Point, transform: &str);

    /// Detach `node` and release what `mount` attached to it. Detaching an
    /// already detached node does nothing.
    fn unmount(&mut self, node: &Self::Node);
}

/// CSS translation that puts the anchor's edge or corner on the reference point.
#[must_use]
pub fn anchor_translate(anchor: Anchor) -> (&'static str, &'static str) {
    match anchor {
        Anchor::Top => ("-50%", "0"),
        Anchor::Bottom => ("-50%", "-100%"),
        Anchor::Left => ("0", "-50%"),
        Anchor::Right => ("-100%", "-50%"),
        Anchor::TopLeft => ("0", "0"),
        Anchor::TopRight => ("-100%", "0"),
        Anchor::BottomLeft => ("0", "-100%"),
        Anchor::BottomRight => ("-100%", "-100%"),
    }
}

/// Full transform: anchor translation, then the pixel offset.
#[must_use]
pub fn overlay_transform(anchor: Anchor, offset: PixelOffset) -> String {
    let (x, y) = anchor_translate(anchor);
    format!("translate({x}, {y}) translate({}px, {}px)", offset.x, offset.y)
}

struct OpenOverlay<N> {
    node: N,
    subscription: SubscriptionId,
    pin_index: usize,
    position: LngLat,
    transform: String,
}

/// The single overlay slot of one map instance.
pub struct OverlayLayer<N> {
    class: String,
    z_index: i32,
    open: Option<OpenOverlay<N>>,
}

impl<N> OverlayLayer<N> {
    #[must_use]
    pub fn new(class: impl Into<String>, z_index: i32) -> Self {
        Self { class: class.into(), z_index, open: None }
    }

    /// Index of the pin whose overlay is open, if any.
    #[must_use]
    pub fn open_pin(&self) -> Option<usize> {
        self.open.as_ref().map(|o| o.pin_index)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Open an overlay for `pin`, replacing any overlay already open.
    pub fn open<E, D>(&mut self, engine: &mut E, dom: &mut D, pin: &PinRecord)
    where
        E: MapEngine + ?Sized,
        D: OverlayDom<Node = N> + ?Sized,
    {
        self.close(engine, dom);
        dom.remove_all(&self.class);

        let node = dom.mount(pin, &self.class, self.z_index);
        let transform = overlay_transform(pin.anchor, pin.offset);
        dom.place(&node, engine.project(pin.position), &transform);
        let subscription = engine.subscribe_view_changes();
        log::debug!("mapmark: overlay opened for pin {}", pin.index);

        self.open = Some(OpenOverlay { node, subscription, pin_index: pin.index, position: pin.position, transform });
    }

    /// Tear down the open overlay: detach the node and drop its subscription.
    pub fn close<E, D>(&mut self, engine: &mut E, dom: &mut D)
    where
        E: MapEngine + ?Sized,
        D: OverlayDom<Node = N> + ?Sized,
    {
        let Some(open) = self.open.take() else {
            return;
        };
        engine.unsubscribe_view_changes(open.subscription);
        dom.unmount(&open.node);
        log::debug!("mapmark: overlay closed for pin {}", open.pin_index);
    }

    /// Re-project the open overlay after camera movement.
    ///
    /// Returns `false` when `subscription` is not the open overlay's, e.g. a
    /// late frame from an overlay that has since been replaced.
    pub fn reposition<E, D>(&self, subscription: SubscriptionId, engine: &E, dom: &mut D) -> bool
    where
        E: MapEngine + ?Sized,
        D: OverlayDom<Node = N> + ?Sized,
    {
        let Some(open) = self.open.as_ref().filter(|o| o.subscription == subscription) else {
            return false;
        };
        dom.place(&open.node, engine.project(open.position), &open.transform);
        true
    }
}

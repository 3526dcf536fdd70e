#![allow(clippy::float_cmp)]

use super::*;
use crate::geo::{LngLat, PixelOffset};
use crate::pin::Anchor;
use crate::testkit::FakeEngine;

fn pin(index: usize, lng: f64, lat: f64, popup: Option<&str>) -> PinRecord {
    PinRecord {
        index,
        position: LngLat::new(lng, lat),
        icon: None,
        popup: popup.map(str::to_owned),
        anchor: Anchor::TopLeft,
        offset: PixelOffset::new(4.0, 4.0),
    }
}

fn config(mode: PopupMode) -> MapConfig {
    MapConfig { popup_mode: mode, ..MapConfig::default() }
}

#[test]
fn native_spec_carries_popup_with_anchor_and_offset() {
    let spec = marker_spec(&pin(0, 1.0, 2.0, Some("<b>x</b>")), PopupMode::Native);
    let popup = spec.popup.unwrap();
    assert_eq!(popup.html, "<b>x</b>");
    assert_eq!(popup.anchor, Anchor::TopLeft);
    assert_eq!(popup.offset, PixelOffset::new(4.0, 4.0));
    assert!(!spec.report_clicks);
}

#[test]
fn custom_spec_reports_clicks_instead() {
    let spec = marker_spec(&pin(0, 1.0, 2.0, Some("x")), PopupMode::Custom);
    assert!(spec.popup.is_none());
    assert!(spec.report_clicks);
}

#[test]
fn empty_popup_never_opens_anything() {
    for mode in [PopupMode::Native, PopupMode::Custom] {
        let spec = marker_spec(&pin(0, 1.0, 2.0, None), mode);
        assert!(spec.popup.is_none());
        assert!(!spec.report_clicks);
    }
}

#[test]
fn icon_replaces_default_graphic() {
    let mut p = pin(0, 1.0, 2.0, None);
    p.icon = Some("/pin.svg".into());
    let spec = marker_spec(&p, PopupMode::Native);
    let icon = spec.icon.unwrap();
    assert_eq!(icon.url, "/pin.svg");
    assert_eq!(icon.width_px, 30.0);
}

#[test]
fn place_adds_one_marker_per_pin_and_accumulates_bounds() {
    let mut engine = FakeEngine::new();
    let pins = [pin(0, -1.0, 5.0, None), pin(1, 3.0, -2.0, None)];
    let mode = MarkerMode::place(&mut engine, &pins, &config(PopupMode::Native));
    assert_eq!(engine.markers().len(), 2);
    let bounds = mode.bounds().unwrap();
    assert_eq!(bounds.sw, LngLat::new(-1.0, -2.0));
    assert_eq!(bounds.ne, LngLat::new(3.0, 5.0));
}

#[test]
fn place_without_pins_has_no_bounds() {
    let mut engine = FakeEngine::new();
    let mode = MarkerMode::place(&mut engine, &[], &config(PopupMode::Native));
    assert!(mode.bounds().is_none());
}

#[test]
fn custom_mode_maps_markers_to_pins() {
    let mut engine = FakeEngine::new();
    let pins = [pin(4, 0.0, 0.0, None), pin(7, 0.0, 0.0, Some("x"))];
    let mode = MarkerMode::place(&mut engine, &pins, &config(PopupMode::Custom));
    assert_eq!(mode.pin_for(MarkerId(0)), None);
    assert_eq!(mode.pin_for(MarkerId(1)), Some(7));
}

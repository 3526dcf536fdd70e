#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::geo::PixelOffset;
use crate::pin::Anchor;
use crate::testkit::{Call, FakeEngine};

// =============================================================
// Helpers
// =============================================================

fn pin(index: usize, icon: Option<&str>) -> PinRecord {
    PinRecord {
        index,
        position: LngLat::new(index as f64, 0.0),
        icon: icon.map(str::to_owned),
        popup: Some(format!("<p>pin {index}</p>")),
        anchor: Anchor::Bottom,
        offset: PixelOffset::new(0.0, -10.0),
    }
}

fn config() -> MapConfig {
    MapConfig { token: "pk".into(), ..MapConfig::default() }
}

fn feature(id: &str) -> ClickedFeature {
    let mut props = serde_json::Map::new();
    props.insert("id".into(), json!(id));
    ClickedFeature::new(LngLat::new(1.0, 2.0), props)
}

fn cluster_feature(cluster_id: u64) -> ClickedFeature {
    let mut props = serde_json::Map::new();
    props.insert("cluster_id".into(), json!(cluster_id));
    props.insert("point_count".into(), json!(4));
    ClickedFeature::new(LngLat::new(3.0, 4.0), props)
}

// =============================================================
// Identifiers
// =============================================================

#[test]
fn ids_are_namespaced_by_map() {
    let a = ClusterIds::for_map(0);
    let b = ClusterIds::for_map(1);
    assert_eq!(a.source, "pins-0");
    assert_eq!(a.clusters, "clusters-0");
    assert_eq!(a.count, "cluster-count-0");
    assert_eq!(a.unclustered, "unclustered-0");
    assert_ne!(a.source, b.source);
    assert_ne!(a.unclustered, b.unclustered);
    assert_ne!(icon_name(0, 0), icon_name(1, 0));
}

#[test]
fn feature_id_round_trips() {
    assert_eq!(feature_id(2, 7), "2_7");
    assert_eq!(parse_feature_id("2_7"), Some((2, 7)));
    assert_eq!(parse_feature_id("nope"), None);
    assert_eq!(parse_feature_id("a_1"), None);
}

// =============================================================
// Radius step function
// =============================================================

#[test]
fn radius_steps_are_lower_edge_inclusive() {
    assert_eq!(cluster_radius(2), 15.0);
    assert_eq!(cluster_radius(5), 15.0);
    assert_eq!(cluster_radius(9), 15.0);
    assert_eq!(cluster_radius(10), 20.0);
    assert_eq!(cluster_radius(29), 20.0);
    assert_eq!(cluster_radius(30), 25.0);
    assert_eq!(cluster_radius(1000), 25.0);
}

#[test]
fn radius_expression_matches_step_function() {
    assert_eq!(radius_expression(), json!(["step", ["get", "point_count"], 15.0, 10, 20.0, 30, 25.0]));
}

// =============================================================
// Icons
// =============================================================

#[test]
fn icon_plan_dedupes_in_first_seen_order() {
    let pins = [pin(0, Some("a.png")), pin(1, None), pin(2, Some("b.png")), pin(3, Some("a.png"))];
    let plan = IconPlan::new(4, &pins);
    let entries: Vec<(&str, &str)> = plan.iter().collect();
    assert_eq!(entries, vec![("a.png", "img-4-0"), ("b.png", "img-4-1")]);
    assert_eq!(plan.image_for(&pins[3]), "img-4-0");
    assert_eq!(plan.image_for(&pins[1]), DEFAULT_ICON_NAME);
}

#[test]
fn barrier_opens_once_on_last_settle() {
    let plan = IconPlan::new(0, &[pin(0, Some("a")), pin(1, Some("b")), pin(2, Some("c"))]);
    let mut barrier = IconBarrier::new(&plan);
    assert!(!barrier.settle("b"));
    assert!(!barrier.settle("b"));
    assert!(!barrier.settle("unknown"));
    assert!(!barrier.settle("a"));
    assert_eq!(barrier.remaining(), 1);
    assert!(barrier.settle("c"));
    assert!(!barrier.settle("c"));
}

// =============================================================
// Source and layers
// =============================================================

#[test]
fn source_carries_cluster_params_and_feature_ids() {
    let pins = [pin(0, None), pin(3, Some("x.png"))];
    let plan = IconPlan::new(1, &pins);
    let options = ClusterOptions { radius: 70, max_zoom: 12.0, ..ClusterOptions::default() };
    let src = source(1, &pins, &plan, &options);

    assert_eq!(src["type"], "geojson");
    assert_eq!(src["cluster"], true);
    assert_eq!(src["clusterRadius"], 70);
    assert_eq!(src["clusterMaxZoom"], 12.0);
    let features = src["data"]["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[1]["properties"]["id"], "1_3");
    assert_eq!(features[1]["properties"]["icon"], "img-1-0");
    assert_eq!(features[0]["properties"]["icon"], DEFAULT_ICON_NAME);
    assert_eq!(features[1]["geometry"]["coordinates"], json!([3.0, 0.0]));
}

#[test]
fn circle_layer_uses_color_and_steps() {
    let options = ClusterOptions { color: "#ff0000".into(), ..ClusterOptions::default() };
    let layer = circle_layer(&ClusterIds::for_map(0), &options);
    assert_eq!(layer["type"], "circle");
    assert_eq!(layer["filter"], json!(["has", "point_count"]));
    assert_eq!(layer["paint"]["circle-color"], "#ff0000");
    assert_eq!(layer["paint"]["circle-radius"], radius_expression());
    assert_eq!(layer["paint"]["circle-opacity"], 0.85);
}

#[test]
fn count_layer_uses_text_settings() {
    let options = ClusterOptions { text_color: "#000".into(), text_size: 16.0, ..ClusterOptions::default() };
    let layer = count_layer(&ClusterIds::for_map(0), &options);
    assert_eq!(layer["layout"]["text-size"], 16.0);
    assert_eq!(layer["layout"]["text-font"], json!(["Open Sans Bold"]));
    assert_eq!(layer["paint"]["text-color"], "#000");
}

#[test]
fn unclustered_layer_reads_icon_property() {
    let layer = unclustered_layer(&ClusterIds::for_map(0));
    assert_eq!(layer["layout"]["icon-image"], json!(["get", "icon"]));
    assert_eq!(layer["filter"], json!(["!", ["has", "point_count"]]));
}

// =============================================================
// State machine
// =============================================================

#[test]
fn load_without_icons_finalizes_immediately() {
    let pins = [pin(0, None), pin(1, None)];
    let mut mode = ClusterMode::new(0, &pins);
    let mut engine = FakeEngine::new();
    assert!(mode.on_style_loaded(&mut engine, &config(), &pins));

    assert!(mode.is_ready());
    assert_eq!(engine.layer_ids(), vec!["clusters-0", "cluster-count-0", "unclustered-0"]);
    assert_eq!(engine.count(|c| matches!(c, Call::ListenLayer(_))), 2);
    assert_eq!(engine.count(|c| matches!(c, Call::DotImage { .. })), 1);
}

#[test]
fn default_dot_is_not_registered_twice() {
    let pins = [pin(0, None)];
    let mut mode = ClusterMode::new(0, &pins);
    let mut engine = FakeEngine::new();
    engine.register_image(DEFAULT_ICON_NAME);
    mode.on_style_loaded(&mut engine, &config(), &pins);
    assert_eq!(engine.count(|c| matches!(c, Call::DotImage { .. })), 0);
}

#[test]
fn repeated_load_is_ignored() {
    let pins = [pin(0, None)];
    let mut mode = ClusterMode::new(0, &pins);
    let mut engine = FakeEngine::new();
    mode.on_style_loaded(&mut engine, &config(), &pins);
    assert!(!mode.on_style_loaded(&mut engine, &config(), &pins));
    assert_eq!(engine.count(|c| matches!(c, Call::Source { .. })), 1);
}

#[test]
fn unclustered_layer_waits_for_all_icons() {
    let pins = [pin(0, Some("a.png")), pin(1, Some("b.png"))];
    let mut mode = ClusterMode::new(0, &pins);
    let mut engine = FakeEngine::new();
    mode.on_style_loaded(&mut engine, &config(), &pins);

    assert_eq!(engine.count(|c| matches!(c, Call::LoadImage { .. })), 2);
    assert_eq!(engine.layer_ids(), vec!["clusters-0", "cluster-count-0"]);
    assert!(!mode.is_ready());

    mode.on_icon_settled(&mut engine, &config(), "b.png", Ok(()));
    assert!(!mode.is_ready());
    assert_eq!(engine.count(|c| matches!(c, Call::ListenLayer(_))), 0);

    mode.on_icon_settled(&mut engine, &config(), "a.png", Ok(()));
    assert!(mode.is_ready());
    assert_eq!(engine.layer_ids(), vec!["clusters-0", "cluster-count-0", "unclustered-0"]);
    assert_eq!(engine.count(|c| matches!(c, Call::ListenLayer(_))), 2);
}

#[test]
fn failed_icon_falls_back_to_dot_under_its_name() {
    let pins = [pin(0, Some("gone.png"))];
    let mut mode = ClusterMode::new(3, &pins);
    let mut engine = FakeEngine::new();
    mode.on_style_loaded(&mut engine, &config(), &pins);
    let failure = ResourceError::IconLoad { url: "gone.png".into(), reason: "404".into() };
    mode.on_icon_settled(&mut engine, &config(), "gone.png", Err(failure));

    assert!(mode.is_ready());
    assert!(engine.calls.iter().any(|c| matches!(c, Call::DotImage { name, .. } if name == "img-3-0")));
}

#[test]
fn icon_settled_before_load_is_ignored() {
    let pins = [pin(0, Some("a.png"))];
    let mut mode = ClusterMode::new(0, &pins);
    let mut engine = FakeEngine::new();
    mode.on_icon_settled(&mut engine, &config(), "a.png", Ok(()));
    assert!(engine.calls.is_empty());
}

// =============================================================
// Click routing
// =============================================================

#[test]
fn cluster_click_expands() {
    let mode = ClusterMode::new(0, &[]);
    assert_eq!(
        mode.route_click("clusters-0", &cluster_feature(42)),
        ClusterClick::Expand { cluster_id: 42, center: LngLat::new(3.0, 4.0) }
    );
}

#[test]
fn point_click_resolves_pin() {
    let mode = ClusterMode::new(2, &[]);
    assert_eq!(mode.route_click("unclustered-2", &feature("2_5")), ClusterClick::Point { pin_index: 5 });
}

#[test]
fn point_click_from_other_map_is_ignored() {
    let mode = ClusterMode::new(2, &[]);
    assert_eq!(mode.route_click("unclustered-2", &feature("1_5")), ClusterClick::Ignored);
}

#[test]
fn click_on_foreign_layer_is_ignored() {
    let mode = ClusterMode::new(0, &[]);
    assert_eq!(mode.route_click("clusters-1", &cluster_feature(1)), ClusterClick::Ignored);
}

#[test]
fn expansion_zoom_eases_camera() {
    let mode = ClusterMode::new(0, &[]);
    let mut engine = FakeEngine::new();
    mode.on_expansion_zoom(&mut engine, LngLat::new(1.0, 1.0), Ok(9.0));
    assert_eq!(engine.calls, vec![Call::EaseTo { center: LngLat::new(1.0, 1.0), zoom: 9.0 }]);
}

#[test]
fn expansion_zoom_error_is_swallowed() {
    let mode = ClusterMode::new(0, &[]);
    let mut engine = FakeEngine::new();
    let err = ResourceError::ExpansionZoom { cluster_id: 1, reason: "gone".into() };
    mode.on_expansion_zoom(&mut engine, LngLat::new(1.0, 1.0), Err(err));
    assert!(engine.calls.is_empty());
}

#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// LngLat
// =============================================================

#[test]
fn lng_lat_serializes_lng_first() {
    let p = LngLat::new(13.4, 52.5);
    assert_eq!(serde_json::to_string(&p).unwrap(), "[13.4,52.5]");
}

#[test]
fn lng_lat_deserializes_from_array() {
    let p: LngLat = serde_json::from_str("[-0.12, 51.5]").unwrap();
    assert_eq!(p, LngLat::new(-0.12, 51.5));
}

#[test]
fn lng_lat_rejects_wrong_arity() {
    assert!(serde_json::from_str::<LngLat>("[1.0]").is_err());
    assert!(serde_json::from_str::<LngLat>("[1.0, 2.0, 3.0]").is_err());
}

// =============================================================
// LngLatBounds
// =============================================================

#[test]
fn bounds_from_no_points_is_none() {
    assert!(LngLatBounds::from_points(Vec::<LngLat>::new()).is_none());
}

#[test]
fn bounds_from_single_point_is_degenerate() {
    let p = LngLat::new(5.0, 6.0);
    let b = LngLatBounds::from_points([p]).unwrap();
    assert_eq!(b.sw, p);
    assert_eq!(b.ne, p);
}

#[test]
fn bounds_cover_all_points() {
    let b = LngLatBounds::from_points([
        LngLat::new(2.0, -1.0),
        LngLat::new(-3.0, 4.0),
        LngLat::new(1.0, 0.5),
    ])
    .unwrap();
    assert_eq!(b.sw, LngLat::new(-3.0, -1.0));
    assert_eq!(b.ne, LngLat::new(2.0, 4.0));
}

#[test]
fn bounds_extend_is_monotonic() {
    let mut b = LngLatBounds::around(LngLat::new(0.0, 0.0));
    b.extend(LngLat::new(1.0, 1.0));
    b.extend(LngLat::new(0.5, 0.5));
    assert_eq!(b.to_array(), [[0.0, 0.0], [1.0, 1.0]]);
}

// =============================================================
// PixelOffset
// =============================================================

#[test]
fn pixel_offset_from_tuple() {
    let o = PixelOffset::from((3.0, -4.0));
    assert_eq!(o, PixelOffset::new(3.0, -4.0));
}

#[test]
fn pixel_offset_default_is_zero() {
    assert_eq!(PixelOffset::default(), PixelOffset::new(0.0, 0.0));
}

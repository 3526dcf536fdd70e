#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// parse_number
// =============================================================

#[test]
fn number_trims_whitespace() {
    assert_eq!(parse_number("  12.5 "), Some(12.5));
}

#[test]
fn number_accepts_sign_and_exponent() {
    assert_eq!(parse_number("-3"), Some(-3.0));
    assert_eq!(parse_number("1e2"), Some(100.0));
}

#[test]
fn number_rejects_garbage() {
    assert_eq!(parse_number(""), None);
    assert_eq!(parse_number("abc"), None);
    assert_eq!(parse_number("12px"), None);
}

#[test]
fn number_rejects_non_finite() {
    assert_eq!(parse_number("NaN"), None);
    assert_eq!(parse_number("inf"), None);
    assert_eq!(parse_number("-infinity"), None);
}

// =============================================================
// parse_coordinate_pair
// =============================================================

#[test]
fn pair_swaps_to_lng_lat() {
    let p = parse_coordinate_pair("52.5,13.4").unwrap();
    assert_eq!(p, LngLat::new(13.4, 52.5));
}

#[test]
fn pair_accepts_any_separator_mix() {
    let expected = Some(LngLat::new(2.0, 1.0));
    for text in ["1,2", "1 2", "1, 2", " 1 ,\t2 ", "1\n2"] {
        assert_eq!(parse_coordinate_pair(text), expected, "input {text:?}");
    }
}

#[test]
fn pair_drops_non_numeric_tokens() {
    assert_eq!(parse_coordinate_pair("lat 1, lng 2"), Some(LngLat::new(2.0, 1.0)));
}

#[test]
fn pair_rejects_wrong_token_count() {
    assert_eq!(parse_coordinate_pair(""), None);
    assert_eq!(parse_coordinate_pair("1"), None);
    assert_eq!(parse_coordinate_pair("1,2,3"), None);
    assert_eq!(parse_coordinate_pair("north, south"), None);
}

#[test]
fn pair_swaps_for_every_two_number_input() {
    let samples = [(0.0, 0.0), (-33.9, 151.2), (90.0, -180.0), (1e-3, 4e1)];
    for (a, b) in samples {
        for sep in [",", " ", " , ", "\t"] {
            let text = format!("{a}{sep}{b}");
            assert_eq!(parse_coordinate_pair(&text), Some(LngLat::new(b, a)), "input {text:?}");
        }
    }
}

// =============================================================
// parse_offset_pair
// =============================================================

#[test]
fn offset_keeps_authored_order() {
    assert_eq!(parse_offset_pair("4,-12"), Some(PixelOffset::new(4.0, -12.0)));
}

#[test]
fn offset_rejects_single_value() {
    assert_eq!(parse_offset_pair("10"), None);
}

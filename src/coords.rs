//! Tolerant parsing of authored numbers and number pairs.
//!
//! Authored text is free-form: `"52.5, 13.4"`, `"52.5 13.4"` and
//! `"52.5,13.4"` all mean the same pair. Tokens that are not finite
//! numbers are dropped. A pair is accepted only when exactly two numbers
//! remain; anything else is `None`, never a panic.

#[cfg(test)]
#[path = "coords_test.rs"]
mod coords_test;

use crate::geo::{LngLat, PixelOffset};

/// Parse one finite number, ignoring surrounding whitespace.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}

/// Every finite number in `text`, split on commas and whitespace.
fn numeric_tokens(text: &str) -> Vec<f64> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .filter_map(parse_number)
        .collect()
}

fn parse_pair(text: &str) -> Option<(f64, f64)> {
    match numeric_tokens(text)[..] {
        [a, b] => Some((a, b)),
        _ => None,
    }
}

/// Parse authored `"lat,lng"` text into engine order.
#[must_use]
pub fn parse_coordinate_pair(text: &str) -> Option<LngLat> {
    let (lat, lng) = parse_pair(text)?;
    Some(LngLat::new(lng, lat))
}

/// Parse authored `"x,y"` pixel offset text.
#[must_use]
pub fn parse_offset_pair(text: &str) -> Option<PixelOffset> {
    let (x, y) = parse_pair(text)?;
    Some(PixelOffset::new(x, y))
}

//! Library-wide defaults and fixed rendering constants.

// ── Map defaults ────────────────────────────────────────────────

/// Style used when neither the page nor the map names one.
pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/streets-v12";

/// Initial zoom level.
pub const DEFAULT_ZOOM: f64 = 12.0;

/// Padding in pixels around the pins when framing the initial view.
pub const DEFAULT_FIT_PADDING: f64 = 60.0;

/// Zoom ceiling for the initial framing, so a single pin doesn't zoom to street level.
pub const DEFAULT_FIT_MAX_ZOOM: f64 = 15.0;

// ── Popups ──────────────────────────────────────────────────────

/// Default popup offset in pixels. Negative y lifts the popup off the pin.
pub const DEFAULT_POPUP_OFFSET: (f64, f64) = (0.0, -10.0);

/// Default stacking order for custom overlays.
pub const DEFAULT_POPUP_Z_INDEX: i32 = 10;

/// Marker class carried by every custom overlay node.
pub const OVERLAY_CLASS: &str = "mapmark-overlay";

/// Class of the close button appended to each overlay.
pub const OVERLAY_CLOSE_CLASS: &str = "mapmark-overlay__close";

// ── Clustering ──────────────────────────────────────────────────

pub const DEFAULT_CLUSTER_RADIUS: u32 = 50;
pub const DEFAULT_CLUSTER_MAX_ZOOM: f64 = 14.0;
pub const DEFAULT_CLUSTER_COLOR: &str = "#3b82f6";
pub const DEFAULT_CLUSTER_TEXT_COLOR: &str = "#ffffff";
pub const DEFAULT_CLUSTER_TEXT_SIZE: f64 = 12.0;

/// Cluster circle radius below the first step.
pub const CLUSTER_BASE_RADIUS: f64 = 15.0;

/// `(min point count, radius)` steps; each applies from its count upward.
pub const CLUSTER_RADIUS_STEPS: [(u64, f64); 2] = [(10, 20.0), (30, 25.0)];

pub const CLUSTER_CIRCLE_OPACITY: f64 = 0.85;
pub const CLUSTER_FONT: &str = "Open Sans Bold";

// ── Icons ───────────────────────────────────────────────────────

/// Image name of the lazily drawn fallback dot.
pub const DEFAULT_ICON_NAME: &str = "default-dot";

/// Canvas edge length of the fallback dot, in device pixels.
pub const DEFAULT_ICON_SIZE_PX: u32 = 32;

/// Radius of the filled circle inside the fallback dot.
pub const DEFAULT_ICON_RADIUS_PX: f64 = 10.0;

/// Pixel ratio the fallback dot is registered with.
pub const DEFAULT_ICON_PIXEL_RATIO: f64 = 2.0;

/// Rendered width of a custom marker image.
pub const MARKER_ICON_WIDTH_PX: f64 = 30.0;

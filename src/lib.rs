//! Declarative map widgets configured entirely from HTML attributes.
//!
//! Authors mark a container with `data-mapbox` and put pin elements inside it
//! carrying `data-pin-lat` / `data-pin-lng`; each pin's inner markup becomes
//! its popup. This crate turns every such container into an independent
//! interactive map: it resolves layered configuration, validates pins,
//! chooses between discrete markers and clustering, frames the viewport, and
//! keeps custom popup overlays glued to their coordinates as the camera moves.
//!
//! Everything except `web` is browser-independent. The mapping engine and
//! the overlay DOM are reached through the [`engine::MapEngine`] and
//! [`overlay::OverlayDom`] traits, and asynchronous completions come back as
//! [`engine::MapEvent`]s, so the whole widget runs under `cargo test`.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`page`] | Page driver: one instance per map root, failures isolated |
//! | [`instance`] | One live map and its event handling |
//! | [`config`] | Layered configuration cascade |
//! | [`attrs`] | Attribute names and the element snapshots the widget reads |
//! | [`pin`] | Pin validation and popup anchors |
//! | [`coords`] | Lenient numeric and coordinate-pair parsing |
//! | [`center`] | Initial center when none is configured |
//! | [`marker`] | Discrete marker rendering |
//! | [`cluster`] | Clustered source, layers, icon loading and click routing |
//! | [`fit`] | Initial viewport framing |
//! | [`overlay`] | Custom popup overlay lifecycle and positioning |
//! | [`engine`] | Engine seam, options and events |
//! | [`geo`] | Coordinates, screen points and bounds |
//! | [`error`] | Error taxonomy |
//! | [`consts`] | Library defaults |
//! | `web` | Browser bindings (feature `web`) |

pub mod attrs;
pub mod center;
pub mod cluster;
pub mod config;
pub mod consts;
pub mod coords;
pub mod engine;
pub mod error;
pub mod fit;
pub mod geo;
pub mod instance;
pub mod marker;
pub mod overlay;
pub mod page;
pub mod pin;

#[cfg(feature = "web")]
pub mod web;

#[cfg(test)]
mod testkit;

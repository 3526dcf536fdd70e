//! Page-level driver: one map instance per map root, in document order.

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use crate::attrs::MapElement;
use crate::config::PageSnapshot;
use crate::engine::MapEngine;
use crate::instance::{MapInstance, MapPlan};
use crate::overlay::OverlayDom;

/// Plan every map root on the page, skipping the ones that cannot be configured.
///
/// Indices are positions among all map roots, so identifiers stay stable
/// even when an earlier map is skipped.
#[must_use]
pub fn plan_page(page: &PageSnapshot, elements: &[MapElement]) -> Vec<MapPlan> {
    elements
        .iter()
        .enumerate()
        .filter_map(|(index, el)| match MapPlan::prepare(page, index, el) {
            Ok(plan) => Some(plan),
            Err(e) => {
                log::error!("mapmark: map {index}: {e}; skipping");
                None
            }
        })
        .collect()
}

/// Build every configurable map, asking `create` for each one's engine and overlay DOM.
pub fn build_page<E, D, F>(page: &PageSnapshot, elements: &[MapElement], mut create: F) -> Vec<MapInstance<E, D>>
where
    E: MapEngine,
    D: OverlayDom,
    F: FnMut(&MapPlan) -> (E, D),
{
    let instances: Vec<_> = plan_page(page, elements)
        .into_iter()
        .map(|plan| {
            let (engine, dom) = create(&plan);
            plan.build(engine, dom)
        })
        .collect();
    log::info!("mapmark: initialized {} of {} maps", instances.len(), elements.len());
    instances
}

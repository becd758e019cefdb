//! Click attribution and hover timing.

use crate::tree::ElementTree;
use ninetailed_types::{ElementId, InteractionId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "input", "select", "textarea", "summary", "details", "label",
];

/// Returns true if `element` reacts to clicks and is not `aria-disabled`.
pub fn is_clickable<T: ElementTree + ?Sized>(tree: &T, element: ElementId) -> bool {
    if tree.attribute(element, "aria-disabled").as_deref() == Some("true") {
        return false;
    }
    let interactive_tag = tree
        .tag_name(element)
        .is_some_and(|t| INTERACTIVE_TAGS.contains(&t.as_str()));
    interactive_tag || tree.attribute(element, "data-nt-clickable").as_deref() == Some("true")
}

/// Resolves which tracked elements a click on `target` counts for.
///
/// Walks from `target` to the root. A tracked element on the way is
/// returned if some node between the target and that element (both
/// inclusive) is clickable. Nested tracked elements are all returned,
/// innermost first.
pub fn resolve_click_targets<T, F>(tree: &T, target: ElementId, is_tracked: F) -> Vec<ElementId>
where
    T: ElementTree + ?Sized,
    F: Fn(ElementId) -> bool,
{
    let mut hits = Vec::new();
    if !tree.contains(target) {
        return hits;
    }

    let mut clickable_on_path = false;
    let mut current = Some(target);
    while let Some(node) = current {
        clickable_on_path |= is_clickable(tree, node);
        if clickable_on_path && is_tracked(node) {
            hits.push(node);
        }
        current = tree.parent(node);
    }
    hits
}

/// A finished hover cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverSample {
    pub element: ElementId,
    pub duration: Duration,
    /// Fresh for every cycle.
    pub interaction_id: InteractionId,
}

/// Measures how long the pointer stays over elements.
#[derive(Debug, Default)]
pub struct HoverTracker {
    started: HashMap<ElementId, Instant>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the clock for `element`. A second enter without a leave keeps
    /// the original start.
    pub fn enter(&mut self, element: ElementId) {
        self.started.entry(element).or_insert_with(Instant::now);
    }

    /// Stops the clock and returns the sample, or `None` without a
    /// matching enter.
    pub fn leave(&mut self, element: ElementId) -> Option<HoverSample> {
        let started = self.started.remove(&element)?;
        Some(HoverSample {
            element,
            duration: started.elapsed(),
            interaction_id: InteractionId::new(),
        })
    }

    pub fn is_hovering(&self, element: ElementId) -> bool {
        self.started.contains_key(&element)
    }

    /// Drops a running hover without emitting it.
    pub fn forget(&mut self, element: ElementId) {
        self.started.remove(&element);
    }
}

//! Payload registry for observed elements.

use ninetailed_types::ElementId;
use std::collections::HashMap;
use std::time::Duration;

/// Per-observation options supplied by the rendering layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub track_clicks: bool,
    pub track_hovers: bool,
    /// View threshold for this element in place of the configured one.
    pub delay: Option<Duration>,
}

/// Everything registered for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementEntry<P> {
    pub payloads: Vec<P>,
    pub track_clicks: bool,
    pub track_hovers: bool,
    /// Per-element view delay; the latest registration that set one wins.
    pub view_delay: Option<Duration>,
}

impl<P> Default for ElementEntry<P> {
    fn default() -> Self {
        Self {
            payloads: Vec::new(),
            track_clicks: false,
            track_hovers: false,
            view_delay: None,
        }
    }
}

/// Maps elements to the distinct payloads they carry.
#[derive(Debug, Clone)]
pub struct ObservedElements<P> {
    entries: HashMap<ElementId, ElementEntry<P>>,
}

impl<P> Default for ObservedElements<P> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<P: PartialEq> ObservedElements<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `payload` for `element`.
    ///
    /// Returns `false` without changing anything if a deep-equal payload is
    /// already registered. Interaction tracking flags accumulate across
    /// registrations.
    pub fn insert(&mut self, element: ElementId, payload: P, options: ObserveOptions) -> bool {
        let entry = self.entries.entry(element).or_default();
        if entry.payloads.contains(&payload) {
            return false;
        }
        entry.payloads.push(payload);
        entry.track_clicks |= options.track_clicks;
        entry.track_hovers |= options.track_hovers;
        if options.delay.is_some() {
            entry.view_delay = options.delay;
        }
        true
    }

    pub fn get(&self, element: ElementId) -> Option<&ElementEntry<P>> {
        self.entries.get(&element)
    }

    pub fn payloads(&self, element: ElementId) -> &[P] {
        self.entries
            .get(&element)
            .map(|e| e.payloads.as_slice())
            .unwrap_or_default()
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.entries.contains_key(&element)
    }

    pub fn tracks_clicks(&self, element: ElementId) -> bool {
        self.entries.get(&element).is_some_and(|e| e.track_clicks)
    }

    pub fn view_delay(&self, element: ElementId) -> Option<Duration> {
        self.entries.get(&element).and_then(|e| e.view_delay)
    }

    pub fn tracks_hovers(&self, element: ElementId) -> bool {
        self.entries.get(&element).is_some_and(|e| e.track_hovers)
    }

    /// Purges the element. Returns its entry if it was registered.
    pub fn remove(&mut self, element: ElementId) -> Option<ElementEntry<P>> {
        self.entries.remove(&element)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

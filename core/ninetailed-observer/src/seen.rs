//! Dwell-time observation.
//!
//! Each observed element carries a set of delays. While the host reports
//! the element as intersecting, one timer per delay is armed; leaving the
//! viewport cancels all of them, so a delay only fires after one continuous
//! visible interval. Every timer fires at most once per intersection cycle.

use ninetailed_types::ElementId;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Invoked with the element and the delay that elapsed.
pub type SeenCallback = Arc<dyn Fn(ElementId, Duration) + Send + Sync>;

#[derive(Default)]
struct ElementState {
    delays: BTreeSet<Duration>,
    /// Set while intersecting; identifies the current cycle.
    cycle: Option<u64>,
    fired: HashSet<Duration>,
    timers: Vec<JoinHandle<()>>,
}

impl ElementState {
    fn cancel_timers(&mut self) {
        for timer in self.timers.drain(..) {
            timer.abort();
        }
    }
}

#[derive(Default)]
struct Inner {
    elements: HashMap<ElementId, ElementState>,
    next_cycle: u64,
}

/// Tracks how long elements stay visible.
///
/// Cloning yields another handle to the same observer.
#[derive(Clone)]
pub struct ElementSeenObserver {
    inner: Arc<Mutex<Inner>>,
    on_seen: SeenCallback,
    runtime: Option<Handle>,
}

impl std::fmt::Debug for ElementSeenObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementSeenObserver")
            .field("observed", &self.lock().elements.len())
            .finish()
    }
}

impl ElementSeenObserver {
    /// Creates an observer that spawns its timers on the current tokio runtime.
    ///
    /// Outside a runtime the observer still tracks registrations but never
    /// arms timers.
    pub fn new(on_seen: SeenCallback) -> Self {
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            warn!("no tokio runtime available, dwell timers are disabled");
        }
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            on_seen,
            runtime,
        }
    }

    pub fn with_runtime(on_seen: SeenCallback, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            on_seen,
            runtime: Some(runtime),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking callback never runs under the lock, so the data is
        // still consistent after poisoning.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds `delay` to the element's delay set.
    ///
    /// If the element is already intersecting, the new delay starts counting
    /// immediately.
    pub fn observe(&self, element: ElementId, delay: Duration) {
        let mut inner = self.lock();
        let state = inner.elements.entry(element).or_default();
        if !state.delays.insert(delay) {
            return;
        }
        if let Some(cycle) = state.cycle {
            let timer = self.arm(element, delay, cycle);
            state.timers.extend(timer);
        }
    }

    /// Drops every delay and pending timer of the element.
    pub fn unobserve(&self, element: ElementId) {
        if let Some(mut state) = self.lock().elements.remove(&element) {
            state.cancel_timers();
            debug!(%element, "unobserved element");
        }
    }

    /// Applies a visibility report from the host.
    ///
    /// Reports for elements that are not observed are ignored.
    pub fn on_intersection(&self, element: ElementId, is_intersecting: bool) {
        let mut inner = self.lock();
        let cycle = inner.next_cycle;
        let Some(state) = inner.elements.get_mut(&element) else {
            return;
        };

        if !is_intersecting {
            state.cancel_timers();
            state.cycle = None;
            return;
        }
        if state.cycle.is_some() {
            return;
        }

        state.cycle = Some(cycle);
        state.fired.clear();
        let delays: Vec<Duration> = state.delays.iter().copied().collect();
        for delay in delays {
            let timer = self.arm(element, delay, cycle);
            state.timers.extend(timer);
        }
        inner.next_cycle += 1;
    }

    pub fn is_observed(&self, element: ElementId) -> bool {
        self.lock().elements.contains_key(&element)
    }

    pub fn is_intersecting(&self, element: ElementId) -> bool {
        self.lock()
            .elements
            .get(&element)
            .is_some_and(|s| s.cycle.is_some())
    }

    /// Delays registered for the element, ascending.
    pub fn delays(&self, element: ElementId) -> Vec<Duration> {
        self.lock()
            .elements
            .get(&element)
            .map(|s| s.delays.iter().copied().collect())
            .unwrap_or_default()
    }

    fn arm(&self, element: ElementId, delay: Duration, cycle: u64) -> Option<JoinHandle<()>> {
        let runtime = self.runtime.as_ref()?;
        let inner = Arc::clone(&self.inner);
        let on_seen = Arc::clone(&self.on_seen);

        Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            // Guard against late firings after unobserve or a new cycle.
            let should_fire = {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                match inner.elements.get_mut(&element) {
                    Some(state) if state.cycle == Some(cycle) => state.fired.insert(delay),
                    _ => false,
                }
            };

            if should_fire {
                debug!(%element, delay_ms = delay.as_millis() as u64, "element seen");
                on_seen(element, delay);
            }
        }))
    }
}

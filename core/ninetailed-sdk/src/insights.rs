//! Exposure telemetry batching.
//!
//! Exposure events collect in a current list. When the events waiting in
//! closed batches plus the current list reach the batch size, the list is
//! closed into a batch for the current profile snapshot and every pending
//! batch is delivered. A profile switch closes the list under the previous
//! profile; page teardown closes it and hands everything to a beacon.

use crate::api::{ApiResult, InsightsBatch, InsightsTransport};
use ninetailed_types::{ElementId, Event, ObservedElementPayload, Profile};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tracing::{debug, warn};

#[derive(Default)]
struct State {
    profile: Option<Profile>,
    current: Vec<Event>,
    /// Events received while no profile is known, oldest first. Holds at
    /// most one batch worth of events.
    waiting: VecDeque<Event>,
    batches: Vec<InsightsBatch>,
    seen_views: HashMap<ElementId, Vec<ObservedElementPayload>>,
}

impl State {
    fn pending_events(&self) -> usize {
        self.batches.iter().map(|b| b.events.len()).sum()
    }

    fn close_current(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let Some(profile) = self.profile.clone() else {
            return;
        };
        let events = std::mem::take(&mut self.current);
        debug!(profile = %profile.id, events = events.len(), "Closed insights batch");
        self.batches.push(InsightsBatch { profile, events });
    }

    fn take_batches(&mut self) -> Vec<InsightsBatch> {
        self.close_current();
        std::mem::take(&mut self.batches)
    }
}

/// Batches exposure events per profile for the insights API.
///
/// Cloning yields another handle to the same batcher.
#[derive(Clone)]
pub struct InsightsBatcher {
    state: Arc<Mutex<State>>,
    transport: Arc<dyn InsightsTransport>,
    batch_size: usize,
}

impl std::fmt::Debug for InsightsBatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("InsightsBatcher")
            .field("batch_size", &self.batch_size)
            .field("current", &state.current.len())
            .field("batches", &state.batches.len())
            .finish()
    }
}

impl InsightsBatcher {
    pub fn new(transport: Arc<dyn InsightsTransport>, batch_size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            transport,
            batch_size: batch_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Updates the profile snapshot events are batched under.
    ///
    /// Switching to a different profile id closes the current list under
    /// the previous profile first.
    pub fn set_profile(&self, profile: Option<Profile>) {
        let flush = {
            let mut state = self.lock();
            let switched = match (&state.profile, &profile) {
                (Some(old), Some(new)) => old.id != new.id,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if switched {
                state.close_current();
            }
            state.profile = profile;

            if state.profile.is_some() && !state.waiting.is_empty() {
                let waiting = std::mem::take(&mut state.waiting);
                state.current.extend(waiting);
            }
            self.reached_threshold(&mut state)
        };
        if flush {
            self.spawn_flush();
        }
    }

    /// Adds an exposure event.
    pub fn add(&self, event: Event) {
        let flush = {
            let mut state = self.lock();
            if state.profile.is_none() {
                if state.waiting.len() >= self.batch_size {
                    state.waiting.pop_front();
                    warn!(
                        limit = self.batch_size,
                        "No profile yet, dropping oldest waiting insights event"
                    );
                }
                state.waiting.push_back(event);
                return;
            }
            state.current.push(event);
            self.reached_threshold(&mut state)
        };
        if flush {
            self.spawn_flush();
        }
    }

    /// Adds a view event unless the same payload was already reported as
    /// seen on the element. Returns whether the event was added.
    pub fn add_view(&self, element: ElementId, payload: &ObservedElementPayload, event: Event) -> bool {
        {
            let mut state = self.lock();
            let seen = state.seen_views.entry(element).or_default();
            if seen.contains(payload) {
                return false;
            }
            seen.push(payload.clone());
        }
        self.add(event);
        true
    }

    /// Forgets view dedupe state for an element that is no longer observed.
    pub fn forget_element(&self, element: ElementId) {
        self.lock().seen_views.remove(&element);
    }

    /// Closes the current list when the threshold is reached. Returns true
    /// if a flush is due.
    fn reached_threshold(&self, state: &mut State) -> bool {
        if state.profile.is_none() || state.current.is_empty() {
            return false;
        }
        if state.pending_events() + state.current.len() >= self.batch_size {
            state.close_current();
            return true;
        }
        false
    }

    fn spawn_flush(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no tokio runtime, insights batches stay queued");
            return;
        };
        let this = self.clone();
        runtime.spawn(async move {
            let _ = this.flush().await;
        });
    }

    /// Closes the current list and delivers every pending batch.
    ///
    /// Batches that fail to deliver are dropped.
    pub async fn flush(&self) -> ApiResult<()> {
        let batches = self.lock().take_batches();
        if batches.is_empty() {
            return Ok(());
        }

        let result = self.transport.send_event_batches(&batches).await;
        if let Err(e) = &result {
            if e.is_timeout() {
                warn!("insights delivery timed out");
            } else {
                warn!(error = %e, batches = batches.len(), "insights delivery failed");
            }
        }
        result
    }

    /// Page teardown: closes the current list and beacons every batch.
    pub fn on_page_hide(&self) -> bool {
        let batches = self.lock().take_batches();
        if batches.is_empty() {
            return true;
        }
        debug!(batches = batches.len(), "Sending insights beacon");
        self.transport.send_beacon(batches)
    }

    pub fn current_len(&self) -> usize {
        self.lock().current.len()
    }

    pub fn waiting_len(&self) -> usize {
        self.lock().waiting.len()
    }

    pub fn pending_batches(&self) -> usize {
        self.lock().batches.len()
    }
}

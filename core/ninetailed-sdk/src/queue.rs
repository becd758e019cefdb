//! Profile event queue and throttled flush.

use crate::api::{ApiError, ProfileTransport};
use crate::state::{ProfileState, ProfileStateHub};
use crate::storage::FallbackCache;
use crate::throttle::AsyncThrottle;
use futures::FutureExt;
use ninetailed_types::{Event, MessageId};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Ordered queue of profile-affecting events, unique by message id.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event`, or replaces the queued event with the same message
    /// id in place.
    pub fn push(&mut self, event: Event) {
        match self
            .events
            .iter_mut()
            .find(|e| e.message_id == event.message_id)
        {
            Some(slot) => *slot = event,
            None => self.events.push(event),
        }
    }

    /// Removes and returns every queued event.
    pub fn take_all(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn contains(&self, message_id: MessageId) -> bool {
        self.events.iter().any(|e| e.message_id == message_id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Result of one flush run.
#[derive(Debug, Clone)]
pub enum FlushOutcome {
    /// Nothing was queued; no request was made.
    Empty,
    /// The profile was updated and published.
    Delivered,
    /// The request failed; the fallback state was published.
    Failed(Arc<ApiError>),
}

impl FlushOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

fn lock(queue: &Mutex<EventQueue>) -> MutexGuard<'_, EventQueue> {
    queue.lock().unwrap_or_else(|e| e.into_inner())
}

struct FlushContext {
    queue: Arc<Mutex<EventQueue>>,
    transport: Arc<dyn ProfileTransport>,
    cache: FallbackCache,
    hub: ProfileStateHub,
}

impl FlushContext {
    async fn run(&self) -> FlushOutcome {
        let snapshot = lock(&self.queue).take_all();
        if snapshot.is_empty() {
            return FlushOutcome::Empty;
        }

        let generation = self.cache.generation();
        let anonymous_id = self.cache.anonymous_id();
        debug!(events = snapshot.len(), "Flushing profile events");

        match self
            .transport
            .upsert_profile(anonymous_id.as_deref(), &snapshot)
            .await
        {
            Ok(response) => {
                match self.cache.store_success_in(
                    generation,
                    &response.profile,
                    &response.experiences,
                    &response.changes,
                ) {
                    Ok(true) => {}
                    Ok(false) => info!("Profile was reset during flush, not persisting it"),
                    Err(e) => warn!(error = %e, "failed to persist profile"),
                }
                self.hub.publish(ProfileState::success(
                    response.profile,
                    response.experiences,
                    response.changes,
                ));
                FlushOutcome::Delivered
            }
            Err(e) => {
                let error = Arc::new(e);
                warn!(error = %error, dropped = snapshot.len(), "Profile flush failed");
                self.publish_fallback(Arc::clone(&error));
                FlushOutcome::Failed(error)
            }
        }
    }

    fn publish_fallback(&self, error: Arc<ApiError>) {
        match self.cache.profile() {
            Some(profile) => {
                info!("Using cached profile as fallback");
                self.hub.publish(ProfileState::fallback(
                    profile,
                    self.cache.experiences(),
                    self.cache.changes(),
                    error,
                ));
            }
            None => self.hub.publish(ProfileState::failed(error)),
        }
    }
}

/// Queues profile events and flushes them through an [`AsyncThrottle`].
///
/// Each run takes the whole queue as its snapshot; events queued during a
/// run wait for the next one. Failed snapshots are dropped, not retried.
#[derive(Clone)]
pub struct ProfileFlusher {
    queue: Arc<Mutex<EventQueue>>,
    throttle: AsyncThrottle<FlushOutcome>,
}

impl std::fmt::Debug for ProfileFlusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileFlusher")
            .field("queued", &lock(&self.queue).len())
            .finish()
    }
}

impl ProfileFlusher {
    pub fn new(
        transport: Arc<dyn ProfileTransport>,
        cache: FallbackCache,
        hub: ProfileStateHub,
    ) -> Self {
        let queue = Arc::new(Mutex::new(EventQueue::new()));
        let ctx = Arc::new(FlushContext {
            queue: Arc::clone(&queue),
            transport,
            cache,
            hub,
        });
        let throttle = AsyncThrottle::new(move || {
            let ctx = Arc::clone(&ctx);
            async move { ctx.run().await }.boxed()
        });

        Self { queue, throttle }
    }

    pub fn enqueue(&self, event: Event) {
        lock(&self.queue).push(event);
    }

    /// Requests a flush and waits for the run that serves it.
    ///
    /// `None` means the run was cancelled.
    pub async fn flush(&self) -> Option<FlushOutcome> {
        self.throttle.call().await
    }

    pub fn queued(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn is_flushing(&self) -> bool {
        self.throttle.is_running()
    }
}

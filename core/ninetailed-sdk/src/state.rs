//! Profile state and its subscribers.

use crate::api::ApiError;
use ninetailed_types::{Change, Profile, SelectedVariantInfo};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Lifecycle of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileStatus {
    #[default]
    Loading,
    Success,
    Error,
}

/// Where the published profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateSource {
    #[default]
    Api,
    /// Reused from the fallback cache after a failed flush.
    Fallback,
}

/// What subscribers see.
#[derive(Debug, Clone, Default)]
pub struct ProfileState {
    pub status: ProfileStatus,
    pub profile: Option<Profile>,
    pub experiences: Vec<SelectedVariantInfo>,
    pub changes: Vec<Change>,
    pub error: Option<Arc<ApiError>>,
    pub from: StateSource,
}

impl ProfileState {
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn success(
        profile: Profile,
        experiences: Vec<SelectedVariantInfo>,
        changes: Vec<Change>,
    ) -> Self {
        Self {
            status: ProfileStatus::Success,
            profile: Some(profile),
            experiences,
            changes,
            error: None,
            from: StateSource::Api,
        }
    }

    /// A cached profile republished after `error`.
    pub fn fallback(
        profile: Profile,
        experiences: Vec<SelectedVariantInfo>,
        changes: Vec<Change>,
        error: Arc<ApiError>,
    ) -> Self {
        Self {
            status: ProfileStatus::Success,
            profile: Some(profile),
            experiences,
            changes,
            error: Some(error),
            from: StateSource::Fallback,
        }
    }

    /// No profile is available at all.
    pub fn failed(error: Arc<ApiError>) -> Self {
        Self {
            status: ProfileStatus::Error,
            profile: None,
            experiences: Vec::new(),
            changes: Vec::new(),
            error: Some(error),
            from: StateSource::Api,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == ProfileStatus::Loading
    }
}

/// Invoked with every published state.
pub type Listener = Arc<dyn Fn(&ProfileState) + Send + Sync>;

struct Inner {
    state: ProfileState,
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// Holds the current [`ProfileState`] and notifies subscribers.
///
/// Listeners run synchronously on the publishing thread, outside the
/// internal lock, so they may subscribe or read state themselves.
#[derive(Clone)]
pub struct ProfileStateHub {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ProfileStateHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProfileStateHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("ProfileStateHub")
            .field("status", &inner.state.status)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl ProfileStateHub {
    /// A hub in the `loading` state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: ProfileState::loading(),
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn current(&self) -> ProfileState {
        lock(&self.inner).state.clone()
    }

    /// Stores `state` and hands it to every listener.
    pub fn publish(&self, state: ProfileState) {
        let listeners: Vec<Listener> = {
            let mut inner = lock(&self.inner);
            inner.state = state.clone();
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(&state);
        }
    }

    /// Registers `listener` and calls it right away with the current state.
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let (id, current) = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Arc::clone(&listener)));
            (id, inner.state.clone())
        };
        listener(&current);

        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

/// Handle returned by [`ProfileStateHub::subscribe`].
///
/// Dropping it keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug)]
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    hub: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.hub.upgrade() {
            lock(&inner).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

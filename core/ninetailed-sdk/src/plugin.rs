//! Plugin dispatch table.
//!
//! Plugins declare which dispatches they handle through a
//! `DispatchKind -> Handler` table. A plugin may also carry a guard (a
//! consent gate) that can veto any dispatch before it reaches plugins, the
//! profile queue or the insights batcher.

use crate::state::ProfileState;
use ninetailed_types::{ElementId, Event, ObservedElementPayload};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The capability a handler is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DispatchKind {
    Page,
    Track,
    Identify,
    Reset,
    ProfileChange,
    HasSeenElement,
    ElementClicked,
    ElementHovered,
}

impl DispatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Track => "track",
            Self::Identify => "identify",
            Self::Reset => "reset",
            Self::ProfileChange => "profile_change",
            Self::HasSeenElement => "has_seen_element",
            Self::ElementClicked => "element_clicked",
            Self::ElementHovered => "element_hovered",
        }
    }
}

/// Something the instance tells its plugins about.
#[derive(Debug, Clone)]
pub enum Dispatch {
    Page(Event),
    Track(Event),
    Identify(Event),
    Reset,
    ProfileChange(ProfileState),
    HasSeenElement {
        element: ElementId,
        payload: ObservedElementPayload,
        seen_for: Duration,
    },
    ElementClicked {
        element: ElementId,
        payload: ObservedElementPayload,
    },
    ElementHovered {
        element: ElementId,
        payload: ObservedElementPayload,
        hovered_for: Duration,
    },
}

impl Dispatch {
    pub fn kind(&self) -> DispatchKind {
        match self {
            Self::Page(_) => DispatchKind::Page,
            Self::Track(_) => DispatchKind::Track,
            Self::Identify(_) => DispatchKind::Identify,
            Self::Reset => DispatchKind::Reset,
            Self::ProfileChange(_) => DispatchKind::ProfileChange,
            Self::HasSeenElement { .. } => DispatchKind::HasSeenElement,
            Self::ElementClicked { .. } => DispatchKind::ElementClicked,
            Self::ElementHovered { .. } => DispatchKind::ElementHovered,
        }
    }
}

pub type Handler = Arc<dyn Fn(&Dispatch) + Send + Sync>;

/// Returns false to veto a dispatch.
pub type Guard = Arc<dyn Fn(&Dispatch) -> bool + Send + Sync>;

/// A named set of handlers.
#[derive(Clone)]
pub struct Plugin {
    name: String,
    handlers: HashMap<DispatchKind, Handler>,
    view_tracking_threshold: Option<Duration>,
    guard: Option<Guard>,
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("handles", &kinds)
            .field("view_tracking_threshold", &self.view_tracking_threshold)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
            view_tracking_threshold: None,
            guard: None,
        }
    }

    /// Registers `handler` for `kind`, replacing any previous one.
    pub fn on<F>(mut self, kind: DispatchKind, handler: F) -> Self
    where
        F: Fn(&Dispatch) + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Arc::new(handler));
        self
    }

    pub fn with_guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&Dispatch) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Arc::new(guard));
        self
    }

    /// Element views are reported to this plugin after `threshold` of
    /// continuous visibility instead of the instance default.
    pub fn with_view_tracking_threshold(mut self, threshold: Duration) -> Self {
        self.view_tracking_threshold = Some(threshold);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supports(&self, kind: DispatchKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn view_tracking_threshold(&self) -> Option<Duration> {
        self.view_tracking_threshold
    }

    fn allows(&self, dispatch: &Dispatch) -> bool {
        self.guard.as_ref().is_none_or(|g| g(dispatch))
    }

    fn handle(&self, dispatch: &Dispatch) {
        if let Some(handler) = self.handlers.get(&dispatch.kind()) {
            handler(dispatch);
        }
    }
}

/// Every plugin of an instance.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Plugin>,
}

impl PluginRegistry {
    pub fn new(plugins: Vec<Plugin>) -> Self {
        Self { plugins }
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// True unless some guard vetoes `dispatch`.
    pub fn allows(&self, dispatch: &Dispatch) -> bool {
        match self.plugins.iter().find(|p| !p.allows(dispatch)) {
            Some(plugin) => {
                debug!(plugin = plugin.name(), kind = dispatch.kind().as_str(), "dispatch vetoed");
                false
            }
            None => true,
        }
    }

    /// Checks the guards, then delivers `dispatch` to every plugin that
    /// handles its kind. Returns false if the dispatch was vetoed.
    pub fn dispatch(&self, dispatch: &Dispatch) -> bool {
        if !self.allows(dispatch) {
            return false;
        }
        for plugin in &self.plugins {
            plugin.handle(dispatch);
        }
        true
    }

    /// Delivers an element view to the plugins whose threshold is
    /// `seen_for`. Plugins without a threshold use `default_threshold`.
    pub fn dispatch_seen(&self, dispatch: &Dispatch, seen_for: Duration, default_threshold: Duration) {
        for plugin in &self.plugins {
            let threshold = plugin.view_tracking_threshold.unwrap_or(default_threshold);
            if threshold == seen_for {
                plugin.handle(dispatch);
            }
        }
    }

    /// Distinct thresholds declared by plugins.
    pub fn view_thresholds(&self) -> BTreeSet<Duration> {
        self.plugins
            .iter()
            .filter_map(|p| p.view_tracking_threshold)
            .collect()
    }
}

//! The public `Ninetailed` facade.
//!
//! Wires the event builder, profile queue, insights batcher, exposure
//! observer and plugins together behind one cheaply clonable handle.

use crate::api::{ApiError, InsightsTransport, NinetailedApiClient, ProfileTransport};
use crate::config::NinetailedConfig;
use crate::error::{NinetailedError, NinetailedResult};
use crate::insights::InsightsBatcher;
use crate::plugin::{Dispatch, Plugin, PluginRegistry};
use crate::queue::{FlushOutcome, ProfileFlusher};
use crate::state::{ProfileState, ProfileStateHub, ProfileStatus, Subscription};
use crate::storage::{FallbackCache, MemoryStorage, Storage};
use ninetailed_events::{BuildContext, ComponentExposure, EventBuilder};
use ninetailed_experience::{select_experience, select_has_variants, select_variant_with_selection};
use ninetailed_observer::{
    resolve_click_targets, Document, ElementSeenObserver, ElementTree, HoverTracker,
    ObserveOptions, ObservedElements,
};
use ninetailed_types::{
    Audience, Change, ElementId, Event, ExperienceConfiguration, ObservedElementPayload, Profile,
    Reference,
};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// What `on_select_variant` reports for a baseline.
#[derive(Debug, Clone)]
pub struct SelectVariantResult {
    pub status: ProfileStatus,
    pub experience: Option<ExperienceConfiguration>,
    pub audience: Option<Audience>,
    pub variant: Reference,
    pub variant_index: usize,
    /// True when the profile takes part in an experience for the baseline,
    /// including its control bucket.
    pub is_personalized: bool,
    pub profile: Option<Profile>,
    pub error: Option<Arc<ApiError>>,
}

/// Resolves what `baseline` renders as for `state`.
///
/// Only experiences that carry variants for the baseline are considered.
/// While loading or without a profile the baseline is returned.
pub fn resolve_selection(
    baseline: &Reference,
    experiences: &[ExperienceConfiguration],
    state: &ProfileState,
) -> SelectVariantResult {
    let unpersonalized = SelectVariantResult {
        status: state.status,
        experience: None,
        audience: None,
        variant: baseline.clone(),
        variant_index: 0,
        is_personalized: false,
        profile: state.profile.clone(),
        error: state.error.clone(),
    };
    if state.is_loading() {
        return unpersonalized;
    }
    let Some(profile) = &state.profile else {
        return unpersonalized;
    };

    let candidates: Vec<ExperienceConfiguration> = experiences
        .iter()
        .filter(|e| select_has_variants(e, baseline))
        .cloned()
        .collect();
    let Some(experience) = select_experience(&candidates, profile, &state.experiences) else {
        return unpersonalized;
    };

    let selection = select_variant_with_selection(baseline, experience, profile, &state.experiences);
    SelectVariantResult {
        audience: experience.audience.clone(),
        experience: Some(experience.clone()),
        variant: selection.variant,
        variant_index: selection.index,
        is_personalized: true,
        ..unpersonalized
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Builder for [`Ninetailed`].
pub struct NinetailedBuilder {
    config: NinetailedConfig,
    storage: Option<Arc<dyn Storage>>,
    document: Option<Arc<dyn ElementTree>>,
    plugins: Vec<Plugin>,
    profile_transport: Option<Arc<dyn ProfileTransport>>,
    insights_transport: Option<Arc<dyn InsightsTransport>>,
    context: BuildContext,
}

impl NinetailedBuilder {
    /// Fallback storage. Defaults to [`MemoryStorage`].
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// The host element tree. Defaults to an empty [`Document`].
    pub fn document(mut self, document: Arc<dyn ElementTree>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Replaces the HTTP client for profile calls.
    pub fn profile_transport(mut self, transport: Arc<dyn ProfileTransport>) -> Self {
        self.profile_transport = Some(transport);
        self
    }

    /// Replaces the HTTP client for insights delivery.
    pub fn insights_transport(mut self, transport: Arc<dyn InsightsTransport>) -> Self {
        self.insights_transport = Some(transport);
        self
    }

    /// Initial page context for built events.
    pub fn context(mut self, context: BuildContext) -> Self {
        self.context = context;
        self
    }

    /// Validates the configuration and assembles the instance.
    ///
    /// Call inside a tokio runtime: dwell timers and background deliveries
    /// are spawned on the runtime current at build time.
    pub fn build(self) -> NinetailedResult<Ninetailed> {
        self.config.validate()?;

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let cache = FallbackCache::new(storage);
        if let Err(e) = cache.migrate_legacy_anonymous_id() {
            warn!(error = %e, "failed to migrate legacy anonymous id");
        }

        let (profile_transport, insights_transport) =
            match (self.profile_transport, self.insights_transport) {
                (Some(p), Some(i)) => (p, i),
                (p, i) => {
                    let client = Arc::new(NinetailedApiClient::new(&self.config)?);
                    (
                        p.unwrap_or_else(|| client.clone() as Arc<dyn ProfileTransport>),
                        i.unwrap_or_else(|| client as Arc<dyn InsightsTransport>),
                    )
                }
            };

        let hub = ProfileStateHub::new();
        let flusher = ProfileFlusher::new(profile_transport, cache.clone(), hub.clone());
        let insights = InsightsBatcher::new(insights_transport, self.config.insights_batch_size);
        let events = EventBuilder::new().with_channel(self.config.channel);
        let document = self
            .document
            .unwrap_or_else(|| Arc::new(Document::new()) as Arc<dyn ElementTree>);
        let plugins = PluginRegistry::new(self.plugins);
        let config = self.config;
        let context = self.context;

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let on_seen = move |element: ElementId, seen_for: Duration| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_element_seen(element, seen_for);
                }
            };
            let observer = ElementSeenObserver::new(Arc::new(on_seen));
            Inner {
                config,
                events,
                context: Mutex::new(context),
                cache,
                hub,
                flusher,
                insights,
                plugins,
                document,
                observer,
                elements: Mutex::new(ObservedElements::new()),
                hovers: Mutex::new(HoverTracker::new()),
            }
        });

        let weak = Arc::downgrade(&inner);
        let _profile_feed = inner.hub.subscribe(Arc::new(move |state: &ProfileState| {
            if let Some(inner) = weak.upgrade() {
                inner.on_profile_state(state);
            }
        }));

        info!(
            client_id = %inner.config.client_id,
            environment = %inner.config.environment,
            "Ninetailed instance ready"
        );
        Ok(Ninetailed { inner })
    }
}

struct Inner {
    config: NinetailedConfig,
    events: EventBuilder,
    context: Mutex<BuildContext>,
    cache: FallbackCache,
    hub: ProfileStateHub,
    flusher: ProfileFlusher,
    insights: InsightsBatcher,
    plugins: PluginRegistry,
    document: Arc<dyn ElementTree>,
    observer: ElementSeenObserver,
    elements: Mutex<ObservedElements<ObservedElementPayload>>,
    hovers: Mutex<HoverTracker>,
}

impl Inner {
    fn build_event(&self, f: impl FnOnce(&EventBuilder, &BuildContext) -> Event) -> Event {
        let ctx = lock(&self.context).clone();
        f(&self.events, &ctx)
    }

    fn on_profile_state(&self, state: &ProfileState) {
        if state.is_loading() {
            return;
        }
        self.insights.set_profile(state.profile.clone());
        self.plugins.dispatch(&Dispatch::ProfileChange(state.clone()));
    }

    fn spawn_flush(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no tokio runtime, queued profile events wait for the next flush");
            return;
        };
        let flusher = self.flusher.clone();
        runtime.spawn(async move {
            let _ = flusher.flush().await;
        });
    }

    fn on_element_seen(&self, element: ElementId, seen_for: Duration) {
        let (payloads, view_threshold) = {
            let elements = lock(&self.elements);
            let Some(entry) = elements.get(element) else {
                return;
            };
            let threshold = entry
                .view_delay
                .unwrap_or_else(|| self.config.component_view_threshold());
            (entry.payloads.clone(), threshold)
        };

        for payload in payloads {
            let dispatch = Dispatch::HasSeenElement {
                element,
                payload: payload.clone(),
                seen_for,
            };
            if !self.plugins.allows(&dispatch) {
                continue;
            }
            self.plugins.dispatch_seen(&dispatch, seen_for, view_threshold);
            if seen_for != view_threshold {
                continue;
            }

            let exposure = ComponentExposure::from(&payload);
            let view = self.build_event(|b, ctx| b.component(ctx, &exposure, Some(millis(seen_for))));
            if !self.insights.add_view(element, &payload, view) {
                continue;
            }

            if payload.is_sticky() {
                debug!(%element, experience = ?payload.experience_id(), "sticky experience seen");
                let event = self.build_event(|b, ctx| b.component(ctx, &exposure, None));
                self.flusher.enqueue(event);
                self.spawn_flush();
            }
        }
    }
}

/// Handle to one SDK instance. Clones share the instance.
#[derive(Clone)]
pub struct Ninetailed {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Ninetailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ninetailed")
            .field("client_id", &self.inner.config.client_id)
            .field("environment", &self.inner.config.environment)
            .field("plugins", &self.inner.plugins.plugins().len())
            .finish()
    }
}

impl Ninetailed {
    pub fn builder(config: NinetailedConfig) -> NinetailedBuilder {
        NinetailedBuilder {
            config,
            storage: None,
            document: None,
            plugins: Vec::new(),
            profile_transport: None,
            insights_transport: None,
            context: BuildContext::default(),
        }
    }

    pub fn config(&self) -> &NinetailedConfig {
        &self.inner.config
    }

    // ── Profile events ────────────────────────────────────────────

    async fn send_profile_event(&self, dispatch: Dispatch) -> NinetailedResult<()> {
        if !self.inner.plugins.dispatch(&dispatch) {
            return Ok(());
        }
        let event = match dispatch {
            Dispatch::Page(e) | Dispatch::Track(e) | Dispatch::Identify(e) => e,
            _ => return Ok(()),
        };
        self.inner.flusher.enqueue(event);
        self.flush().await
    }

    /// Flushes queued profile events.
    ///
    /// On failure subscribers have already received the fallback state.
    pub async fn flush(&self) -> NinetailedResult<()> {
        match self.inner.flusher.flush().await {
            Some(FlushOutcome::Failed(e)) => Err(NinetailedError::Flush(e)),
            Some(_) => Ok(()),
            None => Err(NinetailedError::FlushCancelled),
        }
    }

    pub async fn page(&self, properties: Map<String, Value>) -> NinetailedResult<()> {
        let event = self.inner.build_event(|b, ctx| b.page(ctx, properties));
        self.send_profile_event(Dispatch::Page(event)).await
    }

    pub async fn track(
        &self,
        event: impl Into<String>,
        properties: Map<String, Value>,
    ) -> NinetailedResult<()> {
        let event = event.into();
        let event = self.inner.build_event(|b, ctx| b.track(ctx, event, properties));
        self.send_profile_event(Dispatch::Track(event)).await
    }

    pub async fn identify(
        &self,
        user_id: impl Into<String>,
        traits: Map<String, Value>,
    ) -> NinetailedResult<()> {
        let user_id = user_id.into();
        let event = self.inner.build_event(|b, ctx| b.identify(ctx, user_id, traits));
        self.send_profile_event(Dispatch::Identify(event)).await
    }

    /// Forgets the visitor and starts a fresh anonymous profile.
    ///
    /// The anonymous id and the fallback cache are cleared together, then
    /// an identify with an empty user id is sent.
    pub async fn reset(&self) -> NinetailedResult<()> {
        if !self.inner.plugins.dispatch(&Dispatch::Reset) {
            return Ok(());
        }
        self.inner.cache.clear()?;
        info!("Profile reset");
        self.identify("", Map::new()).await
    }

    /// Persists the debug flag read by [`logging::init`](crate::logging::init).
    pub fn debug(&self, enabled: bool) -> NinetailedResult<()> {
        self.inner.cache.set_debug(enabled)?;
        info!(enabled, "Debug mode changed");
        Ok(())
    }

    pub fn is_debug(&self) -> bool {
        self.inner.cache.debug()
    }

    /// Replaces the page context used for subsequent events.
    pub fn set_context(&self, context: BuildContext) {
        *lock(&self.inner.context) = context;
    }

    pub fn context(&self) -> BuildContext {
        lock(&self.inner.context).clone()
    }

    // ── Exposure tracking ─────────────────────────────────────────

    /// Starts tracking `payload` on `element`.
    ///
    /// A payload deep-equal to one already registered on the element is
    /// ignored. Otherwise the element is observed with its view threshold
    /// and every plugin threshold.
    pub fn observe_element(
        &self,
        element: ElementId,
        payload: ObservedElementPayload,
        options: ObserveOptions,
    ) {
        if !self.inner.document.contains(element) {
            warn!(%element, "cannot observe an element that is not in the document");
            return;
        }
        if !lock(&self.inner.elements).insert(element, payload, options) {
            debug!(%element, "payload already observed");
            return;
        }

        let observer = &self.inner.observer;
        let threshold = options
            .delay
            .unwrap_or_else(|| self.inner.config.component_view_threshold());
        observer.observe(element, threshold);
        for plugin_threshold in self.inner.plugins.view_thresholds() {
            observer.observe(element, plugin_threshold);
        }
    }

    /// Stops tracking `element` and purges everything kept for it.
    pub fn unobserve_element(&self, element: ElementId) {
        lock(&self.inner.elements).remove(element);
        self.inner.observer.unobserve(element);
        self.inner.insights.forget_element(element);
        lock(&self.inner.hovers).forget(element);
    }

    /// Payloads currently registered on `element`.
    pub fn observed_payloads(&self, element: ElementId) -> Vec<ObservedElementPayload> {
        lock(&self.inner.elements).payloads(element).to_vec()
    }

    /// Visibility report from the host.
    pub fn on_intersection(&self, element: ElementId, is_intersecting: bool) {
        self.inner.observer.on_intersection(element, is_intersecting);
    }

    /// Click report from the host, for the innermost clicked element.
    pub fn on_click(&self, target: ElementId) {
        let document = &self.inner.document;
        if !document.contains(target) {
            warn!(element = %target, "click on an element that is not in the document");
            return;
        }

        let hits: Vec<(ElementId, Vec<ObservedElementPayload>)> = {
            let elements = lock(&self.inner.elements);
            resolve_click_targets(document.as_ref(), target, |e| elements.tracks_clicks(e))
                .into_iter()
                .map(|e| (e, elements.payloads(e).to_vec()))
                .collect()
        };

        for (element, payloads) in hits {
            for payload in payloads {
                let exposure = ComponentExposure::from(&payload);
                if !self
                    .inner
                    .plugins
                    .dispatch(&Dispatch::ElementClicked { element, payload })
                {
                    continue;
                }
                let event = self
                    .inner
                    .build_event(|b, ctx| b.component_click(ctx, &exposure));
                self.inner.insights.add(event);
            }
        }
    }

    pub fn on_mouse_enter(&self, element: ElementId) {
        if lock(&self.inner.elements).tracks_hovers(element) {
            lock(&self.inner.hovers).enter(element);
        }
    }

    pub fn on_mouse_leave(&self, element: ElementId) {
        let Some(sample) = lock(&self.inner.hovers).leave(element) else {
            return;
        };
        let payloads = self.observed_payloads(element);

        for payload in payloads {
            let exposure = ComponentExposure::from(&payload);
            let dispatch = Dispatch::ElementHovered {
                element,
                payload,
                hovered_for: sample.duration,
            };
            if !self.inner.plugins.dispatch(&dispatch) {
                continue;
            }
            let event = self.inner.build_event(|b, ctx| {
                b.component_hover(ctx, &exposure, millis(sample.duration), sample.interaction_id)
            });
            self.inner.insights.add(event);
        }
    }

    /// Page visibility report. Hiding the page beacons pending insights.
    pub fn on_visibility_change(&self, hidden: bool) {
        if hidden {
            self.inner.insights.on_page_hide();
        }
    }

    /// Delivers pending insights batches now.
    pub async fn flush_insights(&self) -> NinetailedResult<()> {
        Ok(self.inner.insights.flush().await?)
    }

    // ── Profile state ─────────────────────────────────────────────

    pub fn on_profile_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ProfileState) + Send + Sync + 'static,
    {
        self.inner.hub.subscribe(Arc::new(listener))
    }

    /// Reports the variant for `baseline` now and on every profile change.
    pub fn on_select_variant<F>(
        &self,
        baseline: Reference,
        experiences: Vec<ExperienceConfiguration>,
        callback: F,
    ) -> Subscription
    where
        F: Fn(&SelectVariantResult) + Send + Sync + 'static,
    {
        self.inner.hub.subscribe(Arc::new(move |state: &ProfileState| {
            callback(&resolve_selection(&baseline, &experiences, state));
        }))
    }

    pub fn profile_state(&self) -> ProfileState {
        self.inner.hub.current()
    }

    pub fn changes(&self) -> Vec<Change> {
        self.inner.hub.current().changes
    }

    /// The server-computed value of variable `key`, if any.
    pub fn variable(&self, key: &str) -> Option<Value> {
        self.changes()
            .into_iter()
            .find(|c| c.key == key)
            .map(|c| c.value)
    }
}

//! The event builder.

use crate::context::{parse_campaign, parse_page, BuildContext};
use ninetailed_types::{
    Channel, ComponentType, Event, EventContext, EventPayload, Gdpr, InteractionId, Library,
    MessageId, ObservedElementPayload, Timestamp,
};
use serde_json::{Map, Value};

/// Identifies a rendered component in exposure events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentExposure {
    pub component_type: ComponentType,
    pub component_id: String,
    pub experience_id: Option<String>,
    pub variant_index: usize,
}

impl From<&ObservedElementPayload> for ComponentExposure {
    fn from(payload: &ObservedElementPayload) -> Self {
        Self {
            component_type: payload.component_type,
            component_id: payload.variant.id.clone(),
            experience_id: payload.experience_id().map(str::to_string),
            variant_index: payload.variant_index,
        }
    }
}

/// Builds events for one SDK instance.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    library: Library,
    channel: Channel,
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBuilder {
    /// A builder for the web channel, tagged with this crate's name and version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            library: Library {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            channel: Channel::Web,
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    #[must_use]
    pub fn with_library(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.library = Library {
            name: name.into(),
            version: version.into(),
        };
        self
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Builds an event with a fresh message id at the current instant.
    pub fn build(&self, ctx: &BuildContext, payload: EventPayload) -> Event {
        self.build_with(MessageId::new(), Timestamp::now(), ctx, payload)
    }

    /// Builds an event with an explicit message id and timestamp.
    ///
    /// All three envelope timestamps are taken from `timestamp`.
    pub fn build_with(
        &self,
        message_id: MessageId,
        timestamp: Timestamp,
        ctx: &BuildContext,
        payload: EventPayload,
    ) -> Event {
        Event {
            message_id,
            original_timestamp: timestamp,
            timestamp,
            sent_at: timestamp,
            channel: self.channel,
            context: self.context(ctx),
            payload,
        }
    }

    fn context(&self, ctx: &BuildContext) -> EventContext {
        EventContext {
            campaign: parse_campaign(&ctx.url),
            library: self.library.clone(),
            locale: ctx.locale.clone(),
            page: parse_page(&ctx.url, &ctx.referrer),
            user_agent: ctx.user_agent.clone(),
            gdpr: Gdpr::default(),
        }
    }

    /// A page view. Page fields and the document title are merged into
    /// `properties`; caller-supplied keys win.
    pub fn page(&self, ctx: &BuildContext, properties: Map<String, Value>) -> Event {
        let page = parse_page(&ctx.url, &ctx.referrer);
        let mut merged = Map::new();
        merged.insert("path".into(), Value::String(page.path));
        merged.insert("referrer".into(), Value::String(page.referrer));
        merged.insert("search".into(), Value::String(page.search));
        merged.insert("url".into(), Value::String(page.url));
        merged.insert(
            "query".into(),
            Value::Object(
                page.query
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ),
        );
        if let Some(title) = &ctx.document_title {
            merged.insert("title".into(), Value::String(title.clone()));
        }
        merged.extend(properties);

        self.build(ctx, EventPayload::Page { properties: merged })
    }

    pub fn track(&self, ctx: &BuildContext, event: impl Into<String>, properties: Map<String, Value>) -> Event {
        self.build(
            ctx,
            EventPayload::Track {
                event: event.into(),
                properties,
            },
        )
    }

    pub fn identify(&self, ctx: &BuildContext, user_id: impl Into<String>, traits: Map<String, Value>) -> Event {
        self.build(
            ctx,
            EventPayload::Identify {
                user_id: user_id.into(),
                traits,
            },
        )
    }

    /// A component view, optionally carrying how long it was visible.
    pub fn component(
        &self,
        ctx: &BuildContext,
        exposure: &ComponentExposure,
        view_duration_ms: Option<u64>,
    ) -> Event {
        self.build(
            ctx,
            EventPayload::Component {
                component_type: exposure.component_type,
                component_id: exposure.component_id.clone(),
                experience_id: exposure.experience_id.clone(),
                variant_index: exposure.variant_index,
                view_duration_ms,
            },
        )
    }

    pub fn component_click(&self, ctx: &BuildContext, exposure: &ComponentExposure) -> Event {
        self.build(
            ctx,
            EventPayload::ComponentClick {
                component_type: exposure.component_type,
                component_id: exposure.component_id.clone(),
                experience_id: exposure.experience_id.clone(),
                variant_index: exposure.variant_index,
            },
        )
    }

    pub fn component_hover(
        &self,
        ctx: &BuildContext,
        exposure: &ComponentExposure,
        hover_duration_ms: u64,
        component_hover_id: InteractionId,
    ) -> Event {
        self.build(
            ctx,
            EventPayload::ComponentHover {
                component_type: exposure.component_type,
                component_id: exposure.component_id.clone(),
                experience_id: exposure.experience_id.clone(),
                variant_index: exposure.variant_index,
                hover_duration_ms,
                component_hover_id,
            },
        )
    }
}

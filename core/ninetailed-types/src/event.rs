//! The canonical, versioned event envelope.
//!
//! Every event shares the same envelope (`messageId`, the three ISO
//! timestamps, channel and context) and carries a payload tagged by `type`.
//! Profile-affecting events (`page`, `track`, `identify`, sticky
//! `component`) go to the profile API; exposure telemetry (`component`,
//! `component_click`, `component_hover`) goes to the insights API.

use crate::{InteractionId, MessageId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The channel an event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Web,
    Server,
    Mobile,
}

/// What kind of component an exposure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComponentType {
    #[default]
    Entry,
    Variable,
}

/// Page information parsed from the current URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub referrer: String,
    pub search: String,
    pub url: String,
}

/// Campaign attribution parsed from UTM query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Campaign {
    /// Returns true if no UTM parameter was present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.medium.is_none()
            && self.name.is_none()
            && self.term.is_none()
            && self.content.is_none()
    }
}

/// Identifies the SDK that built an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub version: String,
}

/// Consent state attached to every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gdpr {
    pub is_consent_given: bool,
}

impl Default for Gdpr {
    fn default() -> Self {
        Self {
            is_consent_given: true,
        }
    }
}

/// Context shared by all events built for the same page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    #[serde(default)]
    pub campaign: Campaign,
    pub library: Library,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub page: Page,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub gdpr: Gdpr,
}

/// The typed part of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EventPayload {
    /// A page view.
    Page {
        #[serde(default)]
        properties: Map<String, Value>,
    },

    /// A custom tracked event.
    Track {
        event: String,
        #[serde(default)]
        properties: Map<String, Value>,
    },

    /// Associates the profile with a user id and traits.
    Identify {
        #[serde(default)]
        user_id: String,
        #[serde(default)]
        traits: Map<String, Value>,
    },

    /// A component (variant) was seen.
    Component {
        component_type: ComponentType,
        component_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        experience_id: Option<String>,
        variant_index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_duration_ms: Option<u64>,
    },

    /// A component was clicked.
    ComponentClick {
        component_type: ComponentType,
        component_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        experience_id: Option<String>,
        variant_index: usize,
    },

    /// A component was hovered for a measured duration.
    ComponentHover {
        component_type: ComponentType,
        component_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        experience_id: Option<String>,
        variant_index: usize,
        hover_duration_ms: u64,
        component_hover_id: InteractionId,
    },
}

impl EventPayload {
    /// The wire name of the payload's `type` tag.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Page { .. } => "page",
            Self::Track { .. } => "track",
            Self::Identify { .. } => "identify",
            Self::Component { .. } => "component",
            Self::ComponentClick { .. } => "component_click",
            Self::ComponentHover { .. } => "component_hover",
        }
    }

    /// Returns true for exposure telemetry routed to the insights API.
    #[must_use]
    pub fn is_exposure(&self) -> bool {
        matches!(
            self,
            Self::Component { .. } | Self::ComponentClick { .. } | Self::ComponentHover { .. }
        )
    }
}

/// A fully built event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub message_id: MessageId,
    pub original_timestamp: Timestamp,
    pub timestamp: Timestamp,
    pub sent_at: Timestamp,
    #[serde(default)]
    pub channel: Channel,
    pub context: EventContext,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    /// The wire name of the event type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.payload.type_name()
    }
}

use ninetailed_types::{
    Campaign, Channel, ComponentType, Event, EventContext, EventPayload, Gdpr, InteractionId,
    Library, MessageId, Page, Timestamp,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map};

fn context() -> EventContext {
    EventContext {
        campaign: Campaign::default(),
        library: Library {
            name: "ninetailed-rs".into(),
            version: "0.1.0".into(),
        },
        locale: "en-US".into(),
        page: Page::default(),
        user_agent: None,
        gdpr: Gdpr::default(),
    }
}

fn event(payload: EventPayload) -> Event {
    let ts = Timestamp::from_millis(1_714_564_800_000).unwrap();
    Event {
        message_id: MessageId::new(),
        original_timestamp: ts,
        timestamp: ts,
        sent_at: ts,
        channel: Channel::Web,
        context: context(),
        payload,
    }
}

// ── Payload tags ──────────────────────────────────────────────────

#[test]
fn type_names() {
    let page = EventPayload::Page {
        properties: Map::new(),
    };
    let click = EventPayload::ComponentClick {
        component_type: ComponentType::Entry,
        component_id: "v1".into(),
        experience_id: None,
        variant_index: 1,
    };
    assert_eq!(page.type_name(), "page");
    assert_eq!(click.type_name(), "component_click");
}

#[test]
fn exposure_classification() {
    let track = EventPayload::Track {
        event: "signup".into(),
        properties: Map::new(),
    };
    let view = EventPayload::Component {
        component_type: ComponentType::Entry,
        component_id: "v1".into(),
        experience_id: Some("e1".into()),
        variant_index: 1,
        view_duration_ms: Some(2000),
    };
    assert!(!track.is_exposure());
    assert!(view.is_exposure());
}

// ── Wire format ───────────────────────────────────────────────────

#[test]
fn page_event_wire_shape() {
    let e = event(EventPayload::Page {
        properties: Map::new(),
    });
    let value = serde_json::to_value(&e).unwrap();

    assert_eq!(value["type"], "page");
    assert_eq!(value["channel"], "web");
    assert_eq!(value["messageId"], e.message_id.to_string());
    assert_eq!(value["timestamp"], "2024-05-01T12:00:00.000Z");
    assert_eq!(value["originalTimestamp"], "2024-05-01T12:00:00.000Z");
    assert_eq!(value["sentAt"], "2024-05-01T12:00:00.000Z");
    assert_eq!(value["context"]["gdpr"]["isConsentGiven"], true);
    assert_eq!(value["context"]["library"]["name"], "ninetailed-rs");
}

#[test]
fn identify_uses_camel_case_fields() {
    let mut traits = Map::new();
    traits.insert("plan".into(), json!("pro"));
    let e = event(EventPayload::Identify {
        user_id: "user-1".into(),
        traits,
    });
    let value = serde_json::to_value(&e).unwrap();
    assert_eq!(value["type"], "identify");
    assert_eq!(value["userId"], "user-1");
    assert_eq!(value["traits"]["plan"], "pro");
}

#[test]
fn component_hover_wire_shape() {
    let hover_id = InteractionId::new();
    let e = event(EventPayload::ComponentHover {
        component_type: ComponentType::Entry,
        component_id: "variant-a".into(),
        experience_id: Some("e1".into()),
        variant_index: 1,
        hover_duration_ms: 1500,
        component_hover_id: hover_id,
    });
    let value = serde_json::to_value(&e).unwrap();
    assert_eq!(value["type"], "component_hover");
    assert_eq!(value["componentType"], "Entry");
    assert_eq!(value["componentId"], "variant-a");
    assert_eq!(value["experienceId"], "e1");
    assert_eq!(value["variantIndex"], 1);
    assert_eq!(value["hoverDurationMs"], 1500);
    assert_eq!(value["componentHoverId"], hover_id.to_string());
}

#[test]
fn component_without_experience_omits_field() {
    let e = event(EventPayload::Component {
        component_type: ComponentType::Variable,
        component_id: "baseline".into(),
        experience_id: None,
        variant_index: 0,
        view_duration_ms: None,
    });
    let value = serde_json::to_value(&e).unwrap();
    assert!(value.get("experienceId").is_none());
    assert!(value.get("viewDurationMs").is_none());
    assert_eq!(value["componentType"], "Variable");
}

#[test]
fn event_serde_roundtrip() {
    let e = event(EventPayload::Track {
        event: "purchase".into(),
        properties: Map::new(),
    });
    let json = serde_json::to_string(&e).unwrap();
    let parsed: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, e);
}

#[test]
fn campaign_is_empty() {
    assert!(Campaign::default().is_empty());
    let campaign = Campaign {
        source: Some("newsletter".into()),
        ..Default::default()
    };
    assert!(!campaign.is_empty());
}

#[test]
fn empty_campaign_serializes_to_empty_object() {
    let value = serde_json::to_value(Campaign::default()).unwrap();
    assert_eq!(value, json!({}));
}

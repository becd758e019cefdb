use ninetailed_events::{parse_campaign, parse_page, BuildContext, ComponentExposure, EventBuilder};
use ninetailed_types::{
    Channel, ComponentType, EventPayload, ExperienceConfiguration, ExperienceType, InteractionId,
    MessageId, ObservedElementPayload, Reference, Timestamp,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map};

fn ctx() -> BuildContext {
    BuildContext::new("https://shop.example.com/sale/shoes?utm_source=newsletter&utm_medium=email&utm_campaign=spring&color=red")
        .with_referrer("https://google.com/")
        .with_locale("de-DE")
        .with_user_agent("test-agent/1.0")
        .with_document_title("Spring Sale")
}

fn exposure() -> ComponentExposure {
    ComponentExposure {
        component_type: ComponentType::Entry,
        component_id: "hero-b".into(),
        experience_id: Some("e1".into()),
        variant_index: 1,
    }
}

// ── Page & campaign parsing ───────────────────────────────────────

#[test]
fn page_is_parsed_from_url() {
    let page = parse_page("https://example.com/a/b?x=1&y=two", "https://ref.example/");
    assert_eq!(page.path, "/a/b");
    assert_eq!(page.search, "?x=1&y=two");
    assert_eq!(page.query.get("x").map(String::as_str), Some("1"));
    assert_eq!(page.query.get("y").map(String::as_str), Some("two"));
    assert_eq!(page.referrer, "https://ref.example/");
    assert_eq!(page.url, "https://example.com/a/b?x=1&y=two");
}

#[test]
fn page_without_query_has_empty_search() {
    let page = parse_page("https://example.com/", "");
    assert_eq!(page.path, "/");
    assert_eq!(page.search, "");
    assert!(page.query.is_empty());
}

#[test]
fn malformed_url_yields_empty_page() {
    let page = parse_page("not a url", "ref");
    assert_eq!(page.path, "");
    assert_eq!(page.url, "");
    assert_eq!(page.referrer, "ref");
    assert!(parse_campaign("::::").is_empty());
}

#[test]
fn utm_parameters_map_to_campaign() {
    let campaign = parse_campaign(
        "https://x.io/?utm_source=s&utm_medium=m&utm_campaign=c&utm_term=t&utm_content=ct",
    );
    assert_eq!(campaign.source.as_deref(), Some("s"));
    assert_eq!(campaign.medium.as_deref(), Some("m"));
    assert_eq!(campaign.name.as_deref(), Some("c"));
    assert_eq!(campaign.term.as_deref(), Some("t"));
    assert_eq!(campaign.content.as_deref(), Some("ct"));
}

#[test]
fn missing_utm_parameters_stay_unset() {
    let campaign = parse_campaign("https://x.io/?utm_source=s&other=1");
    assert_eq!(campaign.source.as_deref(), Some("s"));
    assert!(campaign.medium.is_none());
    assert!(campaign.name.is_none());
}

#[test]
fn utm_values_are_percent_decoded() {
    let campaign = parse_campaign("https://x.io/?utm_campaign=spring%20sale");
    assert_eq!(campaign.name.as_deref(), Some("spring sale"));
}

// ── Envelope ──────────────────────────────────────────────────────

#[test]
fn envelope_timestamps_come_from_one_instant() {
    let builder = EventBuilder::new();
    let id = MessageId::new();
    let ts = Timestamp::from_millis(1_714_564_800_123).unwrap();
    let event = builder.build_with(id, ts, &ctx(), EventPayload::Page { properties: Map::new() });

    assert_eq!(event.message_id, id);
    assert_eq!(event.original_timestamp, ts);
    assert_eq!(event.timestamp, ts);
    assert_eq!(event.sent_at, ts);

    let wire = serde_json::to_value(&event).unwrap();
    assert_eq!(wire["timestamp"], json!("2024-05-01T12:00:00.123Z"));
    assert_eq!(wire["sentAt"], json!("2024-05-01T12:00:00.123Z"));
}

#[test]
fn context_is_filled_from_build_context() {
    let event = EventBuilder::new().track(&ctx(), "checkout", Map::new());
    let context = &event.context;

    assert_eq!(context.locale, "de-DE");
    assert_eq!(context.user_agent.as_deref(), Some("test-agent/1.0"));
    assert_eq!(context.page.path, "/sale/shoes");
    assert_eq!(context.page.referrer, "https://google.com/");
    assert_eq!(context.campaign.source.as_deref(), Some("newsletter"));
    assert_eq!(context.campaign.name.as_deref(), Some("spring"));
    assert!(context.gdpr.is_consent_given);
    assert_eq!(context.library.name, "ninetailed-events");
}

#[test]
fn each_build_mints_a_new_message_id() {
    let builder = EventBuilder::new();
    let a = builder.track(&ctx(), "x", Map::new());
    let b = builder.track(&ctx(), "x", Map::new());
    assert_ne!(a.message_id, b.message_id);
}

#[test]
fn channel_and_library_are_configurable() {
    let builder = EventBuilder::new()
        .with_channel(Channel::Server)
        .with_library("my-sdk", "9.9.9");
    let event = builder.identify(&ctx(), "user-1", Map::new());
    assert_eq!(builder.channel(), Channel::Server);
    assert_eq!(event.channel, Channel::Server);
    assert_eq!(event.context.library.version, "9.9.9");
}

// ── Payloads ──────────────────────────────────────────────────────

#[test]
fn page_merges_page_fields_into_properties() {
    let mut props = Map::new();
    props.insert("category".into(), json!("shoes"));
    props.insert("path".into(), json!("/override"));

    let event = EventBuilder::new().page(&ctx(), props);
    let EventPayload::Page { properties } = &event.payload else {
        panic!("expected page payload");
    };

    assert_eq!(properties["category"], json!("shoes"));
    assert_eq!(properties["path"], json!("/override"));
    assert_eq!(properties["title"], json!("Spring Sale"));
    assert_eq!(properties["query"]["color"], json!("red"));
}

#[test]
fn identify_carries_user_and_traits() {
    let mut traits = Map::new();
    traits.insert("plan".into(), json!("pro"));
    let event = EventBuilder::new().identify(&ctx(), "user-42", traits.clone());
    assert_eq!(
        event.payload,
        EventPayload::Identify {
            user_id: "user-42".into(),
            traits
        }
    );
}

#[test]
fn component_view_wire_shape() {
    let event = EventBuilder::new().component(&ctx(), &exposure(), Some(2000));
    let wire = serde_json::to_value(&event).unwrap();
    assert_eq!(wire["type"], json!("component"));
    assert_eq!(wire["componentType"], json!("Entry"));
    assert_eq!(wire["componentId"], json!("hero-b"));
    assert_eq!(wire["experienceId"], json!("e1"));
    assert_eq!(wire["variantIndex"], json!(1));
    assert_eq!(wire["viewDurationMs"], json!(2000));
}

#[test]
fn click_and_hover_events() {
    let builder = EventBuilder::new();
    let click = builder.component_click(&ctx(), &exposure());
    assert_eq!(click.type_name(), "component_click");

    let hover_id = InteractionId::new();
    let hover = builder.component_hover(&ctx(), &exposure(), 350, hover_id);
    match hover.payload {
        EventPayload::ComponentHover {
            hover_duration_ms,
            component_hover_id,
            ..
        } => {
            assert_eq!(hover_duration_ms, 350);
            assert_eq!(component_hover_id, hover_id);
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn exposure_from_observed_payload() {
    let experience = ExperienceConfiguration::new("e9", ExperienceType::Personalization);
    let payload = ObservedElementPayload::personalized(experience, Reference::new("v2"), 2);
    assert_eq!(
        ComponentExposure::from(&payload),
        ComponentExposure {
            component_type: ComponentType::Entry,
            component_id: "v2".into(),
            experience_id: Some("e9".into()),
            variant_index: 2,
        }
    );

    let baseline = ObservedElementPayload::baseline(Reference::new("hero"));
    assert_eq!(ComponentExposure::from(&baseline).experience_id, None);
}

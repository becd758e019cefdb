use ninetailed_types::{ElementId, InteractionId, MessageId};
use std::collections::HashSet;
use std::str::FromStr;

// ── MessageId ─────────────────────────────────────────────────────

#[test]
fn message_id_new_is_unique() {
    let a = MessageId::new();
    let b = MessageId::new();
    assert_ne!(a, b);
}

#[test]
fn message_id_is_v4() {
    let id = MessageId::new();
    assert_eq!(id.as_uuid().get_version_num(), 4);
}

#[test]
fn message_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::new_v4();
    let id = MessageId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn message_id_display_and_parse() {
    let id = MessageId::new();
    let parsed = MessageId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn message_id_from_str_invalid() {
    assert!(MessageId::from_str("not-a-uuid").is_err());
}

#[test]
fn message_id_serializes_as_plain_string() {
    let id = MessageId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
}

#[test]
fn message_id_hash_dedupes() {
    let id = MessageId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

// ── InteractionId ─────────────────────────────────────────────────

#[test]
fn interaction_id_new_is_unique() {
    assert_ne!(InteractionId::new(), InteractionId::new());
}

#[test]
fn interaction_id_serde_roundtrip() {
    let id = InteractionId::new();
    let json = serde_json::to_string(&id).unwrap();
    let parsed: InteractionId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}

// ── ElementId ─────────────────────────────────────────────────────

#[test]
fn element_id_raw_roundtrip() {
    let id = ElementId::from_raw(42);
    assert_eq!(id.as_raw(), 42);
}

#[test]
fn element_id_display() {
    assert_eq!(ElementId::from_raw(7).to_string(), "element#7");
}

#[test]
fn element_id_ordering_follows_raw_value() {
    assert!(ElementId::from_raw(1) < ElementId::from_raw(2));
}

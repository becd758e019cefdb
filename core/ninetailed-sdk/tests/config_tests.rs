use ninetailed_sdk::{NinetailedConfig, NinetailedError, DEFAULT_INSIGHTS_URL, DEFAULT_URL};
use ninetailed_types::Channel;
use pretty_assertions::assert_eq;
use std::time::Duration;

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn config_defaults() {
    let cfg = NinetailedConfig::default();
    assert!(cfg.client_id.is_empty());
    assert_eq!(cfg.environment, "main");
    assert_eq!(cfg.url, DEFAULT_URL);
    assert_eq!(cfg.insights_url, DEFAULT_INSIGHTS_URL);
    assert_eq!(cfg.request_timeout(), Duration::from_millis(3000));
    assert_eq!(cfg.retries, 1);
    assert_eq!(cfg.min_retry_timeout(), Duration::ZERO);
    assert!(cfg.plaintext);
    assert_eq!(cfg.locale, None);
    assert!(cfg.enabled_features.is_empty());
    assert_eq!(cfg.component_view_threshold(), Duration::from_millis(2000));
    assert_eq!(cfg.insights_batch_size, 25);
    assert_eq!(cfg.channel, Channel::Web);
}

#[test]
fn new_sets_client_id() {
    let cfg = NinetailedConfig::new("org-1");
    assert_eq!(cfg.client_id, "org-1");
    assert!(cfg.validate().is_ok());
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn empty_client_id_is_rejected() {
    let err = NinetailedConfig::default().validate().unwrap_err();
    assert!(matches!(err, NinetailedError::Config(_)));
    assert!(err.to_string().contains("client_id"));
}

#[test]
fn zero_batch_size_is_rejected() {
    let cfg = NinetailedConfig {
        insights_batch_size: 0,
        ..NinetailedConfig::new("org")
    };
    assert!(matches!(cfg.validate(), Err(NinetailedError::Config(_))));
}

#[test]
fn empty_urls_are_rejected() {
    let cfg = NinetailedConfig {
        url: "  ".into(),
        ..NinetailedConfig::new("org")
    };
    assert!(cfg.validate().is_err());
}

// ── TOML ─────────────────────────────────────────────────────────

#[test]
fn toml_overrides_and_defaults() {
    let cfg = NinetailedConfig::from_toml_str(
        r#"
        client_id = "org-9"
        environment = "staging"
        locale = "de-DE"
        enabled_features = ["location", "ip-enrichment"]
        plaintext = false
        channel = "server"
        "#,
    )
    .unwrap();

    assert_eq!(cfg.client_id, "org-9");
    assert_eq!(cfg.environment, "staging");
    assert_eq!(cfg.locale.as_deref(), Some("de-DE"));
    assert_eq!(cfg.enabled_features, vec!["location", "ip-enrichment"]);
    assert!(!cfg.plaintext);
    assert_eq!(cfg.channel, Channel::Server);
    assert_eq!(cfg.request_timeout_ms, 3000);
}

#[test]
fn toml_without_client_id_fails_validation() {
    let err = NinetailedConfig::from_toml_str("environment = \"main\"").unwrap_err();
    assert!(matches!(err, NinetailedError::Config(_)));
}

#[test]
fn malformed_toml_is_reported() {
    let err = NinetailedConfig::from_toml_str("client_id = ").unwrap_err();
    assert!(matches!(err, NinetailedError::Toml(_)));
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ninetailed.toml");
    std::fs::write(&path, "client_id = \"from-file\"\nretries = 3\n").unwrap();

    let cfg = NinetailedConfig::load(&path).unwrap();
    assert_eq!(cfg.client_id, "from-file");
    assert_eq!(cfg.retries, 3);
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = NinetailedConfig::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, NinetailedError::Io(_)));
}

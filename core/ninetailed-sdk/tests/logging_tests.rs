use ninetailed_sdk::logging::{default_directives, init};

#[test]
fn default_filter_is_info() {
    assert_eq!(default_directives(false), "info");
}

#[test]
fn debug_filter_raises_sdk_crates() {
    let directives = default_directives(true);
    assert!(directives.starts_with("info,"));
    assert!(directives.contains("ninetailed_sdk=debug"));
    assert!(directives.contains("ninetailed_observer=debug"));
}

#[test]
fn init_installs_once() {
    let _ = init(false);
    assert!(!init(true));
}

//! Logging bootstrap.
//!
//! The SDK only emits `tracing` events; installing a subscriber is up to
//! the host. [`init`] is a convenience for hosts without their own.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

const NINETAILED_CRATES: &[&str] = &[
    "ninetailed_sdk",
    "ninetailed_experience",
    "ninetailed_events",
    "ninetailed_observer",
];

/// The filter used when `RUST_LOG` is not set.
pub fn default_directives(debug: bool) -> String {
    let mut directives = vec!["info".to_string()];
    if !debug {
        return directives.join(",");
    }
    directives.extend(NINETAILED_CRATES.iter().map(|c| format!("{c}=debug")));
    directives.join(",")
}

/// Installs a compact fmt subscriber.
///
/// `RUST_LOG` wins over `debug`. Returns `false` if a global subscriber was
/// already installed.
pub fn init(debug: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}

//! SDK configuration.

use crate::error::{NinetailedError, NinetailedResult};
use ninetailed_types::Channel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_URL: &str = "https://experience.ninetailed.co";
pub const DEFAULT_INSIGHTS_URL: &str = "https://ingest.insights.ninetailed.co";

/// Configuration for a [`Ninetailed`](crate::Ninetailed) instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NinetailedConfig {
    /// Organization id issued by Ninetailed.
    pub client_id: String,
    pub environment: String,
    /// Base URL of the experience (profile) API.
    pub url: String,
    /// Base URL of the insights ingestion API.
    pub insights_url: String,
    pub request_timeout_ms: u64,
    /// How many times a 503 response is retried.
    pub retries: u32,
    /// Backoff before the first retry; doubles on every further attempt.
    pub min_retry_timeout_ms: u64,
    /// Send request bodies as `text/plain` to avoid CORS preflights.
    pub plaintext: bool,
    pub locale: Option<String>,
    /// Server-side enrichments, e.g. `ip-enrichment` or `location`.
    pub enabled_features: Vec<String>,
    pub component_view_tracking_threshold_ms: u64,
    pub insights_batch_size: usize,
    pub channel: Channel,
}

impl Default for NinetailedConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            environment: "main".to_string(),
            url: DEFAULT_URL.to_string(),
            insights_url: DEFAULT_INSIGHTS_URL.to_string(),
            request_timeout_ms: 3000,
            retries: 1,
            min_retry_timeout_ms: 0,
            plaintext: true,
            locale: None,
            enabled_features: Vec::new(),
            component_view_tracking_threshold_ms: 2000,
            insights_batch_size: 25,
            channel: Channel::Web,
        }
    }
}

impl NinetailedConfig {
    /// Default configuration for `client_id`.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> NinetailedResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> NinetailedResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded Ninetailed configuration from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> NinetailedResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(NinetailedError::Config("client_id must not be empty".into()));
        }
        if self.environment.trim().is_empty() {
            return Err(NinetailedError::Config("environment must not be empty".into()));
        }
        if self.url.trim().is_empty() || self.insights_url.trim().is_empty() {
            return Err(NinetailedError::Config("API urls must not be empty".into()));
        }
        if self.insights_batch_size == 0 {
            return Err(NinetailedError::Config(
                "insights_batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn min_retry_timeout(&self) -> Duration {
        Duration::from_millis(self.min_retry_timeout_ms)
    }

    pub fn component_view_threshold(&self) -> Duration {
        Duration::from_millis(self.component_view_tracking_threshold_ms)
    }
}

//! Visitor profile and the server-computed state returned with it.
//!
//! The backend owns the profile. The client only ever holds a read-only
//! copy, refreshed on every successful flush and reused from the fallback
//! cache otherwise.

use crate::event::Page;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The server-aggregated state of a visitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Profile id. May rotate on identify/merge.
    pub id: String,
    /// Hashing seed for bucketing. Stable for a device lineage.
    pub stable_id: String,
    /// Server-side random value.
    #[serde(default)]
    pub random: f64,
    /// Ids of the audiences this profile belongs to.
    #[serde(default)]
    pub audiences: Vec<String>,
    /// Arbitrary visitor traits.
    #[serde(default)]
    pub traits: Map<String, Value>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub session: Session,
}

impl Profile {
    /// Creates a profile with the given ids and no audiences or traits.
    #[must_use]
    pub fn new(id: impl Into<String>, stable_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stable_id: stable_id.into(),
            random: 0.0,
            audiences: Vec::new(),
            traits: Map::new(),
            location: Location::default(),
            session: Session::default(),
        }
    }

    /// Adds an audience membership.
    #[must_use]
    pub fn with_audience(mut self, audience_id: impl Into<String>) -> Self {
        self.audiences.push(audience_id.into());
        self
    }

    /// Returns true if the profile belongs to the audience.
    #[must_use]
    pub fn is_in_audience(&self, audience_id: &str) -> bool {
        self.audiences.iter().any(|a| a == audience_id)
    }
}

/// Geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolved visitor location. Every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Session statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub id: String,
    pub is_returning_visitor: bool,
    pub landing_page: Page,
    pub count: u64,
    pub active_session_length: u64,
    pub average_session_length: u64,
}

/// Server-confirmed bucket of a profile in one experience.
///
/// This is the durable record that keeps an assignment sticky across
/// sessions, independent of local bucketing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedVariantInfo {
    pub experience_id: String,
    pub variant_index: usize,
    /// Baseline id to chosen variant id.
    #[serde(default)]
    pub variants: HashMap<String, String>,
}

/// Kind of a server-computed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    Variable,
}

/// Provenance of a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMeta {
    pub experience_id: String,
    pub variant_index: usize,
}

/// A server-computed variable override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub key: String,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub value: Value,
    pub meta: ChangeMeta,
}

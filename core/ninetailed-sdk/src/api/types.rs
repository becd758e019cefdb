//! Wire types for the experience and insights APIs.

use ninetailed_types::{Change, Event, Profile, SelectedVariantInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a profile create/update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub events: Vec<Event>,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub features: Vec<String>,
}

/// The `data` part of a profile response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: Profile,
    #[serde(default)]
    pub experiences: Vec<SelectedVariantInfo>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// Response envelope: `{data, message, error}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub data: Option<ProfileResponse>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Envelope {
    /// An `error` that is present and neither `null` nor `false`.
    pub(crate) fn has_error(&self) -> bool {
        !matches!(self.error, None | Some(Value::Null) | Some(Value::Bool(false)))
    }
}

/// Exposure events of one profile, as sent to the insights API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsBatch {
    pub profile: Profile,
    pub events: Vec<Event>,
}

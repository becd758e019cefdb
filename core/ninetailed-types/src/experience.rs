//! Experience configurations as delivered by the CMS.
//!
//! An experience is either an experiment or a personalization. It gates
//! traffic, optionally restricts to one audience, and splits the remaining
//! visitors over a set of distribution buckets. Bucket 0 is the baseline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Experiment or personalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceType {
    #[serde(alias = "nt_experiment")]
    Experiment,
    #[serde(alias = "nt_personalization")]
    Personalization,
}

/// Audience restriction of an experience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Audience {
    /// Creates an audience with only an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
        }
    }
}

/// One weighted bucket: the half-open share `[start, end)` of the unit
/// interval. Matching is boundary-inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

impl Distribution {
    /// The control bucket covering the whole range.
    pub const CONTROL: Distribution = Distribution {
        index: 0,
        start: 0.0,
        end: 1.0,
    };

    /// Creates a bucket.
    #[must_use]
    pub const fn new(index: usize, start: f64, end: f64) -> Self {
        Self { index, start, end }
    }

    /// Returns true if `value` lies within `[start, end]`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.start <= value && value <= self.end
    }
}

/// A reference to content: an id plus arbitrary fields.
///
/// A reference with `hidden: true` is the hidden-variant marker, meaning
/// "render nothing for this slot".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Reference {
    /// Creates a plain reference.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hidden: false,
            fields: Map::new(),
        }
    }

    /// Creates a hidden-variant marker.
    #[must_use]
    pub fn hidden(id: impl Into<String>) -> Self {
        Self {
            hidden: true,
            ..Self::new(id)
        }
    }

    /// Adds an arbitrary field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Replaces a CMS entry with one of its variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryReplacement {
    pub baseline: Reference,
    #[serde(default)]
    pub variants: Vec<Reference>,
}

/// A single inline value of an [`InlineVariable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineValue {
    pub value: Value,
}

/// Replaces a keyed inline value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineVariable {
    pub key: String,
    pub value_type: String,
    pub baseline: InlineValue,
    #[serde(default)]
    pub variants: Vec<InlineValue>,
}

/// A personalizable slot of an experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Component {
    EntryReplacement(EntryReplacement),
    InlineVariable(InlineVariable),
}

/// A fully resolved experience configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceConfiguration {
    pub id: String,
    #[serde(rename = "type")]
    pub experience_type: ExperienceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    pub traffic_allocation: f64,
    #[serde(default)]
    pub distribution: Vec<Distribution>,
    #[serde(default)]
    pub sticky: bool,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl ExperienceConfiguration {
    /// Creates an experience with full traffic, no audience and no buckets.
    #[must_use]
    pub fn new(id: impl Into<String>, experience_type: ExperienceType) -> Self {
        Self {
            id: id.into(),
            experience_type,
            name: None,
            description: None,
            audience: None,
            traffic_allocation: 1.0,
            distribution: Vec::new(),
            sticky: false,
            components: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = Some(audience);
        self
    }

    #[must_use]
    pub fn with_traffic_allocation(mut self, allocation: f64) -> Self {
        self.traffic_allocation = allocation;
        self
    }

    #[must_use]
    pub fn with_distribution(mut self, distribution: Vec<Distribution>) -> Self {
        self.distribution = distribution;
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    #[must_use]
    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    /// Returns true for experiments.
    #[must_use]
    pub fn is_experiment(&self) -> bool {
        self.experience_type == ExperienceType::Experiment
    }

    /// Finds the entry replacement component for a baseline id.
    #[must_use]
    pub fn entry_replacement(&self, baseline_id: &str) -> Option<&EntryReplacement> {
        self.components.iter().find_map(|c| match c {
            Component::EntryReplacement(er) if er.baseline.id == baseline_id => Some(er),
            _ => None,
        })
    }

    /// Finds the inline variable component for a key.
    #[must_use]
    pub fn inline_variable(&self, key: &str) -> Option<&InlineVariable> {
        self.components.iter().find_map(|c| match c {
            Component::InlineVariable(iv) if iv.key == key => Some(iv),
            _ => None,
        })
    }
}

//! Payload attached to an observed element.

use crate::{Audience, ComponentType, ExperienceConfiguration, Reference};
use serde::{Deserialize, Serialize};

/// What an observed element is showing.
///
/// Equality is deep: two payloads are the same observation only if every
/// field, including the full experience configuration, is equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedElementPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<ExperienceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    pub variant: Reference,
    pub variant_index: usize,
    #[serde(default)]
    pub component_type: ComponentType,
}

impl ObservedElementPayload {
    /// A payload for an entry shown without personalization.
    #[must_use]
    pub fn baseline(variant: Reference) -> Self {
        Self {
            experience: None,
            audience: None,
            variant,
            variant_index: 0,
            component_type: ComponentType::Entry,
        }
    }

    /// A payload for a variant selected by an experience.
    #[must_use]
    pub fn personalized(
        experience: ExperienceConfiguration,
        variant: Reference,
        variant_index: usize,
    ) -> Self {
        Self {
            audience: experience.audience.clone(),
            experience: Some(experience),
            variant,
            variant_index,
            component_type: ComponentType::Entry,
        }
    }

    /// The experience id, if any.
    #[must_use]
    pub fn experience_id(&self) -> Option<&str> {
        self.experience.as_ref().map(|e| e.id.as_str())
    }

    /// True when the experience is sticky.
    #[must_use]
    pub fn is_sticky(&self) -> bool {
        self.experience.as_ref().is_some_and(|e| e.sticky)
    }
}

//! Maps a bucket to concrete content.

use crate::distribution::select_distribution;
use ninetailed_types::{ExperienceConfiguration, Profile, Reference};
use serde_json::Value;
use tracing::warn;

/// The content chosen for a slot and the bucket it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSelection {
    /// The baseline, a variant, or a hidden-variant marker.
    pub variant: Reference,
    /// Bucket index; 0 means baseline.
    pub index: usize,
}

impl VariantSelection {
    /// The unpersonalized selection.
    #[must_use]
    pub fn baseline(baseline: &Reference) -> Self {
        Self {
            variant: baseline.clone(),
            index: 0,
        }
    }

    /// True if the selection renders nothing.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.variant.hidden
    }
}

/// Resolves `index` against the component for `baseline`.
///
/// Shared by local bucketing and server-confirmed selections.
pub(crate) fn resolve_index(
    baseline: &Reference,
    experience: &ExperienceConfiguration,
    index: usize,
) -> VariantSelection {
    let Some(component) = experience.entry_replacement(&baseline.id) else {
        return VariantSelection::baseline(baseline);
    };

    if index == 0 {
        return VariantSelection::baseline(baseline);
    }

    match component.variants.get(index - 1) {
        Some(variant) => VariantSelection {
            variant: variant.clone(),
            index,
        },
        None => {
            warn!(
                experience = %experience.id,
                baseline = %baseline.id,
                index,
                available = component.variants.len(),
                "variant index out of range, falling back to baseline"
            );
            VariantSelection::baseline(baseline)
        }
    }
}

/// Selects the content the profile sees for `baseline` in `experience`.
///
/// Always returns something renderable: the baseline when the experience
/// has no component for it, when the profile lands in the control bucket,
/// or when the bucket has no matching variant.
#[must_use]
pub fn select_variant(
    baseline: &Reference,
    experience: &ExperienceConfiguration,
    profile: &Profile,
) -> VariantSelection {
    if experience.entry_replacement(&baseline.id).is_none() {
        return VariantSelection::baseline(baseline);
    }

    let distribution = select_distribution(experience, profile);
    resolve_index(baseline, experience, distribution.index)
}

/// Returns true if the experience personalizes `baseline`.
#[must_use]
pub fn select_has_variants(experience: &ExperienceConfiguration, baseline: &Reference) -> bool {
    experience
        .entry_replacement(&baseline.id)
        .is_some_and(|c| !c.variants.is_empty())
}

/// Selects the inline value for `key`, or `None` if the experience has no
/// inline variable with that key.
///
/// Out-of-range buckets resolve to the baseline value.
#[must_use]
pub fn select_inline_value(
    key: &str,
    experience: &ExperienceConfiguration,
    profile: &Profile,
) -> Option<(Value, usize)> {
    let variable = experience.inline_variable(key)?;
    let distribution = select_distribution(experience, profile);

    if distribution.index == 0 {
        return Some((variable.baseline.value.clone(), 0));
    }

    match variable.variants.get(distribution.index - 1) {
        Some(v) => Some((v.value.clone(), distribution.index)),
        None => {
            warn!(
                experience = %experience.id,
                key,
                index = distribution.index,
                "inline variant index out of range, falling back to baseline"
            );
            Some((variable.baseline.value.clone(), 0))
        }
    }
}

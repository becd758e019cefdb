//! Experience selection and server-confirmed assignments.
//!
//! A profile takes part in at most the experiments it was already assigned
//! to by the server. Personalizations are always eligible.

use crate::audience::is_experience_match;
use crate::variant::{resolve_index, select_variant, VariantSelection};
use ninetailed_types::{ExperienceConfiguration, Profile, Reference, SelectedVariantInfo};

/// Filters `experiences` down to the ones the profile may take part in.
///
/// If `selected` confirms any of the given experiments, only those
/// experiments stay eligible; otherwise every experiment is. Order is kept.
#[must_use]
pub fn select_eligible_experiences<'a>(
    experiences: &'a [ExperienceConfiguration],
    selected: &[SelectedVariantInfo],
) -> Vec<&'a ExperienceConfiguration> {
    let has_active_experiment = experiences
        .iter()
        .filter(|e| e.is_experiment())
        .any(|e| selected.iter().any(|s| s.experience_id == e.id));

    experiences
        .iter()
        .filter(|e| {
            !e.is_experiment()
                || !has_active_experiment
                || selected.iter().any(|s| s.experience_id == e.id)
        })
        .collect()
}

/// Returns the first eligible experience the profile matches.
#[must_use]
pub fn select_experience<'a>(
    experiences: &'a [ExperienceConfiguration],
    profile: &Profile,
    selected: &[SelectedVariantInfo],
) -> Option<&'a ExperienceConfiguration> {
    select_eligible_experiences(experiences, selected)
        .into_iter()
        .find(|e| is_experience_match(e, profile))
}

/// Like [`select_variant`], but a server-confirmed bucket for the
/// experience takes precedence over local bucketing.
#[must_use]
pub fn select_variant_with_selection(
    baseline: &Reference,
    experience: &ExperienceConfiguration,
    profile: &Profile,
    selected: &[SelectedVariantInfo],
) -> VariantSelection {
    match selected.iter().find(|s| s.experience_id == experience.id) {
        Some(info) => resolve_index(baseline, experience, info.variant_index),
        None => select_variant(baseline, experience, profile),
    }
}

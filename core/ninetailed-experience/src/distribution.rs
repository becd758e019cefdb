//! Bucket selection over an experience's distribution.

use crate::random::{random_for, Purpose};
use ninetailed_types::{Distribution, ExperienceConfiguration, Profile};
use tracing::debug;

/// Picks the bucket for the profile.
///
/// The first bucket whose `[start, end]` contains the distribution draw
/// wins. Both ends are inclusive, so a draw landing exactly on a shared
/// boundary resolves to the earlier bucket. Without any match the control
/// bucket is used.
#[must_use]
pub fn select_distribution(experience: &ExperienceConfiguration, profile: &Profile) -> Distribution {
    let distribution_random =
        random_for(Purpose::Distribution, &experience.id, &profile.stable_id);

    experience
        .distribution
        .iter()
        .find(|d| d.contains(distribution_random))
        .copied()
        .unwrap_or_else(|| {
            debug!(
                experience = %experience.id,
                value = distribution_random,
                "no distribution bucket matched, using control"
            );
            Distribution::CONTROL
        })
}

//! Traffic gate and audience membership.

use crate::random::{random_for, Purpose};
use ninetailed_types::{ExperienceConfiguration, Profile};

/// Returns true if the profile qualifies for the experience.
///
/// Both conditions must hold: the traffic draw is strictly below the
/// allocation, and the profile belongs to the experience's audience. An
/// experience without an audience has no audience restriction.
#[must_use]
pub fn is_experience_match(experience: &ExperienceConfiguration, profile: &Profile) -> bool {
    let traffic_random = random_for(Purpose::Traffic, &experience.id, &profile.stable_id);

    if experience.traffic_allocation <= traffic_random {
        return false;
    }

    match &experience.audience {
        Some(audience) => profile.is_in_audience(&audience.id),
        None => true,
    }
}

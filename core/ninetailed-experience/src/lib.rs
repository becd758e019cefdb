//! Experience assignment engine.
//!
//! Turns `(profile, experience)` pairs into stable, reproducible variant
//! assignments without any persisted bucket:
//!
//! - **random**: `(purpose, experienceId, stableId)` → deterministic value in
//!   `[0, 1]` via 32-bit MurmurHash3
//! - **audience**: traffic gate plus audience membership
//! - **distribution**: maps the distribution random value to a bucket
//! - **variant**: maps a bucket to the baseline or a concrete variant
//! - **selection**: picks the experience a profile takes part in and applies
//!   server-confirmed (sticky) assignments
//!
//! Every function here is pure and total. Data mismatches (missing
//! component, out-of-range bucket) degrade to the baseline instead of
//! failing.
//!
//! # Example
//!
//! ```
//! use ninetailed_experience::{is_experience_match, select_variant};
//! use ninetailed_types::{
//!     Component, Distribution, EntryReplacement, ExperienceConfiguration, ExperienceType,
//!     Profile, Reference,
//! };
//!
//! let baseline = Reference::new("hero");
//! let experience = ExperienceConfiguration::new("e1", ExperienceType::Experiment)
//!     .with_distribution(vec![Distribution::new(0, 0.0, 0.5), Distribution::new(1, 0.5, 1.0)])
//!     .with_component(Component::EntryReplacement(EntryReplacement {
//!         baseline: baseline.clone(),
//!         variants: vec![Reference::new("hero-b")],
//!     }));
//! let profile = Profile::new("p1", "abc");
//!
//! assert!(is_experience_match(&experience, &profile));
//! let selection = select_variant(&baseline, &experience, &profile);
//! assert!(selection.index <= 1);
//! ```

mod audience;
mod distribution;
mod random;
mod selection;
mod variant;

pub use audience::is_experience_match;
pub use distribution::select_distribution;
pub use random::{murmur3_32, random_for, Purpose};
pub use selection::{
    select_eligible_experiences, select_experience, select_variant_with_selection,
};
pub use variant::{select_has_variants, select_inline_value, select_variant, VariantSelection};

//! Core type definitions for the Ninetailed experience engine.
//!
//! This crate defines the wire-level types shared by every other crate:
//! - Identifiers (message ids, interaction ids, element handles)
//! - ISO-8601 timestamps used by the event envelope
//! - Profiles, selected variants and server-computed changes
//! - Experience configurations, distributions and components
//! - The canonical event envelope and its typed payloads
//!
//! All types serialize to the camelCase JSON the profile and insights APIs
//! expect.

mod event;
mod experience;
mod ids;
mod observed;
mod profile;
mod timestamp;

pub use event::{
    Campaign, Channel, ComponentType, Event, EventContext, EventPayload, Gdpr, Library, Page,
};
pub use experience::{
    Audience, Component, Distribution, EntryReplacement, ExperienceConfiguration,
    ExperienceType, InlineValue, InlineVariable, Reference,
};
pub use ids::{ElementId, InteractionId, MessageId};
pub use observed::ObservedElementPayload;
pub use profile::{
    Change, ChangeMeta, ChangeType, Coordinates, Location, Profile, SelectedVariantInfo,
    Session,
};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

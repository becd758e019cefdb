//! Exposure observation for rendered components.
//!
//! The host owns the element tree and reports visibility and pointer
//! events; this crate decides when an element counts as *seen*:
//!
//! - **tree**: the [`ElementTree`] abstraction plus an in-memory
//!   [`Document`] arena
//! - **seen**: per-element dwell timers, one per configured delay, armed
//!   while the element intersects the viewport
//! - **registry**: which payloads each element carries, deduplicated by
//!   deep equality
//! - **interaction**: click attribution and hover duration tracking
//!
//! Elements are identified by [`ElementId`](ninetailed_types::ElementId)
//! handles. Nothing is collected implicitly: every piece of per-element
//! state is dropped by an explicit `unobserve`.

mod error;
mod interaction;
mod registry;
mod seen;
mod tree;

pub use error::{ObserverError, ObserverResult};
pub use interaction::{is_clickable, resolve_click_targets, HoverSample, HoverTracker};
pub use registry::{ElementEntry, ObserveOptions, ObservedElements};
pub use seen::{ElementSeenObserver, SeenCallback};
pub use tree::{Document, ElementTree};

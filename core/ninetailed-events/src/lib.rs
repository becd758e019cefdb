//! Event construction.
//!
//! Builds the canonical [`Event`](ninetailed_types::Event) envelope from a
//! payload and the page the event was produced on. Building is pure apart
//! from drawing a fresh message id and reading the clock, and never fails:
//! a malformed URL only yields an empty page and campaign.
//!
//! # Example
//!
//! ```
//! use ninetailed_events::{BuildContext, EventBuilder};
//!
//! let builder = EventBuilder::new();
//! let ctx = BuildContext::new("https://shop.example.com/sale?utm_source=mail");
//! let event = builder.track(&ctx, "added_to_cart", Default::default());
//!
//! assert_eq!(event.type_name(), "track");
//! assert_eq!(event.context.campaign.source.as_deref(), Some("mail"));
//! ```

mod builder;
mod context;

pub use builder::{ComponentExposure, EventBuilder};
pub use context::{parse_campaign, parse_page, BuildContext};

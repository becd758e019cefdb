//! Ninetailed experience SDK.
//!
//! Keeps a visitor's profile in sync with the experience API, decides which
//! variant each personalized slot renders, and reports exposures to the
//! insights API.
//!
//! # Architecture
//!
//! - **api**: reqwest client for profiles and insights (timeout, 503 retry,
//!   beacon) behind the [`ProfileTransport`] and [`InsightsTransport`] traits
//! - **queue**: ordered, message-id-unique event queue flushed through a
//!   single-flight [`AsyncThrottle`]
//! - **state**: the current [`ProfileState`] and its subscribers
//! - **insights**: per-profile batching of exposure events
//! - **storage**: last-known-good fallback cache
//! - **plugin**: dispatch table with consent guards
//! - **instance**: the [`Ninetailed`] facade tying it all together
//!
//! ## Data flow
//!
//! 1. The host reports page views, tracked events and element visibility
//! 2. Profile-affecting events are queued and flushed to the profile API
//! 3. The response is cached and published to subscribers
//! 4. Subscribers re-run variant selection against the new profile
//! 5. Exposure events are batched and delivered to the insights API
//!
//! # Example
//!
//! ```no_run
//! use ninetailed_sdk::{Ninetailed, NinetailedConfig};
//! use ninetailed_types::Reference;
//!
//! # async fn run() -> ninetailed_sdk::NinetailedResult<()> {
//! let nt = Ninetailed::builder(NinetailedConfig::new("my-client-id")).build()?;
//!
//! let _sub = nt.on_select_variant(Reference::new("hero"), Vec::new(), |result| {
//!     println!("render {} (bucket {})", result.variant.id, result.variant_index);
//! });
//! nt.page(Default::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
mod config;
mod error;
mod insights;
mod instance;
pub mod logging;
mod plugin;
mod queue;
mod state;
pub mod storage;
mod throttle;

pub use api::{ApiError, ApiResult, InsightsTransport, NinetailedApiClient, ProfileTransport};
pub use config::{NinetailedConfig, DEFAULT_INSIGHTS_URL, DEFAULT_URL};
pub use error::{NinetailedError, NinetailedResult};
pub use insights::InsightsBatcher;
pub use instance::{resolve_selection, Ninetailed, NinetailedBuilder, SelectVariantResult};
pub use plugin::{Dispatch, DispatchKind, Guard, Handler, Plugin, PluginRegistry};
pub use queue::{EventQueue, FlushOutcome, ProfileFlusher};
pub use state::{Listener, ProfileState, ProfileStateHub, ProfileStatus, StateSource, Subscription};
pub use storage::{FallbackCache, JsonFileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use throttle::AsyncThrottle;

//! HTTP access to the experience and insights APIs.

mod client;
mod error;
pub mod transport;
mod types;

pub use client::NinetailedApiClient;
pub use error::{ApiError, ApiResult};
pub use transport::{InsightsTransport, ProfileTransport};
pub use types::{InsightsBatch, ProfileRequest, ProfileResponse, RequestOptions};

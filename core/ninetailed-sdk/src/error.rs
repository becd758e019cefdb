//! Error types for the SDK facade.

use crate::api::ApiError;
use crate::storage::StorageError;
use std::sync::Arc;
use thiserror::Error;

/// Result type for SDK operations.
pub type NinetailedResult<T> = Result<T, NinetailedError>;

/// Errors surfaced by the [`Ninetailed`](crate::Ninetailed) instance.
#[derive(Debug, Error)]
pub enum NinetailedError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// A profile flush failed; subscribers already received the fallback state.
    #[error("profile flush failed: {0}")]
    Flush(Arc<ApiError>),

    /// The flush task was cancelled before reporting an outcome.
    #[error("profile flush was cancelled")]
    FlushCancelled,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

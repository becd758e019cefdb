//! Error types for the observer.

use ninetailed_types::ElementId;
use thiserror::Error;

/// Observer errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserverError {
    /// The handle does not belong to the element tree.
    #[error("unknown element: {0}")]
    UnknownElement(ElementId),
}

/// Result type for observer operations.
pub type ObserverResult<T> = Result<T, ObserverError>;

//! Error types for storage operations.

use thiserror::Error;

/// Error type for storage operations.
///
/// Categorizes failures of the cache storage so strategies can decide
/// whether to degrade to network-only behavior.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Internal storage error, state or computation error.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// The storage refused a write because it is full.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Storage is disabled or cannot be reached.
    #[error("storage unavailable")]
    Unavailable,
}

impl StorageError {
    /// Wraps an arbitrary error as an internal storage error.
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StorageError::InternalError(Box::new(error))
    }
}

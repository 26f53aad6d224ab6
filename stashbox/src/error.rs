//! Error types for the cache controller.

use stashbox_backend::StorageError;
use stashbox_core::{NetworkError, OriginError};
use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Error returned by controller operations.
///
/// Only two operations surface errors to the host: a failed install and a
/// document request that failed on the network with nothing cached. Every
/// other failure degrades to network-only behaviour and is logged instead.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The network failed and no cached fallback existed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// A manifest URL could not be precached; the whole install is aborted.
    #[error("precache of `{url}` failed: {reason}")]
    Precache {
        /// Absolute URL that failed.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A lifecycle operation was called in a state that does not allow it.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// Current lifecycle state.
        state: LifecycleState,
    },
}

/// Error produced while loading or validating [`ControllerConfig`](crate::ControllerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error("malformed configuration: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    /// The origin or a manifest path is invalid.
    #[error(transparent)]
    Origin(#[from] OriginError),

    /// A value is present but unusable.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

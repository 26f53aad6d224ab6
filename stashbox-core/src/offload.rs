//! Offload trait for background task execution.
//!
//! This module provides the [`Offload`] trait which abstracts over
//! different implementations for spawning background tasks.

use std::future::Future;

use smol_str::SmolStr;

use crate::request::RequestIdentity;

/// Trait for spawning background tasks.
///
/// The stale-while-revalidate strategy uses it to refresh a cached asset
/// after the cached copy has already been handed back to the page.
///
/// # Implementations
///
/// The primary implementation is `OffloadManager` in the `stashbox` crate,
/// which adds deduplication and timeout policies.
///
/// # Clone bound
///
/// Implementors should use `Arc` internally to ensure all cloned instances
/// share the same configuration and state.
pub trait Offload: Send + Sync + Clone {
    /// Spawn a future to be executed in the background.
    ///
    /// # Arguments
    ///
    /// * `kind` - A label categorizing the task type (e.g., "revalidate").
    ///   Used for metrics and tracing.
    /// * `future` - The future to execute in the background.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Spawn a future keyed by the request it refreshes.
    ///
    /// Returns `false` when the implementation skipped the task because one
    /// for the same identity is still in flight. The default implementation
    /// never skips.
    fn spawn_for<F>(&self, identity: RequestIdentity, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let _ = identity;
        self.spawn("revalidate", future);
        true
    }
}

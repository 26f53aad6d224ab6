#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Request classification.
///
/// [`Classifier`] decides whether a request is intercepted at all and maps
/// its path to a [`RequestClass`].
pub mod classify;

/// Open pages and the version controlling them.
pub mod clients;

/// Controller configuration.
///
/// Provides [`ControllerConfig`] with:
/// - **Generations** — name prefix and deployment version
/// - **Manifest** — root-relative paths precached at install
/// - **Routes** — path segments used for classification
/// - **Freshness** — maximum age per request class
/// - **Lifecycle** — skip-waiting and client claiming
pub mod config;

/// The controller tying storage, network and strategies together.
pub mod controller;

/// Error types for controller operations.
///
/// Defines [`CacheError`] which covers:
/// - Storage errors
/// - Network errors with no cached fallback
/// - Precache failures
/// - Configuration and lifecycle misuse
pub mod error;

/// Lifecycle events, the handler table and the dispatcher.
pub mod event;

/// Install and activation.
pub mod lifecycle;

/// Manual invalidation.
pub mod maintenance;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module provides counters
/// and histograms for:
/// - Cache hits, misses, stale copies and fallbacks
/// - Network and storage failures
/// - Deleted generations
/// - Background refresh tasks
pub mod metrics;

/// Background task offloading for stale-while-revalidate.
///
/// Cached static assets are served immediately while a fresh copy is
/// fetched in the background by the [`OffloadManager`](offload::OffloadManager).
pub mod offload;

/// Strategy selection per request class.
pub mod policy;

/// Cache-first, stale-while-revalidate and network-first resolution.
pub mod strategy;

pub use classify::Classifier;
pub use clients::{ClientId, ClientRegistry};
pub use config::{ControllerConfig, ControllerConfigBuilder};
pub use controller::CacheController;
pub use error::{CacheError, ConfigError};
pub use event::{Dispatched, Dispatcher, Event, EventHandler, FetchDisposition, Message};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleState};
pub use policy::FetchStrategy;
pub use strategy::Served;

pub use stashbox_core::{
    CacheStatus, FetchContext, FetchRequest, FetchResponse, FreshnessPolicy, GenerationName,
    GenerationSet, Network, NetworkError, Origin, Outcome, RequestClass, RequestIdentity,
    ResponseSource,
};

/// The `stashbox` prelude.
///
/// ```rust
/// use stashbox::prelude::*;
/// ```
///
/// This imports:
/// - [`CacheController`] and [`ControllerConfig`]
/// - [`Dispatcher`], [`Event`] and [`EventHandler`]
/// - [`CacheError`]
pub mod prelude {
    pub use crate::{
        CacheController, CacheError, ControllerConfig, Dispatcher, Event, EventHandler,
    };
}

#![warn(missing_docs)]
//! # stashbox-core
//!
//! Core traits and types for the stashbox offline asset cache.
//!
//! This crate provides the vocabulary the cache controller, the storage
//! backends and the network adapters share:
//!
//! - **Identify** requests ([`FetchRequest`], [`RequestIdentity`], [`Origin`])
//! - **Describe** responses and what is stored for them ([`FetchResponse`], [`CacheEntry`])
//! - **Classify** requests and decide freshness ([`RequestClass`], [`FreshnessPolicy`])
//! - **Name** cache generations ([`GenerationName`], [`GenerationSet`])
//! - **Call** the network ([`Network`])
//! - **Execute** background tasks ([`Offload`])
//!
//! The benefit [`catalog`] schema lives here too. The controller never looks
//! inside the catalog, but hosts rendering it share the same types.

pub mod catalog;
pub mod class;
pub mod context;
pub mod freshness;
pub mod generation;
pub mod label;
pub mod network;
pub mod offload;
pub mod origin;
pub mod request;
pub mod response;
pub mod value;

pub use catalog::{Benefit, Catalog, CatalogError};
pub use class::RequestClass;
pub use context::{CacheStatus, FetchContext, Outcome, ResponseSource};
pub use freshness::FreshnessPolicy;
pub use generation::{GenerationName, GenerationSet};
pub use label::StorageLabel;
pub use network::{Network, NetworkError, NetworkResult};
pub use offload::Offload;
pub use origin::{Origin, OriginError};
pub use request::{FetchRequest, RequestIdentity};
pub use response::{CacheState, FetchResponse};
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use value::{CacheEntry, CachedResponse, EntryOrigin};

/// Raw byte data type used for response bodies.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;

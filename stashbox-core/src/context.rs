//! Fetch context types for tracking how a request was resolved.
//!
//! Each intercepted request moves through
//! `intercepted → classified → {hit-fresh, hit-stale, miss} → served-*`.
//! The [`FetchContext`] returned next to the response records where it
//! ended up. A request that fails has no context; the error is returned
//! instead.

use crate::class::RequestClass;
use crate::generation::GenerationName;

/// Whether the cache held a usable copy when the request was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// A fresh copy was found.
    Hit,
    /// No copy was found, or the cache was not consulted.
    #[default]
    Miss,
    /// A copy was found but has exceeded its maximum age.
    Stale,
}

impl CacheStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
        }
    }
}

/// Where the returned response came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseSource {
    /// Response came straight from the network.
    #[default]
    Network,
    /// Response came from the named cache generation.
    Cache(GenerationName),
    /// Response was built locally as a placeholder.
    Synthesized,
}

impl ResponseSource {
    /// Returns the source as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache(name) => name.as_str(),
            ResponseSource::Synthesized => "synthesized",
        }
    }
}

/// Terminal state of a served request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Served from cache without waiting for the network.
    ServedFromCache,
    /// Served from a successful network attempt.
    ServedFromNetwork,
    /// The network failed and a cached copy or placeholder was served.
    ServedFromFallback,
}

impl Outcome {
    /// Returns the outcome as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::ServedFromCache => "served-from-cache",
            Outcome::ServedFromNetwork => "served-from-network",
            Outcome::ServedFromFallback => "served-from-fallback",
        }
    }
}

/// How a single request was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchContext {
    /// Class assigned to the request.
    pub class: RequestClass,
    /// Cache state observed before the network was consulted.
    pub status: CacheStatus,
    /// Where the response came from.
    pub source: ResponseSource,
    /// Terminal state.
    pub outcome: Outcome,
}

impl FetchContext {
    /// Context of a request answered by the network.
    pub fn network(class: RequestClass, status: CacheStatus) -> Self {
        Self {
            class,
            status,
            source: ResponseSource::Network,
            outcome: Outcome::ServedFromNetwork,
        }
    }

    /// Context of a request answered from `generation` without the network.
    pub fn cached(class: RequestClass, status: CacheStatus, generation: GenerationName) -> Self {
        Self {
            class,
            status,
            source: ResponseSource::Cache(generation),
            outcome: Outcome::ServedFromCache,
        }
    }

    /// Context of a request answered by a fallback after a network failure.
    pub fn fallback(class: RequestClass, status: CacheStatus, source: ResponseSource) -> Self {
        Self {
            class,
            status,
            source,
            outcome: Outcome::ServedFromFallback,
        }
    }
}

//! Fetch strategy selection.

use std::fmt;

use serde::{Deserialize, Serialize};
use stashbox_core::RequestClass;

/// How an intercepted request is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Serve a fresh cached copy without touching the network; otherwise
    /// fetch, store and fall back to the stale copy or a placeholder.
    CacheFirst,
    /// Serve any cached copy right away and refresh it in the background.
    StaleWhileRevalidate,
    /// Always ask the network first and fall back to the cache.
    NetworkFirst,
}

impl FetchStrategy {
    /// Strategy used for requests of `class`.
    pub const fn for_class(class: RequestClass) -> Self {
        match class {
            RequestClass::ImageAsset => FetchStrategy::CacheFirst,
            RequestClass::StaticAsset => FetchStrategy::StaleWhileRevalidate,
            RequestClass::DocumentOrData => FetchStrategy::NetworkFirst,
        }
    }

    /// Returns the strategy as a string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FetchStrategy::CacheFirst => "cache-first",
            FetchStrategy::StaleWhileRevalidate => "stale-while-revalidate",
            FetchStrategy::NetworkFirst => "network-first",
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

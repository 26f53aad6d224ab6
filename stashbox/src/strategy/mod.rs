//! Fetch strategies for intercepted requests.
//!
//! Each strategy resolves one request against the storage and the network
//! and reports how it ended up in a [`FetchContext`]:
//!
//! | class              | strategy                                      |
//! |--------------------|-----------------------------------------------|
//! | `image-asset`      | [`CacheFirst`] with a freshness check         |
//! | `static-asset`     | [`StaleWhileRevalidate`]                      |
//! | `document-or-data` | [`NetworkFirst`]                              |
//!
//! Storage failures never fail a request. A failed read is a miss and a
//! failed write is logged, so caching degrades to network-only behaviour.

mod cache_first;
mod network_first;
mod stale_while_revalidate;

use std::time::Duration;

use chrono::{DateTime, Utc};
use stashbox_backend::CacheStorage;
use stashbox_core::{
    CacheStatus, CachedResponse, FetchContext, FetchResponse, FreshnessPolicy, GenerationName,
    GenerationSet, RequestClass, RequestIdentity,
};
use tracing::warn;

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;
pub use stale_while_revalidate::{Revalidation, StaleWhileRevalidate};

use crate::metrics;
use crate::policy::FetchStrategy;

/// A response handed back to the page, with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    /// The response.
    pub response: FetchResponse,
    /// How the request was resolved.
    pub context: FetchContext,
}

impl Served {
    pub(crate) fn new(response: FetchResponse, context: FetchContext) -> Self {
        metrics::record_fetch(&context);
        Self { response, context }
    }

    /// Strategy that produced the response.
    pub fn strategy(&self) -> FetchStrategy {
        FetchStrategy::for_class(self.context.class)
    }

    /// Drops the context.
    pub fn into_response(self) -> FetchResponse {
        self.response
    }
}

/// Where a class of requests is stored and how long it stays fresh.
#[derive(Debug, Clone, Copy)]
pub struct Route<'a> {
    /// Request class.
    pub class: RequestClass,
    /// Generation responses are written to.
    pub generation: &'a GenerationName,
    /// Maximum age of a fresh entry.
    pub max_age: Duration,
}

impl<'a> Route<'a> {
    /// Route of `class` under the given generations and freshness policy.
    pub fn resolve(
        class: RequestClass,
        generations: &'a GenerationSet,
        freshness: &FreshnessPolicy,
    ) -> Self {
        Self {
            class,
            generation: generations.for_class(class),
            max_age: freshness.max_age(class),
        }
    }

    fn status_of(&self, entry: &CachedResponse, now: DateTime<Utc>) -> CacheStatus {
        if entry.is_fresh(self.max_age, now) {
            CacheStatus::Hit
        } else {
            CacheStatus::Stale
        }
    }
}

async fn lookup<S>(
    storage: &S,
    generation: &GenerationName,
    identity: &RequestIdentity,
) -> Option<CachedResponse>
where
    S: CacheStorage + ?Sized,
{
    match storage.lookup(generation, identity).await {
        Ok(entry) => entry,
        Err(error) => {
            warn!(%generation, url = identity.url(), %error, "cache lookup failed, treating as miss");
            metrics::record_storage_error(storage.label().as_str(), "lookup");
            None
        }
    }
}

async fn lookup_any<S>(
    storage: &S,
    identity: &RequestIdentity,
) -> Option<(GenerationName, CachedResponse)>
where
    S: CacheStorage + ?Sized,
{
    match storage.lookup_any(identity).await {
        Ok(found) => found,
        Err(error) => {
            warn!(url = identity.url(), %error, "cache lookup failed, treating as miss");
            metrics::record_storage_error(storage.label().as_str(), "lookup");
            None
        }
    }
}

async fn store<S>(
    storage: &S,
    generation: &GenerationName,
    identity: &RequestIdentity,
    response: FetchResponse,
) where
    S: CacheStorage + ?Sized,
{
    let entry = CachedResponse::from_network(response);
    if let Err(error) = storage.put(generation, identity, entry).await {
        warn!(%generation, url = identity.url(), %error, "cache write failed");
        metrics::record_storage_error(storage.label().as_str(), "put");
    }
}

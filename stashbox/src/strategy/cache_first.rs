use chrono::Utc;
use http::StatusCode;
use stashbox_backend::CacheStorage;
use stashbox_core::{
    CacheStatus, FetchContext, FetchRequest, FetchResponse, Network, ResponseSource,
};
use tracing::{debug, warn};

use super::{Route, Served, lookup, store};
use crate::metrics;

/// Cache-first resolution with a freshness check.
///
/// A fresh entry is served without any network call. Otherwise the network
/// is asked; a `200` response replaces the entry. When the network fails
/// the stale entry is served, or a synthesized `408` if there is none, so
/// this strategy always yields a response.
pub struct CacheFirst<'a, S: ?Sized, N> {
    storage: &'a S,
    network: &'a N,
    route: Route<'a>,
}

impl<'a, S, N> CacheFirst<'a, S, N>
where
    S: CacheStorage + ?Sized,
    N: Network,
{
    /// Creates the strategy for `route`.
    pub fn new(storage: &'a S, network: &'a N, route: Route<'a>) -> Self {
        Self {
            storage,
            network,
            route,
        }
    }

    /// Resolves `request`.
    pub async fn fetch(&self, request: FetchRequest) -> Served {
        let identity = request.identity();
        let generation = self.route.generation;
        let class = self.route.class;

        let cached = lookup(self.storage, generation, &identity).await;
        let status = match &cached {
            Some(entry) => self.route.status_of(entry, Utc::now()),
            None => CacheStatus::Miss,
        };

        let cached = match cached {
            Some(entry) if status == CacheStatus::Hit => {
                debug!(%generation, url = identity.url(), "cache hit");
                return Served::new(
                    entry.into_inner(),
                    FetchContext::cached(class, status, generation.clone()),
                );
            }
            other => other,
        };

        debug!(%generation, url = identity.url(), status = status.as_str(), "fetching from network");
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.status() == StatusCode::OK {
                    store(self.storage, generation, &identity, response.clone()).await;
                }
                Served::new(response, FetchContext::network(class, status))
            }
            Err(error) => {
                metrics::record_network_error(class);
                match cached {
                    Some(entry) => {
                        warn!(url = identity.url(), %error, "network failed, serving stale copy");
                        Served::new(
                            entry.into_inner(),
                            FetchContext::fallback(
                                class,
                                status,
                                ResponseSource::Cache(generation.clone()),
                            ),
                        )
                    }
                    None => {
                        warn!(url = identity.url(), %error, "network failed, nothing cached");
                        Served::new(
                            FetchResponse::network_error(),
                            FetchContext::fallback(class, status, ResponseSource::Synthesized),
                        )
                    }
                }
            }
        }
    }
}

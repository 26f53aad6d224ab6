use chrono::Utc;
use stashbox_backend::CacheStorage;
use stashbox_core::{CacheStatus, FetchContext, FetchRequest, Network, ResponseSource};
use tracing::{debug, warn};

use super::{Route, Served, lookup_any, store};
use crate::error::CacheError;
use crate::metrics;

/// Network-first resolution.
///
/// Every received response, whatever its status, is copied into the route's
/// generation and returned. When the network fails, any cached copy is
/// served instead; with none the network error is returned.
pub struct NetworkFirst<'a, S: ?Sized, N> {
    storage: &'a S,
    network: &'a N,
    route: Route<'a>,
}

impl<'a, S, N> NetworkFirst<'a, S, N>
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
    pub async fn fetch(&self, request: FetchRequest) -> Result<Served, CacheError> {
        let identity = request.identity();
        let class = self.route.class;

        match self.network.fetch(request).await {
            Ok(response) => {
                store(self.storage, self.route.generation, &identity, response.clone()).await;
                debug!(url = identity.url(), status = response.status().as_u16(), "served from network");
                Ok(Served::new(
                    response,
                    FetchContext::network(class, CacheStatus::Miss),
                ))
            }
            Err(error) => {
                metrics::record_network_error(class);
                match lookup_any(self.storage, &identity).await {
                    Some((generation, entry)) => {
                        warn!(%generation, url = identity.url(), %error, "network failed, serving cached copy");
                        let status = self.route.status_of(&entry, Utc::now());
                        Ok(Served::new(
                            entry.into_inner(),
                            FetchContext::fallback(class, status, ResponseSource::Cache(generation)),
                        ))
                    }
                    None => {
                        warn!(url = identity.url(), %error, "network failed, nothing cached");
                        Err(CacheError::Network(error))
                    }
                }
            }
        }
    }
}

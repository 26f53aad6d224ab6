use std::sync::Arc;

use chrono::Utc;
use stashbox_backend::CacheStorage;
use stashbox_core::{
    CacheStatus, CachedResponse, FetchContext, FetchRequest, GenerationName, Network, Offload,
    RequestIdentity,
};
use tracing::{debug, warn};

use super::{Route, Served, lookup_any, store};
use crate::error::CacheError;
use crate::metrics;

/// A background refresh started by [`StaleWhileRevalidate::refresh_in_background`].
///
/// The refreshed copy is only visible to later requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revalidation {
    identity: RequestIdentity,
    generation: GenerationName,
    scheduled: bool,
}

impl Revalidation {
    /// Identity being refreshed.
    pub fn identity(&self) -> &RequestIdentity {
        &self.identity
    }

    /// Generation the refreshed copy is written to.
    pub fn generation(&self) -> &GenerationName {
        &self.generation
    }

    /// `false` when a refresh of the same identity was already in flight and
    /// this one was skipped.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }
}

/// Stale-while-revalidate resolution.
///
/// Split into [`read`](Self::read), which returns whatever is cached
/// regardless of age, and [`refresh_in_background`](Self::refresh_in_background),
/// which detaches a network fetch that overwrites the entry on success.
/// [`fetch`](Self::fetch) combines both; on a miss it waits for the network
/// instead.
pub struct StaleWhileRevalidate<'a, S: ?Sized, N, O> {
    storage: &'a Arc<S>,
    network: &'a N,
    offload: &'a O,
    route: Route<'a>,
}

impl<'a, S, N, O> StaleWhileRevalidate<'a, S, N, O>
where
    S: CacheStorage + ?Sized + 'static,
    N: Network,
    O: Offload,
{
    /// Creates the strategy for `route`.
    pub fn new(storage: &'a Arc<S>, network: &'a N, offload: &'a O, route: Route<'a>) -> Self {
        Self {
            storage,
            network,
            offload,
            route,
        }
    }

    /// Any cached copy of `identity`, ignoring freshness.
    pub async fn read(&self, identity: &RequestIdentity) -> Option<(GenerationName, CachedResponse)> {
        lookup_any(self.storage.as_ref(), identity).await
    }

    /// Fetches `request` in a detached task and overwrites the copy held in
    /// `generation` with a successful response.
    ///
    /// `generation` must be the one the cached copy was read from, otherwise
    /// the next [`read`](Self::read) may still find the old copy first.
    /// Failures are logged and otherwise ignored.
    pub fn refresh_in_background(
        &self,
        request: FetchRequest,
        generation: &GenerationName,
    ) -> Revalidation {
        let identity = request.identity();
        let response = self.network.fetch(request);
        let storage = Arc::clone(self.storage);
        let target = generation.clone();
        let class = self.route.class;
        let task_identity = identity.clone();

        let scheduled = self.offload.spawn_for(identity.clone(), async move {
            match response.await {
                Ok(response) if response.is_ok() => {
                    store(storage.as_ref(), &target, &task_identity, response).await;
                    debug!(generation = %target, url = task_identity.url(), "background refresh stored");
                }
                Ok(response) => {
                    debug!(
                        url = task_identity.url(),
                        status = response.status().as_u16(),
                        "background refresh not stored"
                    );
                }
                Err(error) => {
                    metrics::record_network_error(class);
                    warn!(url = task_identity.url(), %error, "background refresh failed");
                }
            }
        });

        if !scheduled {
            debug!(url = identity.url(), "background refresh already in flight");
        }
        Revalidation {
            identity,
            generation: generation.clone(),
            scheduled,
        }
    }

    /// Resolves `request`.
    ///
    /// Fails only when nothing was cached and the network failed.
    pub async fn fetch(&self, request: FetchRequest) -> Result<Served, CacheError> {
        let identity = request.identity();
        let class = self.route.class;

        if let Some((generation, entry)) = self.read(&identity).await {
            let status = self.route.status_of(&entry, Utc::now());
            debug!(%generation, url = identity.url(), status = status.as_str(), "serving cached copy");
            self.refresh_in_background(request, &generation);
            return Ok(Served::new(
                entry.into_inner(),
                FetchContext::cached(class, status, generation),
            ));
        }

        debug!(url = identity.url(), "cache miss, waiting for network");
        let response = self.network.fetch(request).await.inspect_err(|_| {
            metrics::record_network_error(class);
        })?;
        if response.is_ok() {
            store(
                self.storage.as_ref(),
                self.route.generation,
                &identity,
                response.clone(),
            )
            .await;
        }
        Ok(Served::new(
            response,
            FetchContext::network(class, CacheStatus::Miss),
        ))
    }
}

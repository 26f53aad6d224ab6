//! The cache controller.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use http::{StatusCode, Uri};
use stashbox_backend::CacheStorage;
use stashbox_core::{FetchRequest, GenerationSet, Network, RequestClass};
use tracing::{debug, info, warn};

use crate::classify::Classifier;
use crate::clients::ClientRegistry;
use crate::config::ControllerConfig;
use crate::error::{CacheError, ConfigError};
use crate::event::{EventHandler, FetchDisposition, Message};
use crate::lifecycle::{self, ActivateReport, InstallReport, Lifecycle, LifecycleState};
use crate::maintenance;
use crate::metrics;
use crate::offload::{OffloadManager, TaskKey};
use crate::policy::FetchStrategy;
use crate::strategy::{CacheFirst, NetworkFirst, Route, Served, StaleWhileRevalidate};

/// Offline asset cache for the pages of one origin.
///
/// Owns the generation set of one deployment version and resolves every
/// intercepted request with the strategy of its class. Storage and network
/// are injected, so the controller holds no global state.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Arc;
/// use stashbox::{CacheController, ControllerConfig, Dispatcher, Event};
/// use stashbox_core::Origin;
/// use stashbox_moka::MokaStorage;
///
/// let config = ControllerConfig::builder(Origin::parse("https://benefits.example")?).build()?;
/// let storage = Arc::new(MokaStorage::builder().unbounded().build());
/// let controller = CacheController::new(config, storage, network.clone())?;
///
/// let dispatcher = Dispatcher::new(controller, network);
/// dispatcher.dispatch(Event::Install).await?;
/// ```
pub struct CacheController<S: ?Sized, N> {
    config: ControllerConfig,
    generations: GenerationSet,
    classifier: Classifier,
    manifest: Vec<Uri>,
    storage: Arc<S>,
    network: N,
    offload: OffloadManager,
    clients: ClientRegistry,
    lifecycle: Lifecycle,
}

impl<S: ?Sized, N> std::fmt::Debug for CacheController<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheController")
            .field("origin", &self.config.origin)
            .field("version", &self.generations.version())
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

impl<S, N> CacheController<S, N>
where
    S: CacheStorage + ?Sized + 'static,
    N: Network,
{
    /// Creates a controller in the [`Parsed`](LifecycleState::Parsed) state.
    pub fn new(config: ControllerConfig, storage: Arc<S>, network: N) -> Result<Self, CacheError> {
        config.validate()?;
        let manifest = config.manifest_urls()?;
        let offload = OffloadManager::new(config.offload.clone());
        Ok(Self {
            generations: config.generation_set(),
            classifier: config.classifier(),
            manifest,
            storage,
            network,
            offload,
            clients: ClientRegistry::new(),
            lifecycle: Lifecycle::default(),
            config,
        })
    }

    /// Shares an existing client registry, e.g. with the previous version.
    pub fn with_clients(mut self, clients: ClientRegistry) -> Self {
        self.clients = clients;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Generations owned by this version.
    pub fn generations(&self) -> &GenerationSet {
        &self.generations
    }

    /// The request classifier.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The injected storage.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Background task manager used for revalidation.
    pub fn offload(&self) -> &OffloadManager {
        &self.offload
    }

    /// Open pages.
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Precaches the manifest into the precache generation.
    ///
    /// All or nothing: if any manifest URL fails or answers with a non-`2xx`
    /// status, nothing is written and the controller becomes
    /// [`Redundant`](LifecycleState::Redundant). Installing again overwrites
    /// the entries of an earlier, possibly partial, attempt.
    pub async fn install(&self) -> Result<InstallReport, CacheError> {
        self.lifecycle.enter(
            "install",
            &[
                LifecycleState::Parsed,
                LifecycleState::Installed,
                LifecycleState::Activated,
                LifecycleState::Redundant,
            ],
            LifecycleState::Installing,
        )?;

        let generation = self.generations.precache();
        info!(%generation, urls = self.manifest.len(), "installing");
        match lifecycle::precache(self.storage.as_ref(), &self.network, generation, &self.manifest)
            .await
        {
            Ok(precached) => {
                self.lifecycle.set(LifecycleState::Installed);
                info!(%generation, precached, "install complete");
                Ok(InstallReport {
                    generation: generation.clone(),
                    precached,
                })
            }
            Err(error) => {
                self.lifecycle.set(LifecycleState::Redundant);
                warn!(%generation, %error, "install failed");
                Err(error)
            }
        }
    }

    /// Deletes every generation of other versions and claims open pages.
    ///
    /// Running it again deletes nothing more.
    pub async fn activate(&self) -> Result<ActivateReport, CacheError> {
        let previous = self.lifecycle.enter(
            "activate",
            &[LifecycleState::Installed, LifecycleState::Activated],
            LifecycleState::Activating,
        )?;

        let deleted = match lifecycle::retire(self.storage.as_ref(), &self.generations).await {
            Ok(deleted) => deleted,
            Err(error) => {
                self.lifecycle.set(previous);
                return Err(error);
            }
        };
        metrics::record_generations_deleted("activate", deleted.len());

        let claimed = if self.config.lifecycle.claim_clients {
            self.clients.claim(self.generations.version())
        } else {
            0
        };
        self.lifecycle.set(LifecycleState::Activated);
        info!(
            version = self.generations.version(),
            deleted = deleted.len(),
            claimed,
            "activated"
        );
        Ok(ActivateReport { deleted, claimed })
    }

    /// Resolves an intercepted request, or declines it.
    ///
    /// Cross-origin and non-`GET` requests are declined without touching
    /// the storage, and so is every request until the controller is
    /// [`Activated`](LifecycleState::Activated).
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchDisposition, CacheError> {
        let state = self.lifecycle.state();
        if state != LifecycleState::Activated {
            debug!(uri = %request.uri(), %state, "not controlling pages");
            return Ok(FetchDisposition::Passthrough(request));
        }
        if !self.classifier.intercepts(&request) {
            debug!(uri = %request.uri(), method = %request.method(), "not intercepted");
            return Ok(FetchDisposition::Passthrough(request));
        }

        let class = self.classifier.classify(request.uri());
        self.resolve(class, request)
            .await
            .map(FetchDisposition::Intercepted)
    }

    /// Resolves `request` as a request of `class`.
    pub async fn resolve(
        &self,
        class: RequestClass,
        request: FetchRequest,
    ) -> Result<Served, CacheError> {
        let route = Route::resolve(class, &self.generations, &self.config.freshness);
        match FetchStrategy::for_class(class) {
            FetchStrategy::CacheFirst => {
                Ok(CacheFirst::new(self.storage.as_ref(), &self.network, route)
                    .fetch(request)
                    .await)
            }
            FetchStrategy::StaleWhileRevalidate => {
                StaleWhileRevalidate::new(&self.storage, &self.network, &self.offload, route)
                    .fetch(request)
                    .await
            }
            FetchStrategy::NetworkFirst => {
                NetworkFirst::new(self.storage.as_ref(), &self.network, route)
                    .fetch(request)
                    .await
            }
        }
    }

    /// Resolves every path through its class strategy, e.g. the
    /// [`image_paths`](stashbox_core::Catalog::image_paths) of the catalog.
    ///
    /// Paths are resolved concurrently. Returns how many ended with a `200`;
    /// failures are not errors, they only lower the count.
    pub async fn warm<'p, I>(&self, paths: I) -> Result<usize, CacheError>
    where
        I: IntoIterator<Item = &'p str>,
    {
        let requests = paths
            .into_iter()
            .map(|path| self.config.origin.resolve(path).map(FetchRequest::get))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ConfigError::from)?;

        let total = requests.len();
        let served = join_all(requests.into_iter().map(|request| {
            let class = self.classifier.classify(request.uri());
            self.resolve(class, request)
        }))
        .await;
        let warmed = served
            .into_iter()
            .filter(|served| matches!(served, Ok(served) if served.response.status() == StatusCode::OK))
            .count();
        info!(warmed, total, "warm-up finished");
        Ok(warmed)
    }

    /// Handles a message posted by a page.
    pub async fn handle_message(&self, message: Message) -> Result<(), CacheError> {
        match message {
            Message::ClearCache => {
                let removed = self.clear_all().await?;
                info!(removed, "all caches cleared");
                Ok(())
            }
            Message::Unknown => {
                debug!("ignoring unknown message");
                Ok(())
            }
        }
    }

    /// Deletes every generation, including those of this version.
    pub async fn clear_all(&self) -> Result<usize, CacheError> {
        maintenance::clear_all(self.storage.as_ref()).await
    }
}

impl<S, N> CacheController<S, N>
where
    S: CacheStorage + ?Sized + 'static,
    N: Network + 'static,
{
    /// Runs [`warm`](Self::warm) as a `"warmup"` task on the offload manager.
    ///
    /// The returned key can be waited for or cancelled through
    /// [`offload`](Self::offload). Errors are logged.
    pub fn warm_in_background(self: &Arc<Self>, paths: Vec<String>) -> TaskKey {
        let controller = Arc::clone(self);
        self.offload.spawn("warmup", async move {
            if let Err(error) = controller.warm(paths.iter().map(String::as_str)).await {
                warn!(%error, "warm-up failed");
            }
        })
    }
}

#[async_trait]
impl<S, N> EventHandler for CacheController<S, N>
where
    S: CacheStorage + ?Sized + 'static,
    N: Network,
{
    async fn on_install(&self) -> Result<InstallReport, CacheError> {
        self.install().await
    }

    async fn on_activate(&self) -> Result<ActivateReport, CacheError> {
        self.activate().await
    }

    async fn on_fetch(&self, request: FetchRequest) -> Result<FetchDisposition, CacheError> {
        self.fetch(request).await
    }

    async fn on_message(&self, message: Message) -> Result<(), CacheError> {
        self.handle_message(message).await
    }

    fn skip_waiting(&self) -> bool {
        self.config.lifecycle.skip_waiting
    }
}

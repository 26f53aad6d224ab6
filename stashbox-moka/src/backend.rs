//! Moka storage implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use stashbox_backend::{CacheStorage, DeleteStatus, StorageResult};
use stashbox_core::{CachedResponse, GenerationName, RequestIdentity, StorageLabel};
use tracing::debug;

use crate::builder::{MokaStorageBuilder, NoCapacity};

pub(crate) type GenerationCache = Cache<RequestIdentity, CachedResponse>;
pub(crate) type CacheFactory = Arc<dyn Fn() -> GenerationCache + Send + Sync>;

#[derive(Clone)]
struct Slot {
    sequence: u64,
    cache: GenerationCache,
}

/// In-memory cache storage powered by Moka.
///
/// Each generation is its own Moka async cache, created lazily by `open` or
/// the first `put`. Generations remember their creation order so `keys`
/// and `lookup_any` can walk them oldest first.
///
/// # Examples
///
/// ```
/// use stashbox_moka::MokaStorage;
///
/// let storage = MokaStorage::builder()
///     .label("pages")
///     .max_entries(1_000)
///     .build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted** — every generation is lost on process restart
/// - With a capacity configured, Moka may evict entries of a generation to
///   stay within its limit; the controller treats an evicted entry as a miss
#[derive(Clone)]
pub struct MokaStorage {
    generations: Arc<DashMap<GenerationName, Slot>>,
    sequence: Arc<AtomicU64>,
    factory: CacheFactory,
    label: StorageLabel,
}

impl std::fmt::Debug for MokaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStorage")
            .field("label", &self.label)
            .field("generations", &self.generations.len())
            .finish()
    }
}

impl MokaStorage {
    /// Creates a new builder for `MokaStorage`.
    ///
    /// A capacity mode must be chosen before calling `build()`.
    pub fn builder() -> MokaStorageBuilder<NoCapacity> {
        MokaStorageBuilder::new()
    }

    pub(crate) fn from_parts(factory: CacheFactory, label: StorageLabel) -> Self {
        Self {
            generations: Arc::new(DashMap::new()),
            sequence: Arc::new(AtomicU64::new(0)),
            factory,
            label,
        }
    }

    fn slot(&self, name: &GenerationName) -> GenerationCache {
        self.generations
            .entry(name.clone())
            .or_insert_with(|| {
                debug!(generation = %name, storage = %self.label, "generation created");
                Slot {
                    sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
                    cache: (self.factory)(),
                }
            })
            .cache
            .clone()
    }

    fn existing(&self, name: &GenerationName) -> Option<GenerationCache> {
        self.generations.get(name).map(|slot| slot.cache.clone())
    }

    fn ordered(&self) -> Vec<(GenerationName, GenerationCache)> {
        let mut slots: Vec<_> = self
            .generations
            .iter()
            .map(|entry| (entry.value().sequence, entry.key().clone(), entry.value().cache.clone()))
            .collect();
        slots.sort_by_key(|(sequence, _, _)| *sequence);
        slots
            .into_iter()
            .map(|(_, name, cache)| (name, cache))
            .collect()
    }

    async fn entry_count(cache: &GenerationCache) -> usize {
        cache.run_pending_tasks().await;
        cache.entry_count() as usize
    }
}

#[async_trait]
impl CacheStorage for MokaStorage {
    async fn open(&self, name: &GenerationName) -> StorageResult<()> {
        self.slot(name);
        Ok(())
    }

    async fn lookup(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<CachedResponse>> {
        match self.existing(name) {
            Some(cache) => Ok(cache.get(identity).await),
            None => Ok(None),
        }
    }

    async fn lookup_any(
        &self,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<(GenerationName, CachedResponse)>> {
        for (name, cache) in self.ordered() {
            if let Some(entry) = cache.get(identity).await {
                return Ok(Some((name, entry)));
            }
        }
        Ok(None)
    }

    async fn put(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
        entry: CachedResponse,
    ) -> StorageResult<()> {
        let cache = self.slot(name);
        cache.insert(identity.clone(), entry).await;
        crate::metrics::record_capacity(
            self.label.as_str(),
            name.as_str(),
            cache.entry_count(),
            cache.weighted_size(),
        );
        Ok(())
    }

    async fn delete(&self, name: &GenerationName) -> StorageResult<DeleteStatus> {
        match self.generations.remove(name) {
            Some((_, slot)) => {
                let entries = Self::entry_count(&slot.cache).await;
                slot.cache.invalidate_all();
                debug!(generation = %name, entries, storage = %self.label, "generation deleted");
                Ok(DeleteStatus::Deleted(entries))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationName>> {
        Ok(self.ordered().into_iter().map(|(name, _)| name).collect())
    }

    async fn len(&self, name: &GenerationName) -> StorageResult<usize> {
        match self.existing(name) {
            Some(cache) => Ok(Self::entry_count(&cache).await),
            None => Ok(0),
        }
    }

    fn label(&self) -> StorageLabel {
        self.label.clone()
    }
}

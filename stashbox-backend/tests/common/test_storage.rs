//! Simple in-memory test storage implementation using DashMap.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use stashbox_backend::{CacheStorage, DeleteStatus, StorageError, StorageResult};
use stashbox_core::{CachedResponse, GenerationName, RequestIdentity, StorageLabel};

type Entries = DashMap<RequestIdentity, CachedResponse>;

/// Simple in-memory storage for testing using DashMap.
///
/// This storage is thread-safe and can be cloned cheaply (Arc internally).
#[derive(Clone, Default)]
pub struct TestStorage {
    generations: Arc<DashMap<GenerationName, (u64, Arc<Entries>)>>,
    sequence: Arc<AtomicU64>,
}

impl TestStorage {
    /// Create a new empty test storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self, name: &GenerationName) -> Arc<Entries> {
        self.generations
            .entry(name.clone())
            .or_insert_with(|| {
                let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
                (seq, Arc::new(DashMap::new()))
            })
            .1
            .clone()
    }

    fn ordered(&self) -> Vec<(GenerationName, Arc<Entries>)> {
        let mut all: Vec<_> = self
            .generations
            .iter()
            .map(|e| (e.value().0, e.key().clone(), e.value().1.clone()))
            .collect();
        all.sort_by_key(|(seq, _, _)| *seq);
        all.into_iter().map(|(_, name, entries)| (name, entries)).collect()
    }
}

#[async_trait]
impl CacheStorage for TestStorage {
    async fn open(&self, name: &GenerationName) -> StorageResult<()> {
        self.entries(name);
        Ok(())
    }

    async fn lookup(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<CachedResponse>> {
        Ok(self
            .generations
            .get(name)
            .and_then(|g| g.1.get(identity).map(|v| v.clone())))
    }

    async fn lookup_any(
        &self,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<(GenerationName, CachedResponse)>> {
        Ok(self.ordered().into_iter().find_map(|(name, entries)| {
            entries.get(identity).map(|v| (name, v.clone()))
        }))
    }

    async fn put(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
        entry: CachedResponse,
    ) -> StorageResult<()> {
        self.entries(name).insert(identity.clone(), entry);
        Ok(())
    }

    async fn delete(&self, name: &GenerationName) -> StorageResult<DeleteStatus> {
        Ok(match self.generations.remove(name) {
            Some((_, (_, entries))) => DeleteStatus::Deleted(entries.len()),
            None => DeleteStatus::Missing,
        })
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationName>> {
        Ok(self.ordered().into_iter().map(|(name, _)| name).collect())
    }

    async fn len(&self, name: &GenerationName) -> StorageResult<usize> {
        Ok(self.generations.get(name).map_or(0, |g| g.1.len()))
    }

    fn label(&self) -> StorageLabel {
        StorageLabel::new_static("test")
    }
}

/// Storage that always returns errors (for error testing).
#[derive(Clone, Default)]
pub struct UnavailableStorage;

#[async_trait]
impl CacheStorage for UnavailableStorage {
    async fn open(&self, _name: &GenerationName) -> StorageResult<()> {
        Err(StorageError::Unavailable)
    }

    async fn lookup(
        &self,
        _name: &GenerationName,
        _identity: &RequestIdentity,
    ) -> StorageResult<Option<CachedResponse>> {
        Err(StorageError::Unavailable)
    }

    async fn lookup_any(
        &self,
        _identity: &RequestIdentity,
    ) -> StorageResult<Option<(GenerationName, CachedResponse)>> {
        Err(StorageError::Unavailable)
    }

    async fn put(
        &self,
        _name: &GenerationName,
        _identity: &RequestIdentity,
        _entry: CachedResponse,
    ) -> StorageResult<()> {
        Err(StorageError::QuotaExceeded)
    }

    async fn delete(&self, _name: &GenerationName) -> StorageResult<DeleteStatus> {
        Err(StorageError::Unavailable)
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationName>> {
        Err(StorageError::Unavailable)
    }

    async fn len(&self, _name: &GenerationName) -> StorageResult<usize> {
        Err(StorageError::Unavailable)
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use stashbox_backend::{CacheStorage, DeleteStatus, StorageError, StorageResult};
use stashbox_core::{
    CachedResponse, EntryOrigin, FetchResponse, GenerationName, RequestIdentity, StorageLabel,
};

#[derive(Debug, Default)]
pub struct StorageCounters {
    pub open_count: AtomicUsize,
    pub lookup_count: AtomicUsize,
    pub lookup_hit_count: AtomicUsize,
    pub lookup_miss_count: AtomicUsize,
    pub put_count: AtomicUsize,
    pub delete_count: AtomicUsize,
    pub keys_count: AtomicUsize,
}

impl StorageCounters {
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    pub fn lookup_hit_count(&self) -> usize {
        self.lookup_hit_count.load(Ordering::SeqCst)
    }

    pub fn lookup_miss_count(&self) -> usize {
        self.lookup_miss_count.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    pub fn keys_count(&self) -> usize {
        self.keys_count.load(Ordering::SeqCst)
    }

    /// Every call of any kind.
    pub fn total(&self) -> usize {
        self.open_count()
            + self.lookup_count()
            + self.put_count()
            + self.delete_count()
            + self.keys_count()
    }

    pub fn reset(&self) {
        self.open_count.store(0, Ordering::SeqCst);
        self.lookup_count.store(0, Ordering::SeqCst);
        self.lookup_hit_count.store(0, Ordering::SeqCst);
        self.lookup_miss_count.store(0, Ordering::SeqCst);
        self.put_count.store(0, Ordering::SeqCst);
        self.delete_count.store(0, Ordering::SeqCst);
        self.keys_count.store(0, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct Slot {
    created: u64,
    entries: HashMap<RequestIdentity, CachedResponse>,
}

/// In-memory [`CacheStorage`] that counts every call.
///
/// Calls are counted even while the storage is switched to failing, so a
/// test can tell "not called" apart from "called and failed".
#[derive(Clone, Debug, Default)]
pub struct MockStorage {
    generations: Arc<DashMap<GenerationName, Slot>>,
    sequence: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
    pub counters: Arc<StorageCounters>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with [`StorageError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stores `response` as if it had been captured at `captured_at`.
    pub fn seed(
        &self,
        generation: &GenerationName,
        identity: &RequestIdentity,
        response: FetchResponse,
        captured_at: DateTime<Utc>,
    ) {
        let entry = CachedResponse::new(response, captured_at, EntryOrigin::Network);
        self.slot(generation).entries.insert(identity.clone(), entry);
    }

    /// Reads an entry without touching the counters.
    pub fn peek(
        &self,
        generation: &GenerationName,
        identity: &RequestIdentity,
    ) -> Option<CachedResponse> {
        self.generations
            .get(generation)
            .and_then(|slot| slot.entries.get(identity).cloned())
    }

    /// Generation names in creation order, without touching the counters.
    pub fn generation_names(&self) -> Vec<GenerationName> {
        let mut names: Vec<_> = self
            .generations
            .iter()
            .map(|slot| (slot.created, slot.key().clone()))
            .collect();
        names.sort_by_key(|(created, _)| *created);
        names.into_iter().map(|(_, name)| name).collect()
    }

    pub fn entry_count(&self, generation: &GenerationName) -> usize {
        self.generations
            .get(generation)
            .map(|slot| slot.entries.len())
            .unwrap_or(0)
    }

    pub fn open_count(&self) -> usize {
        self.counters.open_count()
    }

    pub fn lookup_count(&self) -> usize {
        self.counters.lookup_count()
    }

    pub fn put_count(&self) -> usize {
        self.counters.put_count()
    }

    pub fn delete_count(&self) -> usize {
        self.counters.delete_count()
    }

    pub fn call_count(&self) -> usize {
        self.counters.total()
    }

    pub fn reset_counters(&self) {
        self.counters.reset();
    }

    fn slot(
        &self,
        name: &GenerationName,
    ) -> dashmap::mapref::one::RefMut<'_, GenerationName, Slot> {
        self.generations.entry(name.clone()).or_insert_with(|| Slot {
            created: self.sequence.fetch_add(1, Ordering::SeqCst),
            entries: HashMap::new(),
        })
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn record_lookup<T>(&self, found: &Option<T>) {
        if found.is_some() {
            self.counters.lookup_hit_count.fetch_add(1, Ordering::SeqCst);
        } else {
            self.counters.lookup_miss_count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl CacheStorage for MockStorage {
    async fn open(&self, name: &GenerationName) -> StorageResult<()> {
        self.counters.open_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.slot(name);
        Ok(())
    }

    async fn lookup(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<CachedResponse>> {
        self.counters.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let found = self.peek(name, identity);
        self.record_lookup(&found);
        Ok(found)
    }

    async fn lookup_any(
        &self,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<(GenerationName, CachedResponse)>> {
        self.counters.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let found = self.generation_names().into_iter().find_map(|name| {
            let entry = self.peek(&name, identity)?;
            Some((name, entry))
        });
        self.record_lookup(&found);
        Ok(found)
    }

    async fn put(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
        entry: CachedResponse,
    ) -> StorageResult<()> {
        self.counters.put_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.slot(name).entries.insert(identity.clone(), entry);
        Ok(())
    }

    async fn delete(&self, name: &GenerationName) -> StorageResult<DeleteStatus> {
        self.counters.delete_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        match self.generations.remove(name) {
            Some((_, slot)) => Ok(DeleteStatus::Deleted(slot.entries.len())),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationName>> {
        self.counters.keys_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.generation_names())
    }

    async fn len(&self, name: &GenerationName) -> StorageResult<usize> {
        self.check()?;
        Ok(self.entry_count(name))
    }

    fn label(&self) -> StorageLabel {
        StorageLabel::new_static("mock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, Uri};

    fn identity(path: &str) -> RequestIdentity {
        let uri: Uri = format!("https://benefits.example{path}").parse().unwrap();
        RequestIdentity::new(Method::GET, &uri)
    }

    #[tokio::test]
    async fn test_lookup_any_follows_creation_order() {
        let storage = MockStorage::new();
        let older = GenerationName::new("a-v1");
        let newer = GenerationName::new("a-v2");
        let id = identity("/styles.css");

        storage.open(&older).await.unwrap();
        storage.open(&newer).await.unwrap();
        storage.seed(&newer, &id, FetchResponse::ok("new"), Utc::now());
        storage.seed(&older, &id, FetchResponse::ok("old"), Utc::now());

        let (generation, entry) = storage.lookup_any(&id).await.unwrap().unwrap();
        assert_eq!(generation, older);
        assert_eq!(entry.data().body().as_ref(), b"old");
        assert_eq!(storage.counters.lookup_hit_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_storage_still_counts_calls() {
        let storage = MockStorage::new();
        storage.set_failing(true);

        assert!(storage.keys().await.is_err());
        assert!(
            storage
                .lookup_any(&identity("/index.html"))
                .await
                .is_err()
        );
        assert_eq!(storage.call_count(), 2);
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use stashbox_core::{CachedResponse, GenerationName, RequestIdentity, StorageLabel};

use crate::{DeleteStatus, StorageError};

pub type StorageResult<T> = Result<T, StorageError>;

/// Named cache generations shared by every page of an origin.
///
/// All mutations happen at the granularity of one request identity
/// (`put`) or one whole generation (`delete`); no multi-entry transactions
/// are assumed. Concurrent `put`s for the same identity are last-writer-wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Creates the generation if it does not exist yet. Idempotent.
    async fn open(&self, name: &GenerationName) -> StorageResult<()>;

    /// Looks up `identity` in one generation.
    ///
    /// A missing generation is a miss and is not created.
    async fn lookup(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<CachedResponse>>;

    /// Looks up `identity` in every generation, oldest generation first.
    async fn lookup_any(
        &self,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<(GenerationName, CachedResponse)>>;

    /// Stores `entry` under `identity`, overwriting any previous entry and
    /// creating the generation if needed.
    async fn put(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
        entry: CachedResponse,
    ) -> StorageResult<()>;

    /// Deletes a whole generation.
    async fn delete(&self, name: &GenerationName) -> StorageResult<DeleteStatus>;

    /// Names of all generations, in creation order.
    async fn keys(&self) -> StorageResult<Vec<GenerationName>>;

    /// Number of entries in a generation; zero if it does not exist.
    async fn len(&self, name: &GenerationName) -> StorageResult<usize>;

    /// Returns the label of this storage for logs and metrics.
    fn label(&self) -> StorageLabel {
        StorageLabel::new_static("storage")
    }

    /// Returns a handle scoped to one generation.
    fn generation<'a>(&'a self, name: &'a GenerationName) -> Generation<'a, Self>
    where
        Self: Sized,
    {
        Generation::new(self, name)
    }
}

#[async_trait]
impl CacheStorage for &dyn CacheStorage {
    async fn open(&self, name: &GenerationName) -> StorageResult<()> {
        (*self).open(name).await
    }

    async fn lookup(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<CachedResponse>> {
        (*self).lookup(name, identity).await
    }

    async fn lookup_any(
        &self,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<(GenerationName, CachedResponse)>> {
        (*self).lookup_any(identity).await
    }

    async fn put(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
        entry: CachedResponse,
    ) -> StorageResult<()> {
        (*self).put(name, identity, entry).await
    }

    async fn delete(&self, name: &GenerationName) -> StorageResult<DeleteStatus> {
        (*self).delete(name).await
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationName>> {
        (*self).keys().await
    }

    async fn len(&self, name: &GenerationName) -> StorageResult<usize> {
        (*self).len(name).await
    }

    fn label(&self) -> StorageLabel {
        (*self).label()
    }
}

#[async_trait]
impl CacheStorage for Box<dyn CacheStorage> {
    async fn open(&self, name: &GenerationName) -> StorageResult<()> {
        (**self).open(name).await
    }

    async fn lookup(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<CachedResponse>> {
        (**self).lookup(name, identity).await
    }

    async fn lookup_any(
        &self,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<(GenerationName, CachedResponse)>> {
        (**self).lookup_any(identity).await
    }

    async fn put(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
        entry: CachedResponse,
    ) -> StorageResult<()> {
        (**self).put(name, identity, entry).await
    }

    async fn delete(&self, name: &GenerationName) -> StorageResult<DeleteStatus> {
        (**self).delete(name).await
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationName>> {
        (**self).keys().await
    }

    async fn len(&self, name: &GenerationName) -> StorageResult<usize> {
        (**self).len(name).await
    }

    fn label(&self) -> StorageLabel {
        (**self).label()
    }
}

#[async_trait]
impl CacheStorage for Arc<dyn CacheStorage + Send + 'static> {
    async fn open(&self, name: &GenerationName) -> StorageResult<()> {
        (**self).open(name).await
    }

    async fn lookup(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<CachedResponse>> {
        (**self).lookup(name, identity).await
    }

    async fn lookup_any(
        &self,
        identity: &RequestIdentity,
    ) -> StorageResult<Option<(GenerationName, CachedResponse)>> {
        (**self).lookup_any(identity).await
    }

    async fn put(
        &self,
        name: &GenerationName,
        identity: &RequestIdentity,
        entry: CachedResponse,
    ) -> StorageResult<()> {
        (**self).put(name, identity, entry).await
    }

    async fn delete(&self, name: &GenerationName) -> StorageResult<DeleteStatus> {
        (**self).delete(name).await
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationName>> {
        (**self).keys().await
    }

    async fn len(&self, name: &GenerationName) -> StorageResult<usize> {
        (**self).len(name).await
    }

    fn label(&self) -> StorageLabel {
        (**self).label()
    }
}

/// A storage handle bound to one generation name.
///
/// Mirrors the "open a cache, then match/put in it" usage pattern.
#[derive(Debug)]
pub struct Generation<'a, S: ?Sized> {
    storage: &'a S,
    name: &'a GenerationName,
}

impl<'a, S> Generation<'a, S>
where
    S: CacheStorage + ?Sized,
{
    /// Binds `storage` to the generation `name`.
    pub fn new(storage: &'a S, name: &'a GenerationName) -> Self {
        Self { storage, name }
    }

    /// The bound generation name.
    pub fn name(&self) -> &GenerationName {
        self.name
    }

    /// Looks up `identity` in this generation.
    pub async fn lookup(&self, identity: &RequestIdentity) -> StorageResult<Option<CachedResponse>> {
        self.storage.lookup(self.name, identity).await
    }

    /// Stores `entry` under `identity` in this generation.
    pub async fn put(&self, identity: &RequestIdentity, entry: CachedResponse) -> StorageResult<()> {
        self.storage.put(self.name, identity, entry).await
    }

    /// Number of entries in this generation.
    pub async fn len(&self) -> StorageResult<usize> {
        self.storage.len(self.name).await
    }
}

//! Builder for configuring [`MokaStorage`].

use std::sync::Arc;

use moka::future::CacheBuilder;
use moka::policy::EvictionPolicy;
use stashbox_core::{CachedResponse, RequestIdentity, StorageLabel};

use crate::backend::{CacheFactory, GenerationCache, MokaStorage};

/// Marker type: capacity mode has not been chosen yet.
///
/// This is the initial state of a [`MokaStorageBuilder`]. Call one of
/// [`unbounded()`](MokaStorageBuilder::unbounded),
/// [`max_entries()`](MokaStorageBuilder::max_entries) or
/// [`max_bytes()`](MokaStorageBuilder::max_bytes) before `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: generations grow without limit.
#[derive(Debug, Clone, Copy)]
pub struct Unbounded;

/// Marker type: each generation holds at most `n` entries.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: each generation uses at most `n` bytes (approximate).
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaStorage`].
///
/// Capacity limits apply **per generation**. The capacity methods use the
/// typestate pattern: `build()` only exists once a mode is chosen, and a
/// mode cannot be chosen twice.
///
/// # Examples
///
/// ```
/// use stashbox_moka::{EvictionPolicy, MokaStorage};
///
/// let storage = MokaStorage::builder()
///     .label("benefits")
///     .eviction_policy(EvictionPolicy::lru())
///     .max_bytes(50 * 1024 * 1024)
///     .build();
/// ```
pub struct MokaStorageBuilder<Cap> {
    capacity: Cap,
    label: StorageLabel,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaStorageBuilder<NoCapacity> {
    /// Creates a new builder with no capacity mode chosen.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: StorageLabel::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Generations are never trimmed.
    pub fn unbounded(self) -> MokaStorageBuilder<Unbounded> {
        self.with_capacity(Unbounded)
    }

    /// Sets the maximum number of entries per generation.
    pub fn max_entries(self, capacity: u64) -> MokaStorageBuilder<EntryCapacity> {
        self.with_capacity(EntryCapacity(capacity))
    }

    /// Sets the approximate memory budget per generation, in bytes.
    ///
    /// The weight of an entry is its URL length plus
    /// [`CachedResponse::memory_size`](stashbox_core::CacheEntry::memory_size).
    pub fn max_bytes(self, bytes: u64) -> MokaStorageBuilder<ByteCapacity> {
        self.with_capacity(ByteCapacity(bytes))
    }

    fn with_capacity<Cap>(self, capacity: Cap) -> MokaStorageBuilder<Cap> {
        MokaStorageBuilder {
            capacity,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaStorageBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaStorageBuilder<Cap> {
    /// Sets a custom label for this storage.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<StorageLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy used once a generation is full.
    ///
    /// # Default
    ///
    /// - **Entry-based capacity**: [`EvictionPolicy::tiny_lfu()`]
    /// - **Byte-based capacity**: [`EvictionPolicy::lru()`], TinyLFU admission
    ///   can reject a fresh response even when eviction could make room
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaStorageBuilder<Unbounded> {
    /// Builds the [`MokaStorage`].
    pub fn build(self) -> MokaStorage {
        let factory: CacheFactory = Arc::new(|| GenerationCache::builder().build());
        MokaStorage::from_parts(factory, self.label)
    }
}

impl MokaStorageBuilder<EntryCapacity> {
    /// Builds the [`MokaStorage`] with entry-count based capacity.
    pub fn build(self) -> MokaStorage {
        let capacity = self.capacity.0;
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::tiny_lfu);
        let factory: CacheFactory = Arc::new(move || {
            let cache: GenerationCache = CacheBuilder::new(capacity)
                .eviction_policy(policy.clone())
                .build();
            cache
        });
        MokaStorage::from_parts(factory, self.label)
    }
}

impl MokaStorageBuilder<ByteCapacity> {
    /// Builds the [`MokaStorage`] with byte-based capacity.
    pub fn build(self) -> MokaStorage {
        let capacity = self.capacity.0;
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let factory: CacheFactory = Arc::new(move || {
            let cache: GenerationCache = CacheBuilder::new(capacity)
                .weigher(byte_weigher)
                .eviction_policy(policy.clone())
                .build();
            cache
        });
        MokaStorage::from_parts(factory, self.label)
    }
}

/// Approximate byte cost of a stored response.
fn byte_weigher(identity: &RequestIdentity, entry: &CachedResponse) -> u32 {
    (identity.url().len() + entry.memory_size()).min(u32::MAX as usize) as u32
}

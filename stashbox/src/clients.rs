//! Pages controlled by the cache controller.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use smol_str::SmolStr;
use tracing::debug;

/// Identifier of an open page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    /// Returns the raw identifier.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Open pages and the controller version each one is controlled by.
///
/// A page opened before the first activation starts uncontrolled. Claiming
/// moves every registered page under the given version without a reload.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<DashMap<ClientId, Option<SmolStr>>>,
    next: Arc<AtomicU64>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly opened, uncontrolled page.
    pub fn register(&self) -> ClientId {
        let id = ClientId(self.next.fetch_add(1, Ordering::Relaxed));
        self.clients.insert(id, None);
        id
    }

    /// Forgets a closed page.
    pub fn remove(&self, id: ClientId) -> bool {
        self.clients.remove(&id).is_some()
    }

    /// Puts every registered page under `version`.
    ///
    /// Returns how many pages changed controller.
    pub fn claim(&self, version: &str) -> usize {
        let mut claimed = 0;
        for mut entry in self.clients.iter_mut() {
            if entry.value().as_deref() != Some(version) {
                *entry.value_mut() = Some(SmolStr::new(version));
                claimed += 1;
            }
        }
        debug!(version, claimed, "clients claimed");
        claimed
    }

    /// Version controlling `id`, if any.
    pub fn controller_of(&self, id: ClientId) -> Option<SmolStr> {
        self.clients.get(&id).and_then(|entry| entry.value().clone())
    }

    /// Pages not controlled by any version, in registration order.
    pub fn uncontrolled(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|entry| entry.value().is_none())
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        ids
    }

    /// Number of registered pages.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if no page is registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

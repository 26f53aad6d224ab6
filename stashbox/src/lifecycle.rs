//! Install and activation of cache generations.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use futures::future::try_join_all;
use http::Uri;
use stashbox_backend::CacheStorage;
use stashbox_core::{
    CachedResponse, FetchRequest, GenerationName, GenerationSet, Network,
};
use tracing::{debug, info};

use crate::error::CacheError;

/// Where the controller is in its lifecycle.
///
/// ```text
/// Parsed -> Installing -> Installed -> Activating -> Activated
///               |
///               +-> Redundant
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    /// Created, nothing installed yet.
    Parsed = 0,
    /// Precache in progress.
    Installing = 1,
    /// Precache complete, waiting to activate.
    Installed = 2,
    /// Retiring old generations.
    Activating = 3,
    /// In control of pages.
    Activated = 4,
    /// Install failed; this version will never activate.
    Redundant = 5,
}

impl LifecycleState {
    /// Returns the state as a string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
            LifecycleState::Redundant => "redundant",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Parsed,
            1 => LifecycleState::Installing,
            2 => LifecycleState::Installed,
            3 => LifecycleState::Activating,
            4 => LifecycleState::Activated,
            _ => LifecycleState::Redundant,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free lifecycle state cell.
#[derive(Debug)]
pub(crate) struct Lifecycle(AtomicU8);

impl Default for Lifecycle {
    fn default() -> Self {
        Self(AtomicU8::new(LifecycleState::Parsed as u8))
    }
}

impl Lifecycle {
    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: LifecycleState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Moves to `next` if the current state is one of `from`.
    pub(crate) fn enter(
        &self,
        operation: &'static str,
        from: &[LifecycleState],
        next: LifecycleState,
    ) -> Result<LifecycleState, CacheError> {
        let mut current = self.state();
        loop {
            if !from.contains(&current) {
                return Err(CacheError::InvalidState {
                    operation,
                    state: current,
                });
            }
            match self.0.compare_exchange(
                current as u8,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(current),
                Err(actual) => current = LifecycleState::from_u8(actual),
            }
        }
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Generation that was seeded.
    pub generation: GenerationName,
    /// Number of manifest entries stored.
    pub precached: usize,
}

/// Result of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    /// Generations removed because they belong to another version.
    pub deleted: Vec<GenerationName>,
    /// Pages that changed controller.
    pub claimed: usize,
}

/// Fetches every manifest URL and stores the responses in `generation`.
///
/// All URLs are fetched concurrently and must answer with a `2xx` status.
/// Nothing is written unless every fetch succeeded.
pub(crate) async fn precache<S, N>(
    storage: &S,
    network: &N,
    generation: &GenerationName,
    manifest: &[Uri],
) -> Result<usize, CacheError>
where
    S: CacheStorage + ?Sized,
    N: Network + ?Sized,
{
    storage.open(generation).await?;

    let fetches = manifest.iter().map(|url| {
        let request = FetchRequest::get(url.clone());
        let identity = request.identity();
        let response = network.fetch(request);
        let url = url.to_string();
        async move {
            match response.await {
                Ok(response) if response.is_ok() => Ok((identity, response)),
                Ok(response) => Err(CacheError::Precache {
                    url,
                    reason: format!("unexpected status {}", response.status()),
                }),
                Err(error) => Err(CacheError::Precache {
                    url,
                    reason: error.to_string(),
                }),
            }
        }
    });
    let responses = try_join_all(fetches).await?;

    let precached = responses.len();
    for (identity, response) in responses {
        debug!(generation = %generation, url = identity.url(), "precached");
        storage
            .put(generation, &identity, CachedResponse::from_network(response))
            .await?;
    }
    Ok(precached)
}

/// Deletes every generation that does not belong to `current`.
pub(crate) async fn retire<S>(
    storage: &S,
    current: &GenerationSet,
) -> Result<Vec<GenerationName>, CacheError>
where
    S: CacheStorage + ?Sized,
{
    let mut deleted = Vec::new();
    for name in storage.keys().await? {
        if current.contains(&name) {
            continue;
        }
        if storage.delete(&name).await?.is_deleted() {
            info!(generation = %name, "deleting old cache generation");
            deleted.push(name);
        }
    }
    Ok(deleted)
}

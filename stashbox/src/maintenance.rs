//! Manual cache invalidation.

use stashbox_backend::CacheStorage;
use tracing::info;

use crate::error::CacheError;
use crate::metrics;

/// Deletes every generation the storage knows about, whatever its version.
///
/// Returns the number of generations removed.
pub async fn clear_all<S>(storage: &S) -> Result<usize, CacheError>
where
    S: CacheStorage + ?Sized,
{
    let mut removed = 0;
    for name in storage.keys().await? {
        if storage.delete(&name).await?.is_deleted() {
            info!(generation = %name, "cache generation cleared");
            removed += 1;
        }
    }
    metrics::record_generations_deleted("clear", removed);
    Ok(removed)
}

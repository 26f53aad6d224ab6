use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use smol_str::SmolStr;
use stashbox_core::{Offload, RequestIdentity};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};
use crate::metrics;

const REFRESH: &str = "revalidate";

/// Identifies a background task in the task table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// Refresh of one cached request. Only these keys are deduplicated.
    Refresh(RequestIdentity),
    /// Any other task, numbered within its kind.
    Adhoc {
        /// Kind used for metric labels, e.g. `"warmup"`.
        kind: SmolStr,
        /// Sequence number.
        id: u64,
    },
}

impl TaskKey {
    /// Metric label for the task.
    pub fn kind(&self) -> SmolStr {
        match self {
            TaskKey::Refresh(_) => SmolStr::new_static(REFRESH),
            TaskKey::Adhoc { kind, .. } => kind.clone(),
        }
    }

    fn is_refresh(&self) -> bool {
        matches!(self, TaskKey::Refresh(_))
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKey::Refresh(identity) => write!(f, "{REFRESH} {identity}"),
            TaskKey::Adhoc { kind, id } => write!(f, "{kind}#{id}"),
        }
    }
}

impl From<RequestIdentity> for TaskKey {
    fn from(identity: RequestIdentity) -> Self {
        TaskKey::Refresh(identity)
    }
}

#[derive(Debug)]
struct Running {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct Shared {
    config: OffloadConfig,
    tasks: DashMap<TaskKey, Running>,
    sequence: AtomicU64,
}

enum Finished {
    Completed,
    TimedOut,
}

/// Runs background refreshes detached from the request that asked for them.
///
/// A refresh of a request that is still being refreshed is skipped when
/// deduplication is on. Every task runs under the configured
/// [`TimeoutPolicy`] inside an `offload_task` span. Clones share one task
/// table.
#[derive(Clone, Debug, Default)]
pub struct OffloadManager {
    shared: Arc<Shared>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            config: OffloadConfig::default(),
            tasks: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }
}

impl OffloadManager {
    /// Creates a manager with an empty task table.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                ..Shared::default()
            }),
        }
    }

    /// The settings this manager was created with.
    pub fn config(&self) -> &OffloadConfig {
        &self.shared.config
    }

    /// Spawns an untracked-kind task under a fresh key.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> TaskKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = TaskKey::Adhoc {
            kind: kind.into(),
            id: self.shared.sequence.fetch_add(1, Ordering::Relaxed),
        };
        self.spawn_keyed(key.clone(), task);
        key
    }

    /// Spawns `task` under `key`.
    ///
    /// Returns `false` without polling `task` when it is a refresh, the
    /// same refresh is still running and deduplication is on.
    pub fn spawn_keyed<F>(&self, key: impl Into<TaskKey>, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let kind = key.kind();

        match self.shared.tasks.entry(key.clone()) {
            Entry::Occupied(running)
                if self.shared.config.deduplicate
                    && key.is_refresh()
                    && !running.get().handle.is_finished() =>
            {
                debug!(%key, "refresh already in flight");
                metrics::record_offload_deduplicated(&kind);
                return false;
            }
            entry => {
                entry.insert(self.launch(key, task));
            }
        }

        metrics::record_offload_spawned(&kind);
        true
    }

    /// Tasks that have not finished yet.
    pub fn active_task_count(&self) -> usize {
        self.shared
            .tasks
            .iter()
            .filter(|running| !running.handle.is_finished())
            .count()
    }

    /// Tasks still in the table, finished or not.
    pub fn total_task_count(&self) -> usize {
        self.shared.tasks.len()
    }

    /// Whether the task under `key` is still running.
    pub fn is_in_flight(&self, key: &TaskKey) -> bool {
        self.shared
            .tasks
            .get(key)
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Drops table entries of finished or aborted tasks.
    pub fn cleanup_finished(&self) {
        self.shared
            .tasks
            .retain(|_, running| !running.handle.is_finished());
    }

    /// Aborts the task under `key`. Returns `false` if there is none.
    pub fn cancel(&self, key: &TaskKey) -> bool {
        match self.shared.tasks.get(key) {
            Some(running) => {
                running.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts every task.
    pub fn cancel_all(&self) {
        for running in self.shared.tasks.iter() {
            running.handle.abort();
        }
    }

    /// Waits until the task table is empty.
    pub async fn wait_all(&self) {
        loop {
            self.cleanup_finished();
            if self.shared.tasks.is_empty() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Like [`wait_all`](Self::wait_all), giving up after `limit`.
    ///
    /// Returns `false` if tasks were still running.
    pub async fn wait_all_timeout(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.wait_all()).await.is_ok()
    }

    fn launch<F>(&self, key: TaskKey, task: F) -> Running
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.shared.sequence.fetch_add(1, Ordering::Relaxed);
        let policy = self.shared.config.timeout_policy;
        let shared = Arc::clone(&self.shared);
        let span = info_span!("offload_task", kind = %key.kind(), key = %key);

        let handle = tokio::spawn(
            async move {
                let start = Instant::now();
                let finished = run(policy, &key, task).await;
                let elapsed = start.elapsed();
                shared.tasks.remove_if(&key, |_, running| running.id == id);
                match finished {
                    Finished::Completed => metrics::record_offload_completed(&key.kind(), elapsed),
                    Finished::TimedOut => metrics::record_offload_timeout(&key.kind(), elapsed),
                }
            }
            .instrument(span),
        );

        Running { id, handle }
    }
}

async fn run<F>(policy: TimeoutPolicy, key: &TaskKey, task: F) -> Finished
where
    F: Future<Output = ()>,
{
    match policy {
        TimeoutPolicy::None => {
            task.await;
            Finished::Completed
        }
        TimeoutPolicy::Cancel(limit) => match tokio::time::timeout(limit, task).await {
            Ok(()) => Finished::Completed,
            Err(_) => {
                warn!(%key, limit_ms = limit.as_millis() as u64, "background task cancelled");
                Finished::TimedOut
            }
        },
        TimeoutPolicy::Warn(limit) => {
            let start = Instant::now();
            task.await;
            let elapsed = start.elapsed();
            if elapsed > limit {
                warn!(
                    %key,
                    elapsed_ms = elapsed.as_millis() as u64,
                    limit_ms = limit.as_millis() as u64,
                    "background task exceeded its time limit"
                );
            }
            Finished::Completed
        }
    }
}

impl Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }

    fn spawn_for<F>(&self, identity: RequestIdentity, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.shared.config.deduplicate {
            self.spawn_keyed(identity, future)
        } else {
            OffloadManager::spawn(self, REFRESH, future);
            true
        }
    }
}

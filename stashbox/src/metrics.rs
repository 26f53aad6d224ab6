//! Metrics declaration and recording helpers.
//!
//! With the `metrics` feature disabled every helper is an empty inline
//! function.

use std::time::Duration;

use stashbox_core::{CacheStatus, FetchContext, Outcome, RequestClass};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    // Fetch metrics

    /// Track number of cache hit events.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_cache_hit_total",
            "Total number of requests that found a fresh cached copy."
        );
        "stashbox_cache_hit_total"
    };
    /// Track number of cache miss events.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_cache_miss_total",
            "Total number of requests without a cached copy."
        );
        "stashbox_cache_miss_total"
    };
    /// Track number of cache stale events.
    pub static ref CACHE_STALE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_cache_stale_total",
            "Total number of requests that found a stale cached copy."
        );
        "stashbox_cache_stale_total"
    };
    /// Track responses served by a fallback after a network failure.
    pub static ref FALLBACK_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_fallback_total",
            "Total number of responses served from a fallback after a network failure."
        );
        "stashbox_fallback_total"
    };
    /// Track network failures per request class.
    pub static ref NETWORK_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_network_errors_total",
            "Total number of failed network attempts."
        );
        "stashbox_network_errors_total"
    };
    /// Track storage failures absorbed by the strategies.
    pub static ref STORAGE_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_storage_errors_total",
            "Total number of storage failures degraded to network-only behaviour."
        );
        "stashbox_storage_errors_total"
    };

    // Lifecycle metrics

    /// Track number of generations deleted by activation or clearing.
    pub static ref GENERATIONS_DELETED: &'static str = {
        metrics::describe_counter!(
            "stashbox_generations_deleted_total",
            "Total number of cache generations deleted."
        );
        "stashbox_generations_deleted_total"
    };

    // Offload manager metrics

    /// Track number of offload tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "stashbox_offload_tasks_spawned_total",
            "Total number of offload tasks spawned."
        );
        "stashbox_offload_tasks_spawned_total"
    };
    /// Track number of offload tasks completed successfully.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "stashbox_offload_tasks_completed_total",
            "Total number of offload tasks completed."
        );
        "stashbox_offload_tasks_completed_total"
    };
    /// Track number of offload tasks that timed out.
    pub static ref OFFLOAD_TASKS_TIMEOUT: &'static str = {
        metrics::describe_counter!(
            "stashbox_offload_tasks_timeout_total",
            "Total number of offload tasks that timed out."
        );
        "stashbox_offload_tasks_timeout_total"
    };
    /// Track number of offload tasks deduplicated (skipped).
    pub static ref OFFLOAD_TASKS_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "stashbox_offload_tasks_deduplicated_total",
            "Total number of offload tasks skipped because one was already in flight."
        );
        "stashbox_offload_tasks_deduplicated_total"
    };
    /// Gauge of currently active offload tasks.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "stashbox_offload_tasks_active",
            "Number of currently active offload tasks."
        );
        "stashbox_offload_tasks_active"
    };
    /// Histogram of offload task duration.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stashbox_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of offload tasks in seconds."
        );
        "stashbox_offload_task_duration_seconds"
    };
}

/// Record metrics from a [`FetchContext`] after a request was served.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_fetch(ctx: &FetchContext) {
    let class = ctx.class.as_str();
    let counter = match ctx.status {
        CacheStatus::Hit => *CACHE_HIT_COUNTER,
        CacheStatus::Miss => *CACHE_MISS_COUNTER,
        CacheStatus::Stale => *CACHE_STALE_COUNTER,
    };
    metrics::counter!(counter, "class" => class).increment(1);

    if ctx.outcome == Outcome::ServedFromFallback {
        metrics::counter!(
            *FALLBACK_COUNTER,
            "class" => class,
            "source" => ctx.source.as_str().to_string()
        )
        .increment(1);
    }
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_fetch(_ctx: &FetchContext) {}

/// Record a failed network attempt.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_network_error(class: RequestClass) {
    metrics::counter!(*NETWORK_ERROR_COUNTER, "class" => class.as_str()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_network_error(_class: RequestClass) {}

/// Record a storage failure that was absorbed.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_storage_error(backend: &str, operation: &'static str) {
    metrics::counter!(
        *STORAGE_ERROR_COUNTER,
        "backend" => backend.to_string(),
        "operation" => operation
    )
    .increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_storage_error(_backend: &str, _operation: &'static str) {}

/// Record deleted generations.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_generations_deleted(reason: &'static str, count: usize) {
    metrics::counter!(*GENERATIONS_DELETED, "reason" => reason).increment(count as u64);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_generations_deleted(_reason: &'static str, _count: usize) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_offload_spawned(key_type: &str) {
    metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "key_type" => key_type.to_string()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "key_type" => key_type.to_string()).increment(1.0);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_offload_spawned(_key_type: &str) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_offload_deduplicated(key_type: &str) {
    metrics::counter!(*OFFLOAD_TASKS_DEDUPLICATED, "key_type" => key_type.to_string())
        .increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_offload_deduplicated(_key_type: &str) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_offload_completed(key_type: &str, elapsed: Duration) {
    metrics::counter!(*OFFLOAD_TASKS_COMPLETED, "key_type" => key_type.to_string()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "key_type" => key_type.to_string()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "key_type" => key_type.to_string())
        .record(elapsed.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_offload_completed(_key_type: &str, _elapsed: Duration) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_offload_timeout(key_type: &str, elapsed: Duration) {
    metrics::counter!(*OFFLOAD_TASKS_TIMEOUT, "key_type" => key_type.to_string()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "key_type" => key_type.to_string()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "key_type" => key_type.to_string())
        .record(elapsed.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_offload_timeout(_key_type: &str, _elapsed: Duration) {}

//! Moka storage capacity metrics.
//!
//! Enable the `metrics` feature to use these metrics.
//!
//! ## Metrics
//!
//! - `stashbox_moka_entries` - Entries in a generation (gauge)
//! - `stashbox_moka_size_bytes` - Weighted size of a generation (gauge)
//!
//! Both metrics carry `backend` and `generation` labels.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for generation entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "stashbox_moka_entries",
            "Current number of entries in a Moka-backed cache generation."
        );
        "stashbox_moka_entries"
    };

    /// Metric name for generation size gauge.
    pub static ref MOKA_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "stashbox_moka_size_bytes",
            "Current weighted size of a Moka-backed cache generation."
        );
        "stashbox_moka_size_bytes"
    };
}

/// Record current generation capacity metrics.
///
/// # Arguments
///
/// * `backend` - Storage label
/// * `generation` - Generation name
/// * `entries` - Current number of entries in the generation
/// * `size` - Current weighted size
#[cfg(feature = "metrics")]
#[inline]
pub fn record_capacity(backend: &str, generation: &str, entries: u64, size: u64) {
    metrics::gauge!(
        *MOKA_ENTRIES,
        "backend" => backend.to_string(),
        "generation" => generation.to_string()
    )
    .set(entries as f64);
    metrics::gauge!(
        *MOKA_SIZE_BYTES,
        "backend" => backend.to_string(),
        "generation" => generation.to_string()
    )
    .set(size as f64);
}

/// Record current generation capacity metrics (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_capacity(_backend: &str, _generation: &str, _entries: u64, _size: u64) {}

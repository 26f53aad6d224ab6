//! How long background refreshes may run and whether they are deduplicated.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens when a background refresh runs longer than expected.
///
/// In YAML: `none`, `{ cancel: 10s }` or `{ warn: 10s }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Let the refresh finish whenever the network answers.
    #[default]
    None,
    /// Abort the refresh; the cached copy stays as it is.
    Cancel(#[serde(with = "humantime_serde")] Duration),
    /// Log a warning and keep waiting.
    Warn(#[serde(with = "humantime_serde")] Duration),
}

impl TimeoutPolicy {
    /// The configured limit, if any.
    pub fn limit(&self) -> Option<Duration> {
        match self {
            TimeoutPolicy::None => None,
            TimeoutPolicy::Cancel(limit) | TimeoutPolicy::Warn(limit) => Some(*limit),
        }
    }
}

/// Settings of the [`OffloadManager`](super::OffloadManager).
///
/// ```
/// use std::time::Duration;
/// use stashbox::offload::{OffloadConfig, TimeoutPolicy};
///
/// let config = OffloadConfig::default().cancel_after(Duration::from_secs(10));
/// assert_eq!(config.timeout_policy, TimeoutPolicy::Cancel(Duration::from_secs(10)));
/// assert!(config.deduplicate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadConfig {
    /// Applied to every refresh task.
    pub timeout_policy: TimeoutPolicy,
    /// Skip a refresh when one for the same request is still in flight.
    pub deduplicate: bool,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            timeout_policy: TimeoutPolicy::None,
            deduplicate: true,
        }
    }
}

impl OffloadConfig {
    /// Replaces the timeout policy.
    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    /// Aborts refreshes that take longer than `limit`.
    pub fn cancel_after(self, limit: Duration) -> Self {
        self.with_timeout_policy(TimeoutPolicy::Cancel(limit))
    }

    /// Turns per-request deduplication on or off.
    pub fn with_deduplication(mut self, enabled: bool) -> Self {
        self.deduplicate = enabled;
        self
    }
}

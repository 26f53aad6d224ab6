//! Cached values with capture metadata.
//!
//! Every stored response is wrapped in a [`CacheEntry`] recording when it was
//! captured and whether it came from the network or was synthesized. Entries
//! are never expired proactively; freshness is computed at read time:
//!
//! ```text
//! age   = now - captured_at
//! fresh = age < max_age(class)
//! ```
//!
//! ```
//! use std::time::Duration;
//! use chrono::Utc;
//! use stashbox_core::{CacheEntry, EntryOrigin};
//!
//! let captured = Utc::now() - chrono::Duration::hours(2);
//! let entry = CacheEntry::new("logo", captured, EntryOrigin::Network);
//!
//! assert!(entry.is_fresh(Duration::from_secs(3 * 3600), Utc::now()));
//! assert!(!entry.is_fresh(Duration::from_secs(3600), Utc::now()));
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::response::{CacheState, FetchResponse};

/// Where a stored response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Received from the network.
    Network,
    /// Built locally as a fallback.
    Synthesized,
}

/// A cached value with its capture timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<T> {
    data: T,
    captured_at: DateTime<Utc>,
    origin: EntryOrigin,
}

/// The value type stored in cache generations.
pub type CachedResponse = CacheEntry<FetchResponse>;

impl<T> CacheEntry<T> {
    /// Creates an entry captured at `captured_at`.
    pub fn new(data: T, captured_at: DateTime<Utc>, origin: EntryOrigin) -> Self {
        CacheEntry {
            data,
            captured_at,
            origin,
        }
    }

    /// Returns a reference to the cached data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns when the data was captured.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Returns where the data came from.
    #[inline]
    pub fn origin(&self) -> EntryOrigin {
        self.origin
    }

    /// Consumes the entry and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Age of the entry at `now`.
    ///
    /// A capture timestamp in the future (clock skew, a server `Date` ahead
    /// of the local clock) yields an age of zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.captured_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Returns `true` when the entry is younger than `max_age`.
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < max_age
    }

    /// Checks the entry against `max_age`, preserving it inside the state.
    pub fn freshness(self, max_age: Duration, now: DateTime<Utc>) -> CacheState<Self> {
        if self.is_fresh(max_age, now) {
            CacheState::Fresh(self)
        } else {
            CacheState::Stale(self)
        }
    }
}

impl CacheEntry<FetchResponse> {
    /// Wraps a network response, using its `Date` header as the capture time
    /// and falling back to the current time.
    pub fn from_network(response: FetchResponse) -> Self {
        let captured_at = response.date().unwrap_or_else(Utc::now);
        Self::new(response, captured_at, EntryOrigin::Network)
    }

    /// Estimated memory footprint: struct overhead plus body bytes.
    pub fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.data.body().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http::header::DATE;

    #[test]
    fn test_age_never_negative() {
        let now = Utc::now();
        let entry = CacheEntry::new((), now + chrono::Duration::minutes(5), EntryOrigin::Network);
        assert_eq!(entry.age(now), Duration::ZERO);
        assert!(entry.is_fresh(Duration::from_secs(1), now));
    }

    #[test]
    fn test_fresh_boundary_is_exclusive() {
        let now = Utc::now();
        let entry = CacheEntry::new((), now - chrono::Duration::seconds(60), EntryOrigin::Network);
        assert!(!entry.is_fresh(Duration::from_secs(60), now));
        assert!(entry.is_fresh(Duration::from_secs(61), now));
    }

    #[test]
    fn test_zero_max_age_is_always_stale() {
        let now = Utc::now();
        let entry = CacheEntry::new((), now, EntryOrigin::Network);
        assert!(matches!(
            entry.freshness(Duration::ZERO, now),
            CacheState::Stale(_)
        ));
    }

    #[test]
    fn test_from_network_uses_date_header() {
        let response = FetchResponse::ok("body").with_header(
            DATE,
            HeaderValue::from_static("Tue, 01 Jan 2030 00:00:00 GMT"),
        );
        let entry = CacheEntry::from_network(response);
        assert_eq!(entry.captured_at().to_rfc3339(), "2030-01-01T00:00:00+00:00");
        assert_eq!(entry.origin(), EntryOrigin::Network);
    }

    #[test]
    fn test_from_network_without_date_uses_now() {
        let before = Utc::now();
        let entry = CacheEntry::from_network(FetchResponse::ok("body"));
        assert!(entry.captured_at() >= before);
    }
}

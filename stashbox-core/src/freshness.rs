//! Per-class maximum ages.
//!
//! A cached response is fresh while its age is below the maximum age of its
//! [`RequestClass`]. The defaults are policy constants and can be overridden
//! from configuration:
//!
//! | class              | default   |
//! |--------------------|-----------|
//! | `image-asset`      | 365 days  |
//! | `static-asset`     | 30 days   |
//! | `document-or-data` | 0 (never) |
//!
//! Only the image strategy consults freshness to skip the network. The
//! other classes use it to label a cache hit as stale in the fetch context.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::class::RequestClass;

const DAY: u64 = 24 * 60 * 60;

/// Mapping from request class to maximum age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessPolicy {
    /// Maximum age of image assets.
    #[serde(with = "humantime_serde")]
    pub image_asset: Duration,
    /// Maximum age of static assets.
    #[serde(with = "humantime_serde")]
    pub static_asset: Duration,
    /// Maximum age of documents and data.
    #[serde(with = "humantime_serde")]
    pub document_or_data: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            image_asset: Duration::from_secs(365 * DAY),
            static_asset: Duration::from_secs(30 * DAY),
            document_or_data: Duration::ZERO,
        }
    }
}

impl FreshnessPolicy {
    /// Returns the maximum age for `class`.
    pub fn max_age(&self, class: RequestClass) -> Duration {
        match class {
            RequestClass::ImageAsset => self.image_asset,
            RequestClass::StaticAsset => self.static_asset,
            RequestClass::DocumentOrData => self.document_or_data,
        }
    }

    /// Returns a copy with the maximum age of `class` replaced.
    pub fn with_max_age(mut self, class: RequestClass, max_age: Duration) -> Self {
        match class {
            RequestClass::ImageAsset => self.image_asset = max_age,
            RequestClass::StaticAsset => self.static_asset = max_age,
            RequestClass::DocumentOrData => self.document_or_data = max_age,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let policy = FreshnessPolicy::default();
        assert_eq!(
            policy.max_age(RequestClass::ImageAsset),
            Duration::from_secs(31_536_000)
        );
        assert_eq!(policy.max_age(RequestClass::DocumentOrData), Duration::ZERO);
    }

    #[test]
    fn test_override() {
        let policy = FreshnessPolicy::default()
            .with_max_age(RequestClass::ImageAsset, Duration::from_secs(10));
        assert_eq!(
            policy.max_age(RequestClass::ImageAsset),
            Duration::from_secs(10)
        );
        assert_eq!(
            policy.max_age(RequestClass::StaticAsset),
            FreshnessPolicy::default().static_asset
        );
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let policy: FreshnessPolicy =
            serde_json::from_str(r#"{"image_asset": "1h"}"#).unwrap();
        assert_eq!(policy.image_asset, Duration::from_secs(3600));
        assert_eq!(policy.static_asset, FreshnessPolicy::default().static_asset);
    }
}

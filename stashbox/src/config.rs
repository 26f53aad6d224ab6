//! Controller configuration.
//!
//! A [`ControllerConfig`] is either assembled in code with
//! [`ControllerConfig::builder`] or loaded from YAML:
//!
//! ```
//! use std::time::Duration;
//! use stashbox::ControllerConfig;
//! use stashbox_core::RequestClass;
//!
//! let config = ControllerConfig::from_yaml(r#"
//! origin: "https://benefits.example"
//! generations:
//!   version: v4
//! freshness:
//!   image_asset: 7d
//! "#).unwrap();
//!
//! assert_eq!(config.generation_set().images().as_str(), "student-benefits-images-v4");
//! assert_eq!(
//!     config.freshness.max_age(RequestClass::ImageAsset),
//!     Duration::from_secs(7 * 24 * 60 * 60),
//! );
//! ```

use std::time::Duration;

use http::Uri;
use serde::{Deserialize, Serialize};
use stashbox_core::{FreshnessPolicy, GenerationSet, Origin, RequestClass};

use crate::classify::Classifier;
use crate::error::ConfigError;
use crate::offload::OffloadConfig;

/// Paths precached when no manifest is configured.
pub const DEFAULT_MANIFEST: [&str; 6] = [
    "/",
    "/index.html",
    "/styles.css",
    "/script.js",
    "/benefits.json",
    "/assets/favicon.ico",
];

fn default_manifest() -> Vec<String> {
    DEFAULT_MANIFEST.iter().map(|path| path.to_string()).collect()
}

/// How generation names are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Common prefix of every generation name.
    pub prefix: String,
    /// Deployment version tag. Bumping it retires the previous generations
    /// on the next activation.
    pub version: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            prefix: "student-benefits".to_owned(),
            version: "v3".to_owned(),
        }
    }
}

/// Path segments used to classify requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Segment marking image assets. Checked first.
    pub image_segment: String,
    /// Segment marking other static assets.
    pub asset_segment: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            image_segment: "/assets/benefits/".to_owned(),
            asset_segment: "/assets/".to_owned(),
        }
    }
}

/// Lifecycle behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Activate right after a successful install instead of waiting.
    pub skip_waiting: bool,
    /// Take control of already open pages on activation.
    pub claim_clients: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            skip_waiting: true,
            claim_clients: true,
        }
    }
}

/// Full configuration of a [`CacheController`](crate::CacheController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Origin of the pages the controller serves.
    pub origin: Origin,
    /// Generation naming.
    #[serde(default)]
    pub generations: GenerationConfig,
    /// Root-relative paths precached at install time, in order.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,
    /// Classification segments.
    #[serde(default)]
    pub routes: RouteConfig,
    /// Maximum age per request class.
    #[serde(default)]
    pub freshness: FreshnessPolicy,
    /// Lifecycle behaviour.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Background refresh settings.
    #[serde(default)]
    pub offload: OffloadConfig,
}

impl ControllerConfig {
    /// Starts a builder with every setting at its default.
    pub fn builder(origin: Origin) -> ControllerConfigBuilder {
        ControllerConfigBuilder::new(origin)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ControllerConfig = serde_saphyr::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the controller cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generations.prefix.trim().is_empty() {
            return Err(ConfigError::invalid("generations.prefix", "must not be empty"));
        }
        if self.generations.version.trim().is_empty() {
            return Err(ConfigError::invalid("generations.version", "must not be empty"));
        }
        if self.routes.image_segment.is_empty() {
            return Err(ConfigError::invalid("routes.image_segment", "must not be empty"));
        }
        if self.routes.asset_segment.is_empty() {
            return Err(ConfigError::invalid("routes.asset_segment", "must not be empty"));
        }
        self.manifest_urls()?;
        Ok(())
    }

    /// Generation names for the configured version.
    pub fn generation_set(&self) -> GenerationSet {
        GenerationSet::new(&self.generations.prefix, &self.generations.version)
    }

    /// Resolves the manifest against the origin.
    pub fn manifest_urls(&self) -> Result<Vec<Uri>, ConfigError> {
        self.manifest
            .iter()
            .map(|path| self.origin.resolve(path).map_err(ConfigError::from))
            .collect()
    }

    /// Classifier for the configured origin and routes.
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.origin.clone(), self.routes.clone())
    }
}

/// Builder for [`ControllerConfig`].
#[derive(Debug, Clone)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    /// Creates a builder with default settings for `origin`.
    pub fn new(origin: Origin) -> Self {
        Self {
            config: ControllerConfig {
                origin,
                generations: GenerationConfig::default(),
                manifest: default_manifest(),
                routes: RouteConfig::default(),
                freshness: FreshnessPolicy::default(),
                lifecycle: LifecycleConfig::default(),
                offload: OffloadConfig::default(),
            },
        }
    }

    /// Sets the generation name prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.generations.prefix = prefix.into();
        self
    }

    /// Sets the deployment version tag.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.generations.version = version.into();
        self
    }

    /// Replaces the precache manifest.
    pub fn manifest<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.config.manifest = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the classification segments.
    pub fn routes(mut self, routes: RouteConfig) -> Self {
        self.config.routes = routes;
        self
    }

    /// Replaces the freshness policy.
    pub fn freshness(mut self, freshness: FreshnessPolicy) -> Self {
        self.config.freshness = freshness;
        self
    }

    /// Overrides the maximum age of one class.
    pub fn max_age(mut self, class: RequestClass, max_age: Duration) -> Self {
        self.config.freshness = self.config.freshness.with_max_age(class, max_age);
        self
    }

    /// Enables or disables activation right after install.
    pub fn skip_waiting(mut self, enabled: bool) -> Self {
        self.config.lifecycle.skip_waiting = enabled;
        self
    }

    /// Enables or disables claiming open pages on activation.
    pub fn claim_clients(mut self, enabled: bool) -> Self {
        self.config.lifecycle.claim_clients = enabled;
        self
    }

    /// Sets the background refresh settings.
    pub fn offload(mut self, offload: OffloadConfig) -> Self {
        self.config.offload = offload;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<ControllerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

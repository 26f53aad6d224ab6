//! Cache generation names.
//!
//! A deployment version owns a [`GenerationSet`] of three named
//! generations:
//!
//! - `{prefix}-{version}` - the precache seeded at install time
//! - `{prefix}-runtime-{version}` - documents, data and static assets stored while serving
//! - `{prefix}-images-{version}` - images stored while serving
//!
//! The set as a whole is the *current* generation. Activation deletes every
//! generation whose name is not part of it.
//!
//! ```
//! use stashbox_core::GenerationSet;
//!
//! let set = GenerationSet::new("student-benefits", "v3");
//! assert_eq!(set.precache().as_str(), "student-benefits-v3");
//! assert_eq!(set.runtime().as_str(), "student-benefits-runtime-v3");
//! assert_eq!(set.images().as_str(), "student-benefits-images-v3");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::class::RequestClass;

/// Name of a cache generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationName(SmolStr);

impl GenerationName {
    /// Creates a generation name.
    #[inline]
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenerationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for GenerationName {
    #[inline]
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<String> for GenerationName {
    #[inline]
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}

impl AsRef<str> for GenerationName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The generations owned by one deployment version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSet {
    version: SmolStr,
    precache: GenerationName,
    runtime: GenerationName,
    images: GenerationName,
}

impl GenerationSet {
    /// Derives the generation names for `prefix` and `version`.
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            version: SmolStr::new(version),
            precache: GenerationName::from(format!("{prefix}-{version}")),
            runtime: GenerationName::from(format!("{prefix}-runtime-{version}")),
            images: GenerationName::from(format!("{prefix}-images-{version}")),
        }
    }

    /// The version tag the names were derived from.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Generation seeded with the manifest at install time.
    pub fn precache(&self) -> &GenerationName {
        &self.precache
    }

    /// Generation for documents, data and static assets.
    pub fn runtime(&self) -> &GenerationName {
        &self.runtime
    }

    /// Generation for images.
    pub fn images(&self) -> &GenerationName {
        &self.images
    }

    /// Generation that responses of `class` are written to.
    pub fn for_class(&self, class: RequestClass) -> &GenerationName {
        match class {
            RequestClass::ImageAsset => &self.images,
            RequestClass::StaticAsset | RequestClass::DocumentOrData => &self.runtime,
        }
    }

    /// Returns `true` if `name` belongs to this set.
    pub fn contains(&self, name: &GenerationName) -> bool {
        self.iter().any(|own| own == name)
    }

    /// Iterates over the names in the set.
    pub fn iter(&self) -> impl Iterator<Item = &GenerationName> {
        [&self.precache, &self.runtime, &self.images].into_iter()
    }
}

//! Benefit catalog schema.
//!
//! The catalog is a JSON array of benefit records served as
//! `/benefits.json`. The cache controller treats it as an opaque
//! `document-or-data` resource; these types exist for hosts that render it
//! and for warming the image generation from the catalog's image paths.
//!
//! ```
//! use stashbox_core::Catalog;
//!
//! let catalog = Catalog::from_json(br#"[
//!   {"title": "Editor", "description": "Free licence", "url": "https://e.example",
//!    "imageSrc": "/assets/benefits/editor.webp", "tags": ["dev", "tools"]},
//!   {"title": "Old", "description": "Retired", "url": "https://o.example",
//!    "imageSrc": "/assets/benefits/old.webp", "tags": ["misc"], "hide": true}
//! ]"#).unwrap();
//!
//! assert_eq!(catalog.visible().count(), 1);
//! assert_eq!(catalog.tag_index(), vec!["dev", "tools"]);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when the catalog document cannot be decoded.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not a valid benefit array.
    #[error("malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One benefit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Benefit {
    /// Card title.
    pub title: String,
    /// HTML-safe description fragment.
    pub description: String,
    /// Link to the offer.
    pub url: String,
    /// Root-relative path of the card image.
    pub image_src: String,
    /// Filter tags.
    pub tags: Vec<String>,
    /// Offer needs an on-campus account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_campus: Option<bool>,
    /// Record is kept in the file but not shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
}

impl Benefit {
    /// Returns `true` unless the record is explicitly hidden.
    pub fn is_visible(&self) -> bool {
        !self.hide.unwrap_or(false)
    }
}

/// The whole catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    benefits: Vec<Benefit>,
}

impl Catalog {
    /// Creates a catalog from records.
    pub fn new(benefits: Vec<Benefit>) -> Self {
        Self { benefits }
    }

    /// Decodes the JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// All records, hidden ones included.
    pub fn benefits(&self) -> &[Benefit] {
        &self.benefits
    }

    /// Records that should be rendered.
    pub fn visible(&self) -> impl Iterator<Item = &Benefit> {
        self.benefits.iter().filter(|benefit| benefit.is_visible())
    }

    /// Sorted, de-duplicated tags of the visible records.
    pub fn tag_index(&self) -> Vec<&str> {
        self.visible()
            .flat_map(|benefit| benefit.tags.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct image paths of the visible records, in catalog order.
    pub fn image_paths(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.visible()
            .map(|benefit| benefit.image_src.as_str())
            .filter(|path| seen.insert(*path))
            .collect()
    }
}

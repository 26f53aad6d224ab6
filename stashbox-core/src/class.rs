//! Request classes.
//!
//! The class of a request is derived from the shape of its URL alone and
//! decides which fetch strategy the controller applies. The classifying
//! rules themselves live in the controller, which owns the route
//! configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification label for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    /// Benefit images and other picture assets.
    ImageAsset,
    /// Scripts, icons and other static files under the assets directory.
    StaticAsset,
    /// HTML documents and the JSON catalog.
    DocumentOrData,
}

impl RequestClass {
    /// All classes, in rule order.
    pub const ALL: [RequestClass; 3] = [
        RequestClass::ImageAsset,
        RequestClass::StaticAsset,
        RequestClass::DocumentOrData,
    ];

    /// Returns the class as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RequestClass::ImageAsset => "image-asset",
            RequestClass::StaticAsset => "static-asset",
            RequestClass::DocumentOrData => "document-or-data",
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

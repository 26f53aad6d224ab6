//! Names for storage engines in logs and metrics.

use std::fmt;

use smol_str::SmolStr;

/// Short name of a cache storage implementation, such as `"moka"`.
///
/// Appears as the `backend` field of storage warnings and as the `backend`
/// label of storage metrics, so it should stay low-cardinality.
///
/// ```
/// use stashbox_core::StorageLabel;
///
/// const MOKA: StorageLabel = StorageLabel::new_static("moka");
/// assert_eq!(MOKA.to_string(), "moka");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorageLabel(SmolStr);

impl StorageLabel {
    /// Label from any string.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Label from a static string, usable in `const` context.
    pub const fn new_static(name: &'static str) -> Self {
        Self(SmolStr::new_static(name))
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorageLabel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StorageLabel {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for StorageLabel {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

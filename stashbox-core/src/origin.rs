//! Page origin and same-origin checks.
//!
//! An [`Origin`] is the `scheme://host[:port]` triple a page was loaded from.
//! Only requests to the page's own origin are intercepted by the cache
//! controller; everything else goes straight to the network.
//!
//! ```
//! use stashbox_core::Origin;
//!
//! let origin = Origin::parse("https://benefits.example").unwrap();
//! let uri = "https://benefits.example:443/index.html".parse().unwrap();
//! assert!(origin.is_same_origin(&uri));
//!
//! let cdn = "https://cdn.example/lib.js".parse().unwrap();
//! assert!(!origin.is_same_origin(&cdn));
//! ```

use std::fmt;

use http::Uri;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Errors produced while parsing an origin or resolving a path against it.
#[derive(Debug, Error)]
pub enum OriginError {
    /// The string is not a valid URI.
    #[error("invalid uri `{input}`: {source}")]
    InvalidUri {
        /// The rejected input.
        input: String,
        /// Parser error.
        #[source]
        source: http::uri::InvalidUri,
    },
    /// The URI has no scheme or no host.
    #[error("`{0}` must have a scheme and a host")]
    Incomplete(String),
    /// A manifest path that does not start with `/`.
    #[error("`{0}` is not a root-relative path")]
    NotRootRelative(String),
}

/// The scheme, host and port a page was served from.
///
/// Scheme and host are stored lower-cased. Two origins are equal when their
/// schemes, hosts and *effective* ports match, so `https://a.example` and
/// `https://a.example:443` are the same origin.
///
/// Serializes as its string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin {
    scheme: SmolStr,
    host: SmolStr,
    port: Option<u16>,
}

impl Origin {
    /// Parses an origin from a string such as `https://benefits.example`.
    ///
    /// Any path or query in the input is ignored.
    pub fn parse(input: &str) -> Result<Self, OriginError> {
        let uri: Uri = input.parse().map_err(|source| OriginError::InvalidUri {
            input: input.to_owned(),
            source,
        })?;
        Self::of(&uri).ok_or_else(|| OriginError::Incomplete(input.to_owned()))
    }

    /// Extracts the origin of an absolute URI.
    ///
    /// Returns `None` for relative URIs.
    pub fn of(uri: &Uri) -> Option<Self> {
        let scheme = uri.scheme_str()?;
        let host = uri.host()?;
        Some(Self {
            scheme: SmolStr::new(scheme.to_ascii_lowercase()),
            host: SmolStr::new(host.to_ascii_lowercase()),
            port: uri.port_u16(),
        })
    }

    /// Returns the scheme (`http`, `https`, ...).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the lower-cased host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the explicit port, or the scheme default for `http`/`https`.
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or(match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        })
    }

    /// Returns `true` if `uri` belongs to this origin.
    pub fn is_same_origin(&self, uri: &Uri) -> bool {
        Self::of(uri).is_some_and(|other| other == *self)
    }

    /// Resolves a root-relative path (`/index.html`) into an absolute URI on
    /// this origin.
    pub fn resolve(&self, path: &str) -> Result<Uri, OriginError> {
        if !path.starts_with('/') {
            return Err(OriginError::NotRootRelative(path.to_owned()));
        }
        let absolute = format!("{self}{path}");
        absolute.parse().map_err(|source| OriginError::InvalidUri {
            input: absolute,
            source,
        })
    }
}

impl PartialEq for Origin {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.host == other.host
            && self.effective_port() == other.effective_port()
    }
}

impl Eq for Origin {}

impl TryFrom<String> for Origin {
    type Error = OriginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.to_string()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

//! Intercepted requests and their cache identity.
//!
//! - [`FetchRequest`] - A request issued by the page
//! - [`RequestIdentity`] - The `(method, url)` pair used as the cache key
//!
//! ## Identity
//!
//! Two requests share an identity when their methods are equal and their
//! absolute URLs are byte-for-byte equal. Headers never take part in the
//! identity. Because URLs are absolute, identities are scoped by origin.
//!
//! ```
//! use stashbox_core::FetchRequest;
//!
//! let a = FetchRequest::get("https://benefits.example/benefits.json".parse().unwrap());
//! let b = FetchRequest::get("https://benefits.example/benefits.json".parse().unwrap());
//! assert_eq!(a.identity(), b.identity());
//! assert_eq!(a.identity().to_string(), "GET https://benefits.example/benefits.json");
//! ```

use std::fmt;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use smol_str::SmolStr;

/// A request issued by the page and seen by the cache controller.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl FetchRequest {
    /// Creates a request with the given method and URI and no headers.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
        }
    }

    /// Creates a `GET` request.
    pub fn get(uri: Uri) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Adds a header, replacing any previous value for the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the request method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the cache identity of this request.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity::new(self.method.clone(), &self.uri)
    }

    /// Consumes the request and returns its parts.
    pub fn into_parts(self) -> (Method, Uri, HeaderMap) {
        (self.method, self.uri, self.headers)
    }
}

impl<B> From<http::Request<B>> for FetchRequest {
    fn from(request: http::Request<B>) -> Self {
        let (parts, _) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
        }
    }
}

/// Cache key of a request: its method and absolute URL.
///
/// Cloning is cheap, the URL is held in a [`SmolStr`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity {
    method: Method,
    url: SmolStr,
}

impl RequestIdentity {
    /// Creates an identity from a method and a URI.
    ///
    /// Scheme and host are lowercased and a default port is dropped, so
    /// `https://Benefits.example:443/x` and `https://benefits.example/x`
    /// share one identity.
    pub fn new(method: Method, uri: &Uri) -> Self {
        Self {
            method,
            url: canonical_url(uri),
        }
    }

    /// Returns the method part of the identity.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the URL part of the identity.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn canonical_url(uri: &Uri) -> SmolStr {
    let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) else {
        return SmolStr::new(uri.to_string());
    };
    let scheme = scheme.to_ascii_lowercase();
    let default_port = match scheme.as_str() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    };
    let host = authority.host().to_ascii_lowercase();
    let mut url = match authority.port_u16() {
        Some(port) if Some(port) != default_port => format!("{scheme}://{host}:{port}"),
        _ => format!("{scheme}://{host}"),
    };
    url.push_str(uri.path());
    if let Some(query) = uri.query() {
        url.push('?');
        url.push_str(query);
    }
    SmolStr::new(url)
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

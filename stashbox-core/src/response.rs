//! Responses handed back to the page and freshness states of cached data.
//!
//! - [`FetchResponse`] - Status, headers and fully-buffered body
//! - [`CacheState`] - Freshness state of a cached value
//!
//! A [`FetchResponse`] is cheap to clone: the body is a reference-counted
//! [`Bytes`] buffer. Strategies that store a response and return it to the
//! caller clone it once and hand the original back.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

/// Body of the response synthesized when an image cannot be fetched.
pub const NETWORK_ERROR_BODY: &str = "Network error";

/// Freshness state of cached data.
#[derive(Debug, PartialEq, Eq)]
pub enum CacheState<Cached> {
    /// Data is younger than the maximum age for its class.
    Fresh(Cached),
    /// Data reached or exceeded the maximum age for its class.
    Stale(Cached),
}

impl<Cached> CacheState<Cached> {
    /// Returns `true` for [`CacheState::Fresh`].
    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheState::Fresh(_))
    }

    /// Discards the state and returns the cached value.
    pub fn into_inner(self) -> Cached {
        match self {
            CacheState::Fresh(cached) | CacheState::Stale(cached) => cached,
        }
    }
}

/// A response with a fully-buffered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl FetchResponse {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Creates a response from all of its parts.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Creates a `200 OK` response.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// The placeholder returned for images that are neither reachable nor
    /// cached: `408 Request Timeout` with a `Network error` body.
    pub fn network_error() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, NETWORK_ERROR_BODY).with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        )
    }

    /// Adds a header, replacing any previous value for the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the status code.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` for `2xx` statuses.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Parses the `Date` header, if present and well-formed.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        let value = self.headers.get(header::DATE)?.to_str().ok()?;
        DateTime::parse_from_rfc2822(value)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }

    /// Consumes the response and returns its parts.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

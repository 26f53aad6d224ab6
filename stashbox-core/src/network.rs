use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::request::FetchRequest;
use crate::response::FetchResponse;

/// Outcome of a single network attempt.
pub type NetworkResult = Result<FetchResponse, NetworkError>;

/// Transport-level failure of a network attempt.
///
/// An HTTP error status is *not* a network error: a `404` is a response that
/// was received. Only failures to obtain any response land here.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The host has no connectivity.
    #[error("network is offline")]
    Offline,
    /// The underlying stack gave up waiting.
    #[error("network request timed out")]
    Timeout,
    /// Any other transport failure (DNS, TLS, connection reset, ...).
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync>),
}

impl NetworkError {
    /// Wraps an arbitrary transport error.
    pub fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        NetworkError::Transport(Box::new(error))
    }
}

/// Trait for issuing requests to the network.
///
/// The returned future must be `'static` so the controller can move it into
/// a detached background task for revalidation.
///
/// # Examples
///
/// ```rust,ignore
/// use stashbox_core::{FetchRequest, FetchResponse, Network, NetworkResult};
/// use std::future::Ready;
///
/// struct AlwaysOk;
///
/// impl Network for AlwaysOk {
///     type Future = Ready<NetworkResult>;
///
///     fn fetch(&self, _request: FetchRequest) -> Self::Future {
///         std::future::ready(Ok(FetchResponse::ok("hello")))
///     }
/// }
/// ```
pub trait Network: Send + Sync {
    /// The future that resolves to the network outcome
    type Future: Future<Output = NetworkResult> + Send + 'static;

    /// Issue one network attempt for `request`
    fn fetch(&self, request: FetchRequest) -> Self::Future;
}

impl<N> Network for Arc<N>
where
    N: Network + ?Sized,
{
    type Future = N::Future;

    fn fetch(&self, request: FetchRequest) -> Self::Future {
        (**self).fetch(request)
    }
}

impl<N> Network for &N
where
    N: Network + ?Sized,
{
    type Future = N::Future;

    fn fetch(&self, request: FetchRequest) -> Self::Future {
        (**self).fetch(request)
    }
}

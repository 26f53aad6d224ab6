//! Network adapter over a reqwest client.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use stashbox_core::{FetchRequest, FetchResponse, Network, NetworkError, NetworkResult};
use tracing::debug;

/// [`Network`] backed by a [`reqwest::Client`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestNetwork {
    client: reqwest::Client,
}

impl ReqwestNetwork {
    /// Creates a network with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Starts a builder for a dedicated client.
    pub fn builder() -> ReqwestNetworkBuilder {
        ReqwestNetworkBuilder::default()
    }

    /// The underlying client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Network for ReqwestNetwork {
    type Future = Pin<Box<dyn Future<Output = NetworkResult> + Send>>;

    fn fetch(&self, request: FetchRequest) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let (method, uri, headers) = request.into_parts();
            let url = uri.to_string();
            debug!(%method, %url, "network fetch");

            let response = client
                .request(method, url.as_str())
                .headers(headers)
                .send()
                .await
                .map_err(into_network_error)?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(into_network_error)?;
            debug!(%url, status = status.as_u16(), bytes = body.len(), "network response");

            Ok(FetchResponse::from_parts(status, headers, body))
        })
    }
}

fn into_network_error(error: reqwest::Error) -> NetworkError {
    if error.is_timeout() {
        NetworkError::Timeout
    } else if error.is_connect() {
        NetworkError::Offline
    } else {
        NetworkError::transport(error)
    }
}

/// Builder for [`ReqwestNetwork`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestNetworkBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ReqwestNetworkBuilder {
    /// Total time allowed for one fetch, body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Time allowed to establish a connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// `User-Agent` sent with every request.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<ReqwestNetwork, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        Ok(ReqwestNetwork::with_client(builder.build()?))
    }
}

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use http::StatusCode;
use stashbox_core::{FetchRequest, FetchResponse, Network, NetworkError, NetworkResult};

/// What the network answers for a URL.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(FetchResponse),
    Offline,
    Timeout,
}

#[derive(Debug, Clone)]
struct Script {
    reply: Reply,
    latency: Duration,
}

/// Scripted [`Network`].
///
/// URLs without a script answer `404`. A call is counted when its future
/// is first polled, so a future that is created and dropped unpolled does
/// not count as a network call.
#[derive(Clone, Debug, Default)]
pub struct MockNetwork {
    scripts: Arc<DashMap<String, Script>>,
    calls: Arc<DashMap<String, usize>>,
    total: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `url` with `response`, replacing any earlier script.
    pub fn respond(&self, url: &str, response: FetchResponse) -> &Self {
        self.script(url, Reply::Respond(response), Duration::ZERO)
    }

    /// Answers `url` with `response` after `latency`.
    pub fn respond_after(&self, url: &str, response: FetchResponse, latency: Duration) -> &Self {
        self.script(url, Reply::Respond(response), latency)
    }

    /// Fails `url` with a transport error.
    pub fn fail(&self, url: &str, reply: Reply) -> &Self {
        self.script(url, reply, Duration::ZERO)
    }

    pub fn script(&self, url: &str, reply: Reply, latency: Duration) -> &Self {
        self.scripts
            .insert(url.to_string(), Script { reply, latency });
        self
    }

    /// Fails every request with [`NetworkError::Offline`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Calls made for `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.calls.get(url).map(|count| *count).unwrap_or(0)
    }

    /// Calls made for any URL.
    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.calls.clear();
        self.total.store(0, Ordering::SeqCst);
    }
}

impl Network for MockNetwork {
    type Future = Pin<Box<dyn Future<Output = NetworkResult> + Send>>;

    fn fetch(&self, request: FetchRequest) -> Self::Future {
        let url = request.uri().to_string();
        let scripts = Arc::clone(&self.scripts);
        let calls = Arc::clone(&self.calls);
        let total = Arc::clone(&self.total);
        let offline = Arc::clone(&self.offline);

        Box::pin(async move {
            *calls.entry(url.clone()).or_insert(0) += 1;
            total.fetch_add(1, Ordering::SeqCst);

            let script = scripts.get(&url).map(|script| script.value().clone());
            let Some(script) = script else {
                return Ok(FetchResponse::new(StatusCode::NOT_FOUND, "not found"));
            };
            if !script.latency.is_zero() {
                tokio::time::sleep(script.latency).await;
            }
            if offline.load(Ordering::SeqCst) {
                return Err(NetworkError::Offline);
            }
            match script.reply {
                Reply::Respond(response) => Ok(response),
                Reply::Offline => Err(NetworkError::Offline),
                Reply::Timeout => Err(NetworkError::Timeout),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://benefits.example/index.html";

    #[tokio::test]
    async fn test_unscripted_url_is_not_found() {
        let network = MockNetwork::new();
        let response = network
            .fetch(FetchRequest::get(URL.parse().unwrap()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(network.calls(URL), 1);
    }

    #[tokio::test]
    async fn test_unpolled_future_is_not_counted() {
        let network = MockNetwork::new();
        network.respond(URL, FetchResponse::ok("home"));

        drop(network.fetch(FetchRequest::get(URL.parse().unwrap())));
        assert_eq!(network.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_offline_switch() {
        let network = MockNetwork::new();
        network.respond(URL, FetchResponse::ok("home"));
        network.set_offline(true);

        let result = network.fetch(FetchRequest::get(URL.parse().unwrap())).await;
        assert!(matches!(result, Err(NetworkError::Offline)));
    }
}

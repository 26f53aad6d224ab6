//! Shared setup for the integration tests.

use std::sync::Arc;

use http::{Method, Uri};
use stashbox::config::DEFAULT_MANIFEST;
use stashbox::{
    CacheController, ClientRegistry, ControllerConfig, ControllerConfigBuilder, Dispatcher,
    FetchRequest, FetchResponse, RequestIdentity,
};
use stashbox_core::Origin;

use crate::mock_network::MockNetwork;
use crate::mock_storage::MockStorage;

pub const ORIGIN: &str = "https://benefits.example";

pub type TestController = CacheController<MockStorage, MockNetwork>;
pub type TestDispatcher = Dispatcher<Arc<TestController>, MockNetwork>;

pub fn origin() -> Origin {
    Origin::parse(ORIGIN).unwrap()
}

/// Absolute URL of `path` on the test origin.
pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

pub fn uri(path: &str) -> Uri {
    url(path).parse().unwrap()
}

pub fn get(path: &str) -> FetchRequest {
    FetchRequest::get(uri(path))
}

pub fn identity(path: &str) -> RequestIdentity {
    RequestIdentity::new(Method::GET, &uri(path))
}

/// Scripts a `200` for every default manifest path.
pub fn script_manifest(network: &MockNetwork) {
    for path in DEFAULT_MANIFEST {
        network.respond(&url(path), FetchResponse::ok(format!("precached {path}")));
    }
}

/// A controller wired to fakes, behind a dispatcher.
pub struct Harness {
    pub storage: MockStorage,
    pub network: MockNetwork,
    pub controller: Arc<TestController>,
    pub dispatcher: TestDispatcher,
}

impl Harness {
    /// Default configuration with a fully scripted manifest.
    pub fn new() -> Self {
        Self::with_config(|builder| builder)
    }

    pub fn with_config<F>(configure: F) -> Self
    where
        F: FnOnce(ControllerConfigBuilder) -> ControllerConfigBuilder,
    {
        let config = configure(ControllerConfig::builder(origin()))
            .build()
            .unwrap();
        Self::from_config(config, MockStorage::new(), MockNetwork::new())
    }

    /// Builds a harness over existing fakes, e.g. to simulate the next
    /// deployment against the same storage.
    pub fn from_config(config: ControllerConfig, storage: MockStorage, network: MockNetwork) -> Self {
        Self::from_parts(config, storage, network, ClientRegistry::new())
    }

    pub fn from_parts(
        config: ControllerConfig,
        storage: MockStorage,
        network: MockNetwork,
        clients: ClientRegistry,
    ) -> Self {
        script_manifest(&network);
        let controller = CacheController::new(config, Arc::new(storage.clone()), network.clone())
            .unwrap()
            .with_clients(clients);
        let controller = Arc::new(controller);
        let dispatcher = Dispatcher::new(Arc::clone(&controller), network.clone());
        Self {
            storage,
            network,
            controller,
            dispatcher,
        }
    }

    /// Installs and activates; resets the fake counters afterwards.
    pub async fn activated(self) -> Self {
        self.controller.install().await.unwrap();
        self.controller.activate().await.unwrap();
        self.storage.reset_counters();
        self.network.reset_counters();
        self
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

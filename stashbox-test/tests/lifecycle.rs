use chrono::Utc;
use http::StatusCode;
use pretty_assertions::assert_eq;
use stashbox::config::DEFAULT_MANIFEST;
use stashbox::{
    CacheError, ClientRegistry, ControllerConfig, Dispatched, Event, FetchDisposition,
    FetchResponse, GenerationName, LifecycleState,
};
use stashbox_test::fixtures::{Harness, get, identity, origin, url};
use stashbox_test::{MockStorage, Reply};

fn names(names: &[&str]) -> Vec<GenerationName> {
    names.iter().map(|name| GenerationName::new(*name)).collect()
}

#[tokio::test]
async fn test_install_precaches_manifest() {
    let harness = Harness::new();

    let report = harness.controller.install().await.unwrap();

    let precache = GenerationName::new("student-benefits-v3");
    assert_eq!(report.generation, precache);
    assert_eq!(report.precached, DEFAULT_MANIFEST.len());
    assert_eq!(harness.storage.entry_count(&precache), DEFAULT_MANIFEST.len());
    assert_eq!(harness.controller.state(), LifecycleState::Installed);

    let home = harness.storage.peek(&precache, &identity("/")).unwrap();
    assert_eq!(home.data().body().as_ref(), b"precached /");
    for path in DEFAULT_MANIFEST {
        assert_eq!(harness.network.calls(&url(path)), 1, "{path}");
    }
}

#[tokio::test]
async fn test_install_fails_as_a_whole_on_missing_manifest_entry() {
    let harness = Harness::new();
    harness.network.respond(
        &url("/script.js"),
        FetchResponse::new(StatusCode::NOT_FOUND, "missing"),
    );

    let error = harness.controller.install().await.unwrap_err();

    match error {
        CacheError::Precache { url: failed, .. } => assert_eq!(failed, url("/script.js")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(harness.controller.state(), LifecycleState::Redundant);
    assert_eq!(harness.storage.put_count(), 0);
    assert_eq!(
        harness
            .storage
            .entry_count(&GenerationName::new("student-benefits-v3")),
        0
    );
}

#[tokio::test]
async fn test_short_manifest_with_missing_stylesheet_writes_nothing() {
    let harness = Harness::with_config(|builder| builder.manifest(["/", "/index.html", "/styles.css"]));
    harness.network.respond(
        &url("/styles.css"),
        FetchResponse::new(StatusCode::NOT_FOUND, "missing"),
    );

    let error = harness.controller.install().await.unwrap_err();

    assert!(matches!(error, CacheError::Precache { .. }));
    let precache = GenerationName::new("student-benefits-v3");
    for path in ["/", "/index.html", "/styles.css"] {
        assert!(harness.storage.peek(&precache, &identity(path)).is_none(), "{path}");
    }
    assert_eq!(harness.storage.put_count(), 0);
}

#[tokio::test]
async fn test_failed_install_cannot_activate_but_can_retry() {
    let harness = Harness::new();
    harness.network.fail(&url("/benefits.json"), stashbox_test::Reply::Offline);

    assert!(harness.controller.install().await.is_err());
    let error = harness.controller.activate().await.unwrap_err();
    assert!(matches!(
        error,
        CacheError::InvalidState {
            operation: "activate",
            state: LifecycleState::Redundant,
        }
    ));

    harness
        .network
        .respond(&url("/benefits.json"), FetchResponse::ok("[]"));
    let report = harness.controller.install().await.unwrap();
    assert_eq!(report.precached, DEFAULT_MANIFEST.len());
    assert_eq!(harness.controller.state(), LifecycleState::Installed);
}

#[tokio::test]
async fn test_activate_before_install_is_rejected() {
    let harness = Harness::new();

    let error = harness.controller.activate().await.unwrap_err();

    assert!(matches!(
        error,
        CacheError::InvalidState {
            state: LifecycleState::Parsed,
            ..
        }
    ));
    assert_eq!(harness.storage.call_count(), 0);
}

#[tokio::test]
async fn test_activate_retires_other_generations_once() {
    let storage = MockStorage::new();
    for name in [
        "student-benefits-v2",
        "student-benefits-runtime-v2",
        "student-benefits-images-v2",
        "unrelated-cache",
    ] {
        storage.seed(
            &GenerationName::new(name),
            &identity("/"),
            FetchResponse::ok("old"),
            Utc::now(),
        );
    }
    let config = ControllerConfig::builder(origin()).build().unwrap();
    let harness = Harness::from_config(config, storage, Default::default());
    harness.controller.install().await.unwrap();

    let first = harness.controller.activate().await.unwrap();
    assert_eq!(
        first.deleted,
        names(&[
            "student-benefits-v2",
            "student-benefits-runtime-v2",
            "student-benefits-images-v2",
            "unrelated-cache",
        ])
    );

    let second = harness.controller.activate().await.unwrap();
    assert!(second.deleted.is_empty());
    assert_eq!(
        harness.storage.generation_names(),
        names(&["student-benefits-v3"])
    );
    assert_eq!(harness.controller.state(), LifecycleState::Activated);
}

#[tokio::test]
async fn test_version_bump_replaces_generations() {
    let storage = MockStorage::new();
    let network = stashbox_test::MockNetwork::new();

    let v2 = ControllerConfig::builder(origin())
        .version("v2")
        .build()
        .unwrap();
    let old = Harness::from_config(v2, storage.clone(), network.clone());
    old.controller.install().await.unwrap();
    old.controller.activate().await.unwrap();
    old.dispatcher.fetch(stashbox_test::fixtures::get("/api/me")).await.unwrap();

    let v3 = ControllerConfig::builder(origin()).build().unwrap();
    let new = Harness::from_config(v3, storage.clone(), network);
    new.controller.install().await.unwrap();
    let report = new.controller.activate().await.unwrap();

    assert_eq!(
        report.deleted,
        names(&["student-benefits-v2", "student-benefits-runtime-v2"])
    );
    assert_eq!(storage.generation_names(), names(&["student-benefits-v3"]));
}

#[tokio::test]
async fn test_activate_claims_open_pages() {
    let clients = ClientRegistry::new();
    let first = clients.register();
    let second = clients.register();
    let config = ControllerConfig::builder(origin()).build().unwrap();
    let harness = Harness::from_parts(config, MockStorage::new(), Default::default(), clients.clone());

    harness.controller.install().await.unwrap();
    let report = harness.controller.activate().await.unwrap();

    assert_eq!(report.claimed, 2);
    assert_eq!(clients.controller_of(first).as_deref(), Some("v3"));
    assert_eq!(clients.controller_of(second).as_deref(), Some("v3"));
    assert!(clients.uncontrolled().is_empty());
}

#[tokio::test]
async fn test_activate_without_claiming() {
    let clients = ClientRegistry::new();
    clients.register();
    let config = ControllerConfig::builder(origin())
        .claim_clients(false)
        .build()
        .unwrap();
    let harness = Harness::from_parts(config, MockStorage::new(), Default::default(), clients.clone());

    harness.controller.install().await.unwrap();
    let report = harness.controller.activate().await.unwrap();

    assert_eq!(report.claimed, 0);
    assert_eq!(clients.uncontrolled().len(), 1);
}

#[tokio::test]
async fn test_install_event_chains_activation_when_skipping_waiting() {
    let harness = Harness::with_config(|builder| builder.skip_waiting(true));

    let dispatched = harness.dispatcher.dispatch(Event::Install).await.unwrap();

    match dispatched {
        Dispatched::Installed { install, activate } => {
            assert_eq!(install.precached, DEFAULT_MANIFEST.len());
            assert!(activate.is_some());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(harness.controller.state(), LifecycleState::Activated);
}

#[tokio::test]
async fn test_install_event_waits_by_default() {
    let harness = Harness::with_config(|builder| builder.skip_waiting(false));

    let dispatched = harness.dispatcher.dispatch(Event::Install).await.unwrap();

    assert!(matches!(
        dispatched,
        Dispatched::Installed { activate: None, .. }
    ));
    assert_eq!(harness.controller.state(), LifecycleState::Installed);

    let dispatched = harness.dispatcher.dispatch(Event::Activate).await.unwrap();
    assert!(matches!(dispatched, Dispatched::Activated(_)));
    assert_eq!(harness.controller.state(), LifecycleState::Activated);
}

#[tokio::test]
async fn test_fetch_before_install_passes_through() {
    let harness = Harness::new();

    let disposition = harness
        .controller
        .fetch(get("/assets/benefits/gym.webp"))
        .await
        .unwrap();

    assert!(matches!(disposition, FetchDisposition::Passthrough(_)));
    assert_eq!(harness.storage.call_count(), 0);
    assert_eq!(harness.network.total_calls(), 0);
}

#[tokio::test]
async fn test_fetch_after_failed_install_passes_through() {
    let harness = Harness::new();
    harness.network.fail(&url("/benefits.json"), Reply::Offline);
    assert!(harness.controller.install().await.is_err());
    assert_eq!(harness.controller.state(), LifecycleState::Redundant);
    harness.storage.reset_counters();
    harness
        .network
        .respond(&url("/assets/benefits/gym.webp"), FetchResponse::ok("gym"));

    let response = harness
        .dispatcher
        .fetch(get("/assets/benefits/gym.webp"))
        .await
        .unwrap();

    assert_eq!(response.body().as_ref(), b"gym");
    assert_eq!(harness.storage.call_count(), 0);
    assert_eq!(
        harness
            .storage
            .entry_count(&GenerationName::new("student-benefits-images-v3")),
        0
    );
}

#[tokio::test]
async fn test_fetch_is_intercepted_only_after_activation() {
    let harness = Harness::with_config(|builder| builder.skip_waiting(false));
    harness.controller.install().await.unwrap();

    let waiting = harness.controller.fetch(get("/index.html")).await.unwrap();
    assert!(matches!(waiting, FetchDisposition::Passthrough(_)));

    harness.controller.activate().await.unwrap();
    let active = harness.controller.fetch(get("/index.html")).await.unwrap();
    assert!(matches!(active, FetchDisposition::Intercepted(_)));
}

use chrono::Utc;
use http::StatusCode;
use pretty_assertions::assert_eq;
use stashbox::{
    CacheError, CacheStatus, FetchResponse, GenerationName, NetworkError, Outcome, RequestClass,
    ResponseSource,
};
use stashbox_test::fixtures::{Harness, get, identity, url};

const PROFILE: &str = "/api/profile.json";

fn runtime() -> GenerationName {
    GenerationName::new("student-benefits-runtime-v3")
}

#[tokio::test]
async fn test_response_is_stored_and_used_offline() {
    let harness = Harness::new().activated().await;
    harness
        .network
        .respond(&url(PROFILE), FetchResponse::ok(r#"{"name":"Ada"}"#));

    let online = harness
        .controller
        .resolve(RequestClass::DocumentOrData, get(PROFILE))
        .await
        .unwrap();
    assert_eq!(online.context.outcome, Outcome::ServedFromNetwork);
    let stored = harness.storage.peek(&runtime(), &identity(PROFILE)).unwrap();
    assert_eq!(stored.data(), &online.response);

    harness.network.set_offline(true);
    let offline = harness
        .controller
        .resolve(RequestClass::DocumentOrData, get(PROFILE))
        .await
        .unwrap();

    assert_eq!(offline.response, online.response);
    assert_eq!(offline.context.source, ResponseSource::Cache(runtime()));
    assert_eq!(offline.context.outcome, Outcome::ServedFromFallback);
}

#[tokio::test]
async fn test_network_is_preferred_over_cache() {
    let harness = Harness::new().activated().await;
    harness
        .storage
        .seed(&runtime(), &identity(PROFILE), FetchResponse::ok("old"), Utc::now());
    harness.network.respond(&url(PROFILE), FetchResponse::ok("new"));

    let response = harness.dispatcher.fetch(get(PROFILE)).await.unwrap();

    assert_eq!(response.body().as_ref(), b"new");
    assert_eq!(harness.network.calls(&url(PROFILE)), 1);
    let stored = harness.storage.peek(&runtime(), &identity(PROFILE)).unwrap();
    assert_eq!(stored.data().body().as_ref(), b"new");
}

#[tokio::test]
async fn test_offline_document_falls_back_to_precache() {
    let harness = Harness::new().activated().await;
    harness.network.set_offline(true);

    let served = harness
        .controller
        .resolve(RequestClass::DocumentOrData, get("/"))
        .await
        .unwrap();

    assert_eq!(served.response.body().as_ref(), b"precached /");
    assert_eq!(
        served.context.source,
        ResponseSource::Cache(GenerationName::new("student-benefits-v3"))
    );
    assert_eq!(served.context.status, CacheStatus::Stale);
}

#[tokio::test]
async fn test_offline_document_without_copy_fails() {
    let harness = Harness::new().activated().await;
    harness.network.set_offline(true);

    let error = harness.dispatcher.fetch(get(PROFILE)).await.unwrap_err();

    assert!(matches!(error, CacheError::Network(NetworkError::Offline)));
}

#[tokio::test]
async fn test_error_status_is_stored_too() {
    let harness = Harness::new().activated().await;
    harness.network.respond(
        &url(PROFILE),
        FetchResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
    );

    let response = harness.dispatcher.fetch(get(PROFILE)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let stored = harness.storage.peek(&runtime(), &identity(PROFILE)).unwrap();
    assert_eq!(stored.data().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unavailable_storage_still_serves_network() {
    let harness = Harness::new().activated().await;
    harness.network.respond(&url(PROFILE), FetchResponse::ok("profile"));
    harness.storage.set_failing(true);

    let response = harness.dispatcher.fetch(get(PROFILE)).await.unwrap();

    assert_eq!(response.body().as_ref(), b"profile");
    assert_eq!(harness.storage.put_count(), 1);
}

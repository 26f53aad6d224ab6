use std::time::Duration;

use chrono::Utc;
use http::StatusCode;
use pretty_assertions::assert_eq;
use stashbox::{
    CacheStatus, Dispatched, Event, FetchResponse, GenerationName, Outcome, RequestClass,
    ResponseSource,
};
use stashbox_test::fixtures::{Harness, get, identity, url};

const LOGO: &str = "/assets/benefits/logo.png";

fn images() -> GenerationName {
    GenerationName::new("student-benefits-images-v3")
}

async fn respond(harness: &Harness, path: &str) -> (FetchResponse, stashbox::FetchContext) {
    match harness.dispatcher.dispatch(Event::Fetch(get(path))).await.unwrap() {
        Dispatched::Responded {
            response,
            context: Some(context),
        } => (response, context),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_fresh_image_skips_network() {
    let harness = Harness::new().activated().await;
    harness.storage.seed(
        &images(),
        &identity(LOGO),
        FetchResponse::ok("cached logo"),
        Utc::now(),
    );
    harness.network.respond(&url(LOGO), FetchResponse::ok("new logo"));

    let (response, context) = respond(&harness, LOGO).await;

    assert_eq!(response.body().as_ref(), b"cached logo");
    assert_eq!(context.class, RequestClass::ImageAsset);
    assert_eq!(context.status, CacheStatus::Hit);
    assert_eq!(context.outcome, Outcome::ServedFromCache);
    assert_eq!(harness.network.total_calls(), 0);
}

#[tokio::test]
async fn test_image_miss_is_fetched_and_stored() {
    let harness = Harness::new().activated().await;
    harness.network.respond(&url(LOGO), FetchResponse::ok("logo"));

    let (response, context) = respond(&harness, LOGO).await;

    assert_eq!(response.body().as_ref(), b"logo");
    assert_eq!(context.status, CacheStatus::Miss);
    assert_eq!(context.source, ResponseSource::Network);
    let stored = harness.storage.peek(&images(), &identity(LOGO)).unwrap();
    assert_eq!(stored.data().body().as_ref(), b"logo");

    let (again, context) = respond(&harness, LOGO).await;
    assert_eq!(again.body().as_ref(), b"logo");
    assert_eq!(context.source, ResponseSource::Cache(images()));
    assert_eq!(harness.network.calls(&url(LOGO)), 1);
}

#[tokio::test]
async fn test_expired_image_is_refetched() {
    let harness = Harness::with_config(|builder| {
        builder.max_age(RequestClass::ImageAsset, Duration::from_secs(1))
    })
    .activated()
    .await;
    harness.storage.seed(
        &images(),
        &identity(LOGO),
        FetchResponse::ok("old logo"),
        Utc::now() - chrono::Duration::seconds(2),
    );
    harness.network.respond(&url(LOGO), FetchResponse::ok("new logo"));

    let (response, context) = respond(&harness, LOGO).await;

    assert_eq!(response.body().as_ref(), b"new logo");
    assert_eq!(context.status, CacheStatus::Stale);
    assert_eq!(context.outcome, Outcome::ServedFromNetwork);
    assert_eq!(harness.network.calls(&url(LOGO)), 1);
    let stored = harness.storage.peek(&images(), &identity(LOGO)).unwrap();
    assert_eq!(stored.data().body().as_ref(), b"new logo");
}

#[tokio::test]
async fn test_offline_image_without_copy_gets_placeholder() {
    let harness = Harness::new().activated().await;
    harness.network.set_offline(true);

    let (response, context) = respond(&harness, LOGO).await;

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(response.body().as_ref(), b"Network error");
    assert_eq!(context.source, ResponseSource::Synthesized);
    assert_eq!(context.outcome, Outcome::ServedFromFallback);
    assert_eq!(harness.storage.put_count(), 0);
}

#[tokio::test]
async fn test_offline_image_serves_stale_copy() {
    let harness = Harness::with_config(|builder| {
        builder.max_age(RequestClass::ImageAsset, Duration::from_secs(60))
    })
    .activated()
    .await;
    harness.storage.seed(
        &images(),
        &identity(LOGO),
        FetchResponse::ok("old logo"),
        Utc::now() - chrono::Duration::hours(1),
    );
    harness.network.set_offline(true);

    let (response, context) = respond(&harness, LOGO).await;

    assert_eq!(response.body().as_ref(), b"old logo");
    assert_eq!(context.status, CacheStatus::Stale);
    assert_eq!(context.source, ResponseSource::Cache(images()));
    assert_eq!(context.outcome, Outcome::ServedFromFallback);
}

#[tokio::test]
async fn test_non_ok_image_is_returned_but_not_stored() {
    let harness = Harness::new().activated().await;
    harness.network.respond(
        &url(LOGO),
        FetchResponse::new(StatusCode::NOT_FOUND, "gone"),
    );

    let (response, _) = respond(&harness, LOGO).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(harness.storage.peek(&images(), &identity(LOGO)).is_none());
    assert_eq!(harness.storage.put_count(), 0);
}

#[tokio::test]
async fn test_unavailable_storage_degrades_to_network() {
    let harness = Harness::new().activated().await;
    harness.network.respond(&url(LOGO), FetchResponse::ok("logo"));
    harness.storage.set_failing(true);

    let (response, context) = respond(&harness, LOGO).await;

    assert_eq!(response.body().as_ref(), b"logo");
    assert_eq!(context.status, CacheStatus::Miss);
    assert_eq!(harness.storage.lookup_count(), 1);
    assert_eq!(harness.storage.put_count(), 1);
}

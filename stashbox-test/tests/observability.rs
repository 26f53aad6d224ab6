use chrono::Utc;
use pretty_assertions::assert_eq;
use stashbox::{Event, FetchResponse, GenerationName};
use stashbox_test::Reply;
use stashbox_test::fixtures::{Harness, get, identity, url};
use stashbox_test::tracing::create_collector;
use tracing::Level;

#[tokio::test]
async fn test_install_event_is_traced() {
    let collector = create_collector();
    let _guard = tracing::dispatcher::set_default(collector.dispatch());
    let harness = Harness::new();

    harness.dispatcher.dispatch(Event::Install).await.unwrap();

    collector.assert_span_sequence(&["install", "activate"]);
    let complete = collector.events_with_message("install complete");
    assert_eq!(complete.len(), 1);
    assert_eq!(complete[0].span.as_deref(), Some("install"));
    assert_eq!(complete[0].field("precached"), Some("6"));
    collector.assert_has_event("activated");
}

#[tokio::test]
async fn test_failed_install_is_logged_as_warning() {
    let collector = create_collector();
    let _guard = tracing::dispatcher::set_default(collector.dispatch());
    let harness = Harness::new();
    harness.network.fail(&url("/styles.css"), Reply::Offline);

    assert!(harness.dispatcher.dispatch(Event::Install).await.is_err());

    let failed = collector.events_with_message("install failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].level, Level::WARN);
    assert!(!collector.has_span("activate"));
}

#[tokio::test]
async fn test_fetch_span_carries_request() {
    let harness = Harness::new().activated().await;
    let collector = create_collector();
    let _guard = tracing::dispatcher::set_default(collector.dispatch());
    harness.network.set_offline(true);

    harness
        .dispatcher
        .fetch(get("/assets/benefits/logo.png"))
        .await
        .unwrap();

    assert_eq!(
        collector.get_field("fetch", "uri"),
        Some(url("/assets/benefits/logo.png"))
    );
    let warnings = collector.events_with_message("network failed, nothing cached");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].span.as_deref(), Some("fetch"));
}

#[tokio::test]
async fn test_background_refresh_failure_is_logged_in_offload_task() {
    let harness = Harness::new().activated().await;
    let collector = create_collector();
    let _guard = tracing::dispatcher::set_default(collector.dispatch());
    harness.storage.seed(
        &GenerationName::new("student-benefits-runtime-v3"),
        &identity("/assets/app.js"),
        FetchResponse::ok("cached"),
        Utc::now(),
    );
    harness.network.fail(&url("/assets/app.js"), Reply::Timeout);

    harness.dispatcher.fetch(get("/assets/app.js")).await.unwrap();
    harness.controller.offload().wait_all().await;

    let failed = collector.events_with_message("background refresh failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].span.as_deref(), Some("offload_task"));
    collector.assert_span_sequence(&["fetch", "offload_task"]);
}

use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use stashbox::{CacheStatus, ControllerConfig, FetchResponse, GenerationName, RequestClass};
use stashbox_test::fixtures::{Harness, get, identity, url};
use stashbox_test::{MockNetwork, MockStorage};

const LOGO: &str = "/assets/benefits/logo.png";

fn harness(yaml: &str) -> Harness {
    let config = ControllerConfig::from_yaml(yaml).unwrap();
    Harness::from_config(config, MockStorage::new(), MockNetwork::new())
}

#[tokio::test]
async fn test_yaml_freshness_override_applies() {
    let harness = harness(
        r#"
origin: "https://benefits.example"
freshness:
  image_asset: 1s
"#,
    )
    .activated()
    .await;
    let images = GenerationName::new("student-benefits-images-v3");
    harness.storage.seed(
        &images,
        &identity(LOGO),
        FetchResponse::ok("old"),
        Utc::now() - chrono::Duration::seconds(2),
    );
    harness.network.respond(&url(LOGO), FetchResponse::ok("new"));

    let served = harness
        .controller
        .resolve(RequestClass::ImageAsset, get(LOGO))
        .await
        .unwrap();

    assert_eq!(served.context.status, CacheStatus::Stale);
    assert_eq!(served.response.body().as_ref(), b"new");
    assert_eq!(harness.network.calls(&url(LOGO)), 1);
}

#[tokio::test]
async fn test_default_freshness_keeps_recent_image() {
    let harness = harness(r#"origin: "https://benefits.example""#)
        .activated()
        .await;
    let images = GenerationName::new("student-benefits-images-v3");
    harness.storage.seed(
        &images,
        &identity(LOGO),
        FetchResponse::ok("old"),
        Utc::now() - chrono::Duration::days(30),
    );

    let served = harness
        .controller
        .resolve(RequestClass::ImageAsset, get(LOGO))
        .await
        .unwrap();

    assert_eq!(served.context.status, CacheStatus::Hit);
    assert_eq!(harness.network.total_calls(), 0);
}

#[tokio::test]
async fn test_yaml_names_generations_and_manifest() {
    let harness = harness(
        r#"
origin: "https://benefits.example"
generations:
  prefix: perks
  version: "2024-09"
manifest:
  - /
  - /index.html
routes:
  image_segment: /media/
lifecycle:
  skip_waiting: false
offload:
  timeout_policy:
    cancel: 5s
"#,
    );

    let report = harness.controller.install().await.unwrap();

    assert_eq!(report.generation, GenerationName::new("perks-2024-09"));
    assert_eq!(report.precached, 2);
    assert!(!harness.controller.config().lifecycle.skip_waiting);
    assert_eq!(
        harness.controller.classifier().classify(&"https://benefits.example/media/a.png".parse().unwrap()),
        RequestClass::ImageAsset
    );
    assert_eq!(
        harness.controller.config().freshness.max_age(RequestClass::StaticAsset),
        Duration::from_secs(30 * 24 * 60 * 60)
    );
}

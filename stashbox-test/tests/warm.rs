use pretty_assertions::assert_eq;
use stashbox::{CacheError, ConfigError, FetchResponse, GenerationName};
use stashbox_core::Catalog;
use stashbox_test::fixtures::{Harness, identity, url};

const CATALOG: &[u8] = br#"[
  {"title": "Editor", "description": "Free licence", "url": "https://e.example",
   "imageSrc": "/assets/benefits/editor.webp", "tags": ["dev"]},
  {"title": "Cloud", "description": "Credits", "url": "https://c.example",
   "imageSrc": "/assets/benefits/cloud.webp", "tags": ["dev"]},
  {"title": "Editor again", "description": "Same image", "url": "https://e2.example",
   "imageSrc": "/assets/benefits/editor.webp", "tags": ["dev"]},
  {"title": "Retired", "description": "Gone", "url": "https://r.example",
   "imageSrc": "/assets/benefits/retired.webp", "tags": ["misc"], "hide": true}
]"#;

fn images() -> GenerationName {
    GenerationName::new("student-benefits-images-v3")
}

#[tokio::test]
async fn test_warm_stores_visible_catalog_images() {
    let harness = Harness::new().activated().await;
    let catalog = Catalog::from_json(CATALOG).unwrap();
    for path in catalog.image_paths() {
        harness.network.respond(&url(path), FetchResponse::ok(path.to_owned()));
    }

    let warmed = harness.controller.warm(catalog.image_paths()).await.unwrap();

    assert_eq!(warmed, 2);
    assert_eq!(harness.storage.entry_count(&images()), 2);
    assert!(
        harness
            .storage
            .peek(&images(), &identity("/assets/benefits/retired.webp"))
            .is_none()
    );
    assert_eq!(harness.network.total_calls(), 2);
}

#[tokio::test]
async fn test_second_warm_uses_fresh_entries() {
    let harness = Harness::new().activated().await;
    let catalog = Catalog::from_json(CATALOG).unwrap();
    for path in catalog.image_paths() {
        harness.network.respond(&url(path), FetchResponse::ok("image"));
    }

    harness.controller.warm(catalog.image_paths()).await.unwrap();
    harness.network.reset_counters();
    let warmed = harness.controller.warm(catalog.image_paths()).await.unwrap();

    assert_eq!(warmed, 2);
    assert_eq!(harness.network.total_calls(), 0);
}

#[tokio::test]
async fn test_missing_image_lowers_the_count() {
    let harness = Harness::new().activated().await;
    harness
        .network
        .respond(&url("/assets/benefits/editor.webp"), FetchResponse::ok("editor"));

    let warmed = harness
        .controller
        .warm(["/assets/benefits/editor.webp", "/assets/benefits/cloud.webp"])
        .await
        .unwrap();

    assert_eq!(warmed, 1);
    assert_eq!(harness.storage.entry_count(&images()), 1);
}

#[tokio::test]
async fn test_warm_rejects_paths_outside_the_origin() {
    let harness = Harness::new().activated().await;

    let error = harness
        .controller
        .warm(["https://cdn.example/logo.png"])
        .await
        .unwrap_err();

    assert!(matches!(error, CacheError::Config(ConfigError::Origin(_))));
    assert_eq!(harness.network.total_calls(), 0);
}

#[tokio::test]
async fn test_background_warm_runs_on_offload_manager() {
    let harness = Harness::new().activated().await;
    let catalog = Catalog::from_json(CATALOG).unwrap();
    for path in catalog.image_paths() {
        harness.network.respond(&url(path), FetchResponse::ok("image"));
    }
    let paths = catalog.image_paths().into_iter().map(str::to_owned).collect();

    let key = harness.controller.warm_in_background(paths);

    assert_eq!(key.kind(), "warmup");
    harness.controller.offload().wait_all().await;
    assert_eq!(harness.storage.entry_count(&images()), 2);
    assert!(!harness.controller.offload().is_in_flight(&key));
}

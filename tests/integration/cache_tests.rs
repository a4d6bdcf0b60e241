//! Cache effectiveness tests.
//!
//! Tests verify:
//! - Repeated requests are served from the variant cache
//! - Concurrent requests for one variant compute it once
//! - Distinct variants are cached independently
//! - Failures are not cached

use std::time::Duration;

use axum::http::StatusCode;

use vip::{create_router, CacheKey, RequestParams, RouterConfig};

use super::test_utils::{body_bytes, create_jpeg, get, service, MockStore};

#[tokio::test]
async fn test_second_request_is_cache_hit() {
    let store =
        MockStore::new().with_original("photos", "cat.jpg", create_jpeg(400, 300), Some("image/jpeg"));
    let router = create_router(service(store.clone()), RouterConfig::new());

    let first = get(&router, "/photos/cat.jpg?s=100").await;
    assert_eq!(first.headers().get("x-cache-hit").unwrap(), "false");
    let first_body = body_bytes(first).await;

    let second = get(&router, "/photos/cat.jpg?s=100").await;
    assert_eq!(second.headers().get("x-cache-hit").unwrap(), "true");
    let second_body = body_bytes(second).await;

    assert_eq!(first_body, second_body);
    assert_eq!(store.head_calls(), 1);
    assert_eq!(store.original_reads(), 1);
}

#[tokio::test]
async fn test_equivalent_requests_share_a_key() {
    let store =
        MockStore::new().with_original("photos", "cat.jpg", create_jpeg(400, 300), Some("image/jpeg"));
    let router = create_router(service(store.clone()), RouterConfig::new());

    // All three normalize to width 720, crop true
    for uri in [
        "/photos/cat.jpg?s=720&c=true",
        "/photos/cat.jpg?s=5000&c=TRUE",
        "/photos/cat.jpg?c=True&s=721",
    ] {
        assert_eq!(get(&router, uri).await.status(), StatusCode::OK);
    }

    assert_eq!(store.original_reads(), 1);
}

#[tokio::test]
async fn test_distinct_variants_computed_separately() {
    let store =
        MockStore::new().with_original("photos", "cat.jpg", create_jpeg(400, 300), Some("image/jpeg"));
    let router = create_router(service(store.clone()), RouterConfig::new());

    get(&router, "/photos/cat.jpg?s=100").await;
    get(&router, "/photos/cat.jpg?s=100&c=true").await;
    get(&router, "/photos/cat.jpg?s=200").await;

    assert_eq!(store.original_reads(), 3);

    store.wait_for_writes(3).await;
    for key in [
        CacheKey::new("photos", "cat.jpg", 100, false),
        CacheKey::new("photos", "cat.jpg", 100, true),
        CacheKey::new("photos", "cat.jpg", 200, false),
    ] {
        assert!(store.stored_modified(&key).is_some(), "missing {}", key);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_compute_once() {
    let store = MockStore::new()
        .with_original("photos", "cat.jpg", create_jpeg(800, 600), Some("image/jpeg"))
        .with_read_delay(Duration::from_millis(50));
    let router = create_router(service(store.clone()), RouterConfig::new());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let response = get(&router, "/photos/cat.jpg?s=300&c=true").await;
            (response.status(), body_bytes(response).await)
        }));
    }

    let mut bodies = Vec::new();
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        bodies.push(body);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(store.head_calls(), 1);
    assert_eq!(store.original_reads(), 1);

    store.wait_for_writes(1).await;
    assert_eq!(store.writes(), 1);
}

#[tokio::test]
async fn test_restart_reuses_persisted_variant() {
    let store =
        MockStore::new().with_original("photos", "cat.jpg", create_jpeg(400, 300), Some("image/jpeg"));

    let first_service = service(store.clone());
    let first = first_service
        .get_image(&RequestParams::new("photos", "cat.jpg").with_width("120"))
        .await
        .unwrap();
    store.wait_for_writes(1).await;

    // A fresh service has an empty variant cache but shares the store
    let second_service = service(store.clone());
    let second = second_service
        .get_image(&RequestParams::new("photos", "cat.jpg").with_width("120"))
        .await
        .unwrap();

    assert!(!second.cache_hit);
    assert_eq!(first.data, second.data);
    assert_eq!(store.original_reads(), 1);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let store = MockStore::new();
    let router = create_router(service(store.clone()), RouterConfig::new());

    assert_eq!(
        get(&router, "/photos/late.jpg?s=100").await.status(),
        StatusCode::NOT_FOUND
    );

    // The original appears after the first miss
    let store = store.with_original("photos", "late.jpg", create_jpeg(200, 200), Some("image/jpeg"));

    let response = get(&router, "/photos/late.jpg?s=100").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-cache-hit").unwrap(), "false");
    assert_eq!(store.original_reads(), 2);
}

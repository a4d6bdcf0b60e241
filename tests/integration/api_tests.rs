//! API integration tests for image retrieval and error handling.
//!
//! Tests verify:
//! - Resize, crop and passthrough through the HTTP surface
//! - Error cases (missing original, undecodable original, unreachable store)
//! - HTTP response codes and headers

use axum::http::StatusCode;
use serde_json::Value;

use vip::{create_router, CacheKey, RouterConfig};

use super::test_utils::{
    body_bytes, create_jpeg, create_png, dimensions, get, gif_bytes, is_valid_jpeg, service,
    MockStore,
};

// =============================================================================
// Basic Image Retrieval
// =============================================================================

#[tokio::test]
async fn test_resize_and_crop() {
    let store =
        MockStore::new().with_original("photos", "cat.jpg", create_jpeg(800, 600), Some("image/jpeg"));
    let router = create_router(service(store), RouterConfig::new());

    let response = get(&router, "/photos/cat.jpg?s=200&c=true").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/jpeg");
    assert_eq!(response.headers().get("x-cache-hit").unwrap(), "false");

    let body = body_bytes(response).await;
    assert!(is_valid_jpeg(&body));
    assert_eq!(dimensions(&body), (150, 150));
}

#[tokio::test]
async fn test_resize_keeps_aspect_ratio() {
    let store =
        MockStore::new().with_original("photos", "wide.jpg", create_jpeg(640, 480), Some("image/jpeg"));
    let router = create_router(service(store), RouterConfig::new());

    let response = get(&router, "/photos/wide.jpg?s=320").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    assert_eq!(dimensions(&body), (320, 240));
}

#[tokio::test]
async fn test_no_parameters_returns_original() {
    let original = create_jpeg(64, 64);
    let store =
        MockStore::new().with_original("photos", "small.jpg", original.clone(), Some("image/jpeg"));
    let router = create_router(service(store.clone()), RouterConfig::new());

    let response = get(&router, "/photos/small.jpg").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    assert_eq!(body.as_ref(), original.as_slice());

    // One write-back of the identity variant
    store.wait_for_writes(1).await;
    assert_eq!(store.writes(), 1);
    assert_eq!(
        store.stored_modified(&CacheKey::new("photos", "small.jpg", 0, false)),
        Some(original.into())
    );
}

#[tokio::test]
async fn test_png_stays_png() {
    let store =
        MockStore::new().with_original("photos", "logo.png", create_png(300, 100), Some("image/png"));
    let router = create_router(service(store), RouterConfig::new());

    let response = get(&router, "/photos/logo.png?s=150").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    let body = body_bytes(response).await;
    assert_eq!(dimensions(&body), (150, 50));
}

#[tokio::test]
async fn test_gif_passthrough() {
    let gif = gif_bytes();
    let store = MockStore::new().with_original("photos", "anim.gif", gif.clone(), Some("image/gif"));
    let router = create_router(service(store.clone()), RouterConfig::new());

    let response = get(&router, "/photos/anim.gif?s=100&c=true").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/gif");
    let body = body_bytes(response).await;
    assert_eq!(body.as_ref(), gif.as_slice());
    assert_eq!(store.modified_reads(), 0);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_nested_image_id() {
    let store = MockStore::new().with_original(
        "photos",
        "2024/summer/beach.jpg",
        create_jpeg(400, 400),
        Some("image/jpeg"),
    );
    let router = create_router(service(store), RouterConfig::new());

    let response = get(&router, "/photos/2024/summer/beach.jpg?s=100").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(dimensions(&body), (100, 100));
}

#[tokio::test]
async fn test_width_clamped_to_max() {
    let store =
        MockStore::new().with_original("photos", "big.jpg", create_jpeg(1440, 720), Some("image/jpeg"));
    let router = create_router(service(store), RouterConfig::new());

    let response = get(&router, "/photos/big.jpg?s=99999").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(dimensions(&body), (720, 360));
}

#[tokio::test]
async fn test_malformed_width_means_no_resize() {
    let original = create_jpeg(50, 40);
    let store =
        MockStore::new().with_original("photos", "a.jpg", original.clone(), Some("image/jpeg"));
    let router = create_router(service(store), RouterConfig::new());

    let response = get(&router, "/photos/a.jpg?s=wide").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(body.as_ref(), original.as_slice());
}

#[tokio::test]
async fn test_persisted_variant_served_without_original() {
    let key = CacheKey::new("photos", "cat.jpg", 200, true);
    let variant = create_jpeg(150, 150);
    let store = MockStore::new()
        .with_original("photos", "cat.jpg", create_jpeg(800, 600), Some("image/jpeg"))
        .with_modified(&key, variant.clone());
    let router = create_router(service(store.clone()), RouterConfig::new());

    let response = get(&router, "/photos/cat.jpg?s=200&c=TRUE").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(body.as_ref(), variant.as_slice());
    assert_eq!(store.original_reads(), 0);
}

// =============================================================================
// Headers
// =============================================================================

#[tokio::test]
async fn test_cache_control_header() {
    let store =
        MockStore::new().with_original("photos", "a.jpg", create_jpeg(32, 32), Some("image/jpeg"));
    let router = create_router(service(store), RouterConfig::new().with_cache_max_age(600));

    let response = get(&router, "/photos/a.jpg").await;

    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=600"
    );
}

#[tokio::test]
async fn test_cors_header_any_origin() {
    let store =
        MockStore::new().with_original("photos", "a.jpg", create_jpeg(32, 32), Some("image/jpeg"));
    let router = create_router(service(store), RouterConfig::new());

    let request = axum::http::Request::builder()
        .uri("/photos/a.jpg")
        .header("origin", "https://gallery.example")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(router, request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_missing_original_returns_404() {
    let router = create_router(service(MockStore::new()), RouterConfig::new());

    let response = get(&router, "/photos/nope.jpg?s=100").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_bytes(response).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_undecodable_original_returns_415() {
    let store = MockStore::new().with_original(
        "photos",
        "notes.txt",
        b"definitely not pixels".to_vec(),
        Some("text/plain"),
    );
    let router = create_router(service(store.clone()), RouterConfig::new());

    let response = get(&router, "/photos/notes.txt?s=100").await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = body_bytes(response).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unsupported_format");
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_oversized_variant_returns_422() {
    // Upscaling to 720px wide would need a 720x36000000 buffer
    let store =
        MockStore::new().with_original("photos", "strip.png", create_png(1, 50_000), Some("image/png"));
    let router = create_router(service(store.clone()), RouterConfig::new());

    let response = get(&router, "/photos/strip.png?s=720").await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_bytes(response).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "image_too_large");
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_unreachable_store_returns_502() {
    let router = create_router(service(MockStore::new().unreachable()), RouterConfig::new());

    let response = get(&router, "/photos/a.jpg?s=100").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = create_router(service(MockStore::new()), RouterConfig::new());

    let response = get(&router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

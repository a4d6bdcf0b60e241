//! HTTP request handlers for the image API.
//!
//! # Endpoints
//!
//! - `GET /{bucket_id}/{image_id}?s={width}&c={crop}` - Serve an image variant
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{FetchError, ImageError, StoreError};
use crate::fetch::{ImageService, RequestParams};
use crate::store::ImageStore;

/// Header reporting whether the variant came from the cache layer.
pub const CACHE_HIT_HEADER: HeaderName = HeaderName::from_static("x-cache-hit");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the image service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: ImageStore> {
    /// The image service resolving requests
    pub image_service: Arc<ImageService<S>>,

    /// Cache-Control max-age in seconds (defaults to 1 hour)
    pub cache_max_age: u32,
}

impl<S: ImageStore> AppState<S> {
    /// Create a new application state with the given image service.
    pub fn new(image_service: ImageService<S>) -> Self {
        Self::with_cache_max_age(image_service, 3600)
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(image_service: ImageService<S>, cache_max_age: u32) -> Self {
        Self {
            image_service: Arc::new(image_service),
            cache_max_age,
        }
    }
}

impl<S: ImageStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            image_service: Arc::clone(&self.image_service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for image requests.
///
/// Extracted from: `/{bucket_id}/{*image_id}`
#[derive(Debug, Deserialize)]
pub struct ImagePathParams {
    /// Storage bucket holding the original
    pub bucket_id: String,

    /// Object key of the original (may contain `/`)
    pub image_id: String,
}

/// Query parameters for image requests.
///
/// Both stay raw strings: malformed values are not an error and are
/// normalized when the cache key is built.
#[derive(Debug, Default, Deserialize)]
pub struct ImageQueryParams {
    /// Requested width in pixels
    #[serde(default)]
    pub s: Option<String>,

    /// Square center crop, `"true"` in any case
    #[serde(default)]
    pub c: Option<String>,
}

impl ImageQueryParams {
    fn into_request(self, path: ImagePathParams) -> RequestParams {
        RequestParams {
            bucket: path.bucket_id,
            image_id: path.image_id,
            width: self.s,
            crop: self.c,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "unsupported_format")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str) {
    match err {
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        StoreError::Connection(_) => (StatusCode::BAD_GATEWAY, "connection_error"),
        StoreError::S3(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
    }
}

fn classify_image_error(err: &ImageError) -> (StatusCode, &'static str) {
    match err {
        ImageError::Decode { .. } | ImageError::UnsupportedFormat { .. } => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_format")
        }
        ImageError::TooLarge { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "image_too_large"),
        ImageError::Encode { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "encode_error"),
    }
}

/// Convert FetchError to HTTP response.
///
/// This implementation logs errors based on their severity:
/// - 5xx errors are logged at ERROR level
/// - 404 is logged at DEBUG level (common and expected)
/// - other 4xx errors are logged at WARN level
impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            FetchError::OriginalNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            FetchError::Store(e) => classify_store_error(e),
            FetchError::Image(e) => classify_image_error(e),
            FetchError::Worker { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "worker_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle image requests.
///
/// # Endpoint
///
/// `GET /{bucket_id}/{image_id}`
///
/// # Query Parameters
///
/// - `s`: Target width in pixels, clamped to the configured maximum
///   (missing or malformed = no resize)
/// - `c`: `true` to center-crop to a square after resizing
///
/// # Response
///
/// - `200 OK`: Encoded image bytes
/// - `404 Not Found`: Original not found
/// - `415 Unsupported Media Type`: Original cannot be decoded
/// - `422 Unprocessable Entity`: Requested variant would be too large
/// - `502 Bad Gateway`: Store unreachable
/// - `500 Internal Server Error`: Processing error
///
/// # Headers
///
/// - `Content-Type`: sniffed from the returned bytes
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Cache-Hit: true|false`
pub async fn image_handler<S: ImageStore + 'static>(
    State(state): State<AppState<S>>,
    Path(path): Path<ImagePathParams>,
    Query(query): Query<ImageQueryParams>,
) -> Result<Response, FetchError> {
    let request = query.into_request(path);
    let response = state.image_service.get_image(&request).await?;

    debug!(
        key = %response.key,
        cache_hit = response.cache_hit,
        size = response.data.len(),
        "Serving image"
    );

    let headers = [
        (
            header::CONTENT_TYPE,
            response.format.content_type().to_string(),
        ),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
        (CACHE_HIT_HEADER, response.cache_hit.to_string()),
    ];

    Ok((StatusCode::OK, headers, response.data).into_response())
}

/// Health check endpoint.
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================

//! Router assembly for the variant server.
//!
//! ```text
//! /health                          - Health check
//! /{bucket_id}/{*image_id}         - Image variant (image_id may nest: a/b/c.jpg)
//! ```
//!
//! Every route sits behind a CORS layer. Request tracing is optional.

use std::time::Duration;

use axum::{routing::get, Router};
use http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{health_handler, image_handler, AppState};
use crate::fetch::ImageService;
use crate::store::ImageStore;

/// How long browsers may cache a preflight answer.
const CORS_PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Settings that shape the HTTP surface rather than variant resolution.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Origins allowed to fetch variants cross-origin. `None` allows any
    /// origin, an empty list allows none.
    pub cors_origins: Option<Vec<String>>,

    /// `max-age` sent in `Cache-Control` on served variants
    pub cache_max_age: u32,

    /// Wrap the router in a `TraceLayer`
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Any origin, one hour of client caching, tracing on.
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            enable_tracing: true,
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the router serving variants from `image_service`.
///
/// A single catch-all route covers both flat and nested image ids.
pub fn create_router<S>(image_service: ImageService<S>, config: RouterConfig) -> Router
where
    S: ImageStore + 'static,
{
    let state = AppState::with_cache_max_age(image_service, config.cache_max_age);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/{bucket_id}/{*image_id}", get(image_handler::<S>))
        .with_state(state)
        .layer(cors_layer(config.cors_origins.as_deref()));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Variants are read-only, so only GET and HEAD are exposed cross-origin.
fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD])
        .max_age(CORS_PREFLIGHT_MAX_AGE);

    let Some(origins) = origins else {
        return cors.allow_origin(Any);
    };
    if origins.is_empty() {
        return cors;
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(allowed)
}

//! HTTP server layer.
//!
//! This module provides the HTTP API for serving image variants.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │             GET /{bucket_id}/{image_id}?s=&c=                   │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (requests, error → HTTP) │  │ (router, CORS, tracing)     │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, image_handler, AppState, ErrorResponse, HealthResponse, ImagePathParams,
    ImageQueryParams, CACHE_HIT_HEADER,
};
pub use routes::{create_router, RouterConfig};

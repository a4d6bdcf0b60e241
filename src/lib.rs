//! # vip
//!
//! A read-through image variant server for images stored in S3-compatible
//! object storage.
//!
//! A request names an original (`bucket`, `image_id`) and a variant of it
//! (target width, optional square crop). The server answers from an
//! in-process cache, then from the variant persisted in the store, and only
//! then computes the variant from the original and writes it back.
//!
//! ## Features
//!
//! - **Read-through**: each variant is computed at most once and persisted
//!   next to its original
//! - **Request coalescing**: concurrent requests for one variant share a
//!   single computation
//! - **EXIF aware**: originals are upright before they are resized
//! - **GIF passthrough**: animated originals are served untouched
//!
//! ## Architecture
//!
//! - [`store`] - Object store trait and the S3 implementation
//! - [`transform`] - Decode, orient, resize, crop and encode
//! - [`fetch`] - Cache key, cache layer, orchestrator and write-back
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use vip::{create_router, create_s3_client, ImageFetcher, ImageService, RouterConfig, S3ImageStore};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let fetcher = ImageFetcher::new(S3ImageStore::new(client));
//!     let service = ImageService::new(fetcher);
//!
//!     let router = create_router(service, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, router).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod server;
pub mod store;
pub mod transform;


// Re-export commonly used types
pub use config::Config;
pub use error::{FetchError, ImageError, StoreError};
pub use fetch::{
    CacheKey, CacheLayer, Compute, ImageFetcher, ImageResponse, ImageService, Lookup,
    RequestParams, VariantCache, WriteBack, WriteBackStats,
};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use store::{create_s3_client, ImageStore, ObjectMetadata, S3ImageStore};
pub use transform::{ImageFormat, Rotation, Transform, TransformPipeline};

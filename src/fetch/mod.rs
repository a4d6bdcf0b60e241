//! Read-through fetch layer.
//!
//! This module turns a request into image bytes, computing each variant at
//! most once and reusing it afterwards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ RequestParams
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              ImageService               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ VariantCache │  │  ImageFetcher   │  │
//! │  │ (LRU, single │─▶│ (head → variant │  │
//! │  │  flight)     │  │  → original)    │  │
//! │  └──────────────┘  └────────┬────────┘  │
//! │                             │ WriteBack │
//! └─────────────────────────────┼───────────┘
//!                               ▼
//! ┌─────────────────────────────────────────┐
//! │               ImageStore                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`ImageService`]: Entry point; builds the key and resolves it
//! - [`CacheKey`]: Identity of a variant (bucket, image, width, crop)
//! - [`CacheLayer`] / [`Compute`]: The contract between cache and orchestrator
//! - [`VariantCache`]: In-process cache layer with request coalescing
//! - [`ImageFetcher`]: The orchestrator run on a cache miss
//! - [`WriteBack`]: Bounded background persistence of new variants
//!
//! # Example
//!
//! ```
//! use vip::fetch::CacheKey;
//! use vip::fetch::RequestParams;
//!
//! let params = RequestParams::new("photos", "cat.jpg")
//!     .with_width("4000")
//!     .with_crop("TRUE");
//!
//! let key = CacheKey::from_params(&params, 720);
//! assert_eq!(key.width, 720);
//! assert!(key.crop);
//! assert_eq!(key.modified_object_key(), "cat.jpg_w720_c");
//! ```

mod cache;
mod fetcher;
mod key;
mod service;
mod writeback;

pub use cache::{CacheLayer, Compute, Lookup, VariantCache, DEFAULT_VARIANT_CACHE_CAPACITY};
pub use fetcher::ImageFetcher;
pub use key::{CacheKey, RequestParams};
pub use service::{ImageResponse, ImageService, DEFAULT_MAX_WIDTH};
pub use writeback::{WriteBack, WriteBackStats, DEFAULT_WRITE_BACK_CONCURRENCY};

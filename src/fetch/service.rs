//! Image service: the entry point for image requests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          ImageService                            │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │                       get_image()                          │  │
//! │  │  1. Build CacheKey (clamp width)   3. On miss: compute     │  │
//! │  │  2. Resolve through cache layer    4. Tag output format    │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! │           │                                   │                  │
//! │           ▼                                   ▼                  │
//! │    ┌──────────────┐                   ┌──────────────────┐       │
//! │    │ VariantCache │ ── miss ────────▶ │   ImageFetcher   │       │
//! │    └──────────────┘                   └──────────────────┘       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use bytes::Bytes;

use crate::error::FetchError;
use crate::store::ImageStore;
use crate::transform::ImageFormat;

use super::cache::{CacheLayer, VariantCache};
use super::fetcher::ImageFetcher;
use super::key::{CacheKey, RequestParams};

/// Default maximum width a client may request.
pub const DEFAULT_MAX_WIDTH: u32 = 720;

/// Response from the image service.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    /// Encoded image bytes
    pub data: Bytes,

    /// Format of `data`, sniffed from its bytes
    pub format: ImageFormat,

    /// Whether the bytes were served from the cache layer
    pub cache_hit: bool,

    /// The key the request resolved to
    pub key: CacheKey,
}

/// Serves image variants through a cache layer.
///
/// # Type Parameters
///
/// * `S` - The object store type (e.g., S3-based store)
/// * `C` - The cache layer (defaults to the in-process [`VariantCache`])
pub struct ImageService<S: ImageStore, C: CacheLayer = VariantCache> {
    cache: C,
    fetcher: ImageFetcher<S>,
    max_width: u32,
}

impl<S: ImageStore + 'static> ImageService<S, VariantCache> {
    /// Create a service with a default-sized variant cache.
    pub fn new(fetcher: ImageFetcher<S>) -> Self {
        Self::with_cache(fetcher, VariantCache::new(), DEFAULT_MAX_WIDTH)
    }

    /// Create a service with a variant cache of `cache_capacity` bytes.
    pub fn with_cache_capacity(
        fetcher: ImageFetcher<S>,
        cache_capacity: usize,
        max_width: u32,
    ) -> Self {
        Self::with_cache(fetcher, VariantCache::with_capacity(cache_capacity), max_width)
    }

    /// Get variant cache statistics.
    ///
    /// Returns `(current_size, capacity, entry_count)`.
    pub async fn cache_stats(&self) -> (usize, usize, usize) {
        let size = self.cache.size().await;
        let capacity = self.cache.capacity();
        let count = self.cache.len().await;
        (size, capacity, count)
    }
}

impl<S: ImageStore + 'static, C: CacheLayer> ImageService<S, C> {
    /// Create a service over any cache layer.
    pub fn with_cache(fetcher: ImageFetcher<S>, cache: C, max_width: u32) -> Self {
        Self {
            cache,
            fetcher,
            max_width,
        }
    }

    /// Serve the variant described by raw request parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The original does not exist and no persisted variant does either
    /// - The store fails while reading the original
    /// - The original cannot be decoded, transformed or encoded
    pub async fn get_image(&self, params: &RequestParams) -> Result<ImageResponse, FetchError> {
        let key = CacheKey::from_params(params, self.max_width);
        self.get_variant(key).await
    }

    /// Serve the variant for an already built key.
    pub async fn get_variant(&self, key: CacheKey) -> Result<ImageResponse, FetchError> {
        let lookup = self.cache.resolve(&key, &self.fetcher).await?;

        Ok(ImageResponse {
            format: ImageFormat::sniff(&lookup.data),
            data: lookup.data,
            cache_hit: lookup.cache_hit,
            key,
        })
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn fetcher(&self) -> &ImageFetcher<S> {
        &self.fetcher
    }
}

// =============================================================================
// Tests
// =============================================================================

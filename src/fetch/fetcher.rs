//! Read-through orchestration of one variant computation.
//!
//! [`ImageFetcher`] is the [`Compute`] a cache layer calls on a miss. For a
//! key it tries, in order:
//!
//! 1. Head lookup: a GIF original is returned untouched
//! 2. The persisted variant for the key, returned as is
//! 3. The original, transformed and encoded, then written back
//!
//! Head failures and write-back failures are logged and absorbed; failing to
//! read the original or to transform it fails the computation.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::{FetchError, ImageError, StoreError};
use crate::store::ImageStore;
use crate::transform::{ImageFormat, TransformPipeline};

use super::cache::Compute;
use super::key::CacheKey;
use super::writeback::{WriteBack, DEFAULT_WRITE_BACK_CONCURRENCY};

/// Computes variants from the store.
pub struct ImageFetcher<S: ImageStore> {
    /// Store holding originals and persisted variants
    store: Arc<S>,

    /// Decode/transform/encode pipeline
    pipeline: TransformPipeline,

    /// Background writer for new variants
    write_back: WriteBack<S>,
}

impl<S: ImageStore + 'static> ImageFetcher<S> {
    /// Create a fetcher with the default pipeline and write-back limit.
    pub fn new(store: S) -> Self {
        Self::with_options(
            Arc::new(store),
            TransformPipeline::new(),
            DEFAULT_WRITE_BACK_CONCURRENCY,
        )
    }

    /// Create a fetcher sharing `store` with other components.
    pub fn with_options(
        store: Arc<S>,
        pipeline: TransformPipeline,
        write_back_concurrency: usize,
    ) -> Self {
        Self {
            write_back: WriteBack::new(Arc::clone(&store), write_back_concurrency),
            store,
            pipeline,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn write_back(&self) -> &WriteBack<S> {
        &self.write_back
    }

    /// Return the original untouched when the store says it is a GIF.
    ///
    /// `Ok(None)` means "not a GIF, or unknown": carry on with the normal
    /// path. A failed head lookup is not an error.
    async fn gif_passthrough(&self, key: &CacheKey) -> Result<Option<Bytes>, FetchError> {
        match self.store.head(&key.bucket, &key.image_id).await {
            Ok(metadata) if metadata.format() == ImageFormat::Gif => {
                let data = self.read_original(key).await?;
                debug!(key = %key, "Serving GIF original unmodified");
                Ok(Some(data))
            }
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(key = %key, error = %e, "Head lookup failed, continuing");
                Ok(None)
            }
        }
    }

    async fn read_original(&self, key: &CacheKey) -> Result<Bytes, FetchError> {
        self.store
            .read_original(&key.bucket, &key.image_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => FetchError::OriginalNotFound {
                    bucket: key.bucket.to_string(),
                    image_id: key.image_id.to_string(),
                },
                other => FetchError::Store(other),
            })
    }

    /// Run the pipeline on a blocking thread.
    async fn transform(&self, key: &CacheKey, original: Bytes) -> Result<Bytes, FetchError> {
        let pipeline = self.pipeline.clone();
        let transform = key.transform();

        let data = tokio::task::spawn_blocking(move || pipeline.apply(&original, transform))
            .await
            .map_err(|e| FetchError::Worker {
                message: e.to_string(),
            })??;

        if data.is_empty() {
            return Err(ImageError::Encode {
                message: "encoder produced no output".to_string(),
            }
            .into());
        }

        Ok(data)
    }
}

#[async_trait]
impl<S: ImageStore + 'static> Compute for ImageFetcher<S> {
    async fn compute(&self, key: &CacheKey) -> Result<Bytes, FetchError> {
        if let Some(gif) = self.gif_passthrough(key).await? {
            return Ok(gif);
        }

        match self.store.read_modified(key).await {
            Ok(data) => {
                debug!(key = %key, "Retrieved modified image from store");
                return Ok(data);
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Reading modified image failed, using original");
            }
        }

        let original = self.read_original(key).await?;

        // Without metadata a GIF only shows itself by its magic number
        if ImageFormat::sniff(&original) == ImageFormat::Gif {
            debug!(key = %key, "Original is a GIF, serving unmodified");
            return Ok(original);
        }

        let result = if key.transform().is_identity() {
            original
        } else {
            self.transform(key, original).await?
        };

        self.write_back.submit(key.clone(), result.clone());

        info!(key = %key, size = result.len(), "Computed image from original");
        Ok(result)
    }
}

// =============================================================================
// Tests
// =============================================================================

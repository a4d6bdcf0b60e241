//! Object store access.
//!
//! The fetch layer reads originals and persisted variants through the
//! [`ImageStore`] trait, so it works the same against S3, MinIO or an
//! in-memory store in tests.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              ImageFetcher               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            ImageStore Trait             │
//! │  head · read_original · read_modified   │
//! │             · write_modified            │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             S3ImageStore                │
//! └─────────────────────────────────────────┘
//! ```

mod s3;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::fetch::CacheKey;
use crate::transform::ImageFormat;

pub use s3::{create_s3_client, S3ImageStore};

/// Metadata returned by a head lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// The stored `Content-Type`, if any
    pub content_type: Option<String>,
}

impl ObjectMetadata {
    pub fn new(content_type: Option<String>) -> Self {
        Self { content_type }
    }

    /// The format named by the stored content type.
    pub fn format(&self) -> ImageFormat {
        self.content_type
            .as_deref()
            .map(ImageFormat::from_content_type)
            .unwrap_or(ImageFormat::Unsupported)
    }
}

/// Storage backend holding originals and computed variants.
///
/// Originals are addressed by `(bucket, image_id)`; variants by their
/// [`CacheKey`], which derives the object name in the same bucket.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Look up an original's metadata without reading it.
    async fn head(&self, bucket: &str, image_id: &str) -> Result<ObjectMetadata, StoreError>;

    /// Read an original in full.
    async fn read_original(&self, bucket: &str, image_id: &str) -> Result<Bytes, StoreError>;

    /// Read the persisted variant for `key`.
    ///
    /// Returns [`StoreError::NotFound`] when the variant was never written.
    async fn read_modified(&self, key: &CacheKey) -> Result<Bytes, StoreError>;

    /// Persist the variant for `key`, replacing any previous copy.
    async fn write_modified(&self, key: &CacheKey, data: Bytes) -> Result<(), StoreError>;
}

use thiserror::Error;

use crate::transform::ImageFormat;

/// Errors returned by the object store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Whether this error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Errors raised while decoding, transforming or encoding an image
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    /// The source bytes could not be decoded
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// The transformed image could not be encoded
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// The requested output would need more memory than allowed
    #[error("Output image too large: {width}x{height}")]
    TooLarge { width: u32, height: u64 },

    /// The decoded format has no output encoder (only JPEG and PNG do)
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: ImageFormat },
}

/// Errors that fail a variant computation.
///
/// Cloneable so that every caller coalesced onto one in-flight computation
/// receives the same result.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Store failure while reading the original
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Decode, transform or encode failure
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Neither a modified variant nor the original exists
    #[error("Image not found: {bucket}/{image_id}")]
    OriginalNotFound { bucket: String, image_id: String },

    /// The blocking transform worker panicked or was cancelled
    #[error("Transform worker failed: {message}")]
    Worker { message: String },
}

//! Decode, orient, resize, crop and re-encode.
//!
//! The pipeline decodes the source once, applies every requested step to
//! the decoded pixels and encodes once, in the format the source was decoded
//! as. Output is deterministic: the same bytes and [`Transform`] always
//! produce the same encoded result.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use crate::error::ImageError;

use super::format::ImageFormat;
use super::orientation::Rotation;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Largest decoded buffer a resize may allocate, in bytes.
///
/// Same bound the `image` decoder applies by default (`Limits::max_alloc`).
pub const MAX_OUTPUT_BYTES: u64 = 512 * 1024 * 1024;

// =============================================================================
// Transform
// =============================================================================

/// The geometry requested for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transform {
    /// Target width in pixels (0 = keep original size)
    pub width: u32,

    /// Center-crop to a square after resizing
    pub crop: bool,
}

impl Transform {
    pub fn new(width: u32, crop: bool) -> Self {
        Self { width, crop }
    }

    /// Whether the variant is the original itself.
    pub fn is_identity(&self) -> bool {
        self.width == 0 && !self.crop
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Runs a [`Transform`] over encoded image bytes.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    jpeg_quality: u8,
}

impl TransformPipeline {
    /// Create a pipeline encoding JPEG at the default quality.
    pub fn new() -> Self {
        Self::with_quality(DEFAULT_JPEG_QUALITY)
    }

    /// Create a pipeline encoding JPEG at `quality`, clamped to 1-100.
    pub fn with_quality(quality: u8) -> Self {
        Self {
            jpeg_quality: quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Apply `transform` to `source` and return the encoded result.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source is not JPEG or PNG
    /// - Decoding fails
    /// - The resized image would exceed [`MAX_OUTPUT_BYTES`]
    /// - Encoding fails
    pub fn apply(&self, source: &[u8], transform: Transform) -> Result<Bytes, ImageError> {
        let (img, format) = decode(source)?;
        let mut img = Rotation::read(source).apply(img);

        if transform.width != 0 {
            img = resize(&img, transform.width)?;
        }

        if transform.crop {
            img = center_crop(&img);
        }

        encode(&img, format, self.jpeg_quality)
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Steps
// =============================================================================

/// Decode `source`, rejecting formats that cannot be re-encoded.
pub fn decode(source: &[u8]) -> Result<(DynamicImage, ImageFormat), ImageError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode {
            message: e.to_string(),
        })?;

    let format = reader
        .format()
        .map(ImageFormat::from)
        .unwrap_or(ImageFormat::Unsupported);

    if !format.is_encodable() {
        return Err(ImageError::UnsupportedFormat { format });
    }

    let img = reader.decode().map_err(|e| ImageError::Decode {
        message: e.to_string(),
    })?;

    Ok((img, format))
}

/// Scale to `width`, keeping the aspect ratio.
///
/// The height is truncated toward zero but never drops below one pixel.
///
/// # Errors
///
/// Returns [`ImageError::TooLarge`] when the output buffer would exceed
/// [`MAX_OUTPUT_BYTES`]. Upscaling a tall, narrow source can get there with
/// a small `width`.
pub fn resize(img: &DynamicImage, width: u32) -> Result<DynamicImage, ImageError> {
    if img.width() == 0 {
        return Ok(img.clone());
    }

    let factor = width as f64 / img.width() as f64;
    let height = ((img.height() as f64 * factor) as u64).max(1);

    let bytes_per_pixel = u64::from(img.color().bytes_per_pixel());
    let output_bytes = u64::from(width)
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(bytes_per_pixel));

    let height = match (u32::try_from(height), output_bytes) {
        (Ok(height), Some(bytes)) if bytes <= MAX_OUTPUT_BYTES => height,
        _ => return Err(ImageError::TooLarge { width, height }),
    };

    Ok(img.resize_exact(width, height, FilterType::Triangle))
}

/// Cut the largest centered square.
pub fn center_crop(img: &DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let side = width.min(height);

    let x = (width - side) / 2;
    let y = (height - side) / 2;

    img.crop_imm(x, y, side, side)
}

/// Encode `img` as `format`.
pub fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Bytes, ImageError> {
    let mut output = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            // The JPEG encoder has no alpha channel
            let rgb = img.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
            encoder
                .encode_image(&rgb)
                .map_err(|e| ImageError::Encode {
                    message: e.to_string(),
                })?;
        }
        ImageFormat::Png => {
            img.write_with_encoder(PngEncoder::new(&mut output))
                .map_err(|e| ImageError::Encode {
                    message: e.to_string(),
                })?;
        }
        ImageFormat::Gif | ImageFormat::Unsupported => {
            return Err(ImageError::UnsupportedFormat { format });
        }
    }

    Ok(Bytes::from(output))
}

// =============================================================================
// Tests
// =============================================================================

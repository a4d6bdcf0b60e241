//! Image format tags.
//!
//! Every branch on format (GIF passthrough, output encoder selection, the
//! response `Content-Type`) goes through [`ImageFormat`], so adding a format
//! means the compiler points at every place that has to handle it.

use std::fmt;

/// The formats this server distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// JPEG (decoded, transformed, re-encoded)
    Jpeg,

    /// PNG (decoded, transformed, re-encoded)
    Png,

    /// GIF (always passed through untouched)
    Gif,

    /// Anything else
    Unsupported,
}

impl ImageFormat {
    /// Map a `Content-Type` header value to a format.
    ///
    /// Parameters such as `; charset=binary` are ignored and the comparison
    /// is case-insensitive.
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => ImageFormat::Jpeg,
            "image/png" => ImageFormat::Png,
            "image/gif" => ImageFormat::Gif,
            _ => ImageFormat::Unsupported,
        }
    }

    /// Identify the format of encoded bytes from their magic number.
    pub fn sniff(data: &[u8]) -> Self {
        image::guess_format(data)
            .map(ImageFormat::from)
            .unwrap_or(ImageFormat::Unsupported)
    }

    /// The MIME type to serve this format with.
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Unsupported => "application/octet-stream",
        }
    }

    /// Whether the transform pipeline can re-encode this format.
    pub fn is_encodable(&self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::Png)
    }
}

impl From<image::ImageFormat> for ImageFormat {
    fn from(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Jpeg => ImageFormat::Jpeg,
            image::ImageFormat::Png => ImageFormat::Png,
            image::ImageFormat::Gif => ImageFormat::Gif,
            _ => ImageFormat::Unsupported,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

//! Cache key for image variants.
//!
//! A [`CacheKey`] names one variant: an original at a given width, cropped or
//! not. The upstream cache, the persisted variant in the store and the
//! write-back all address the variant by this key, so two equal keys must
//! always produce byte-identical output.

use std::fmt;
use std::sync::Arc;

use crate::transform::Transform;

/// Raw request parameters, before validation.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    /// Storage bucket holding the original
    pub bucket: String,

    /// Object key of the original within the bucket
    pub image_id: String,

    /// Requested width as sent by the client (`s` query parameter)
    pub width: Option<String>,

    /// Crop flag as sent by the client (`c` query parameter)
    pub crop: Option<String>,
}

impl RequestParams {
    pub fn new(bucket: impl Into<String>, image_id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            image_id: image_id.into(),
            width: None,
            crop: None,
        }
    }

    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn with_crop(mut self, crop: impl Into<String>) -> Self {
        self.crop = Some(crop.into());
        self
    }
}

/// Identifies one image variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Storage bucket
    pub bucket: Arc<str>,

    /// Object key of the original
    pub image_id: Arc<str>,

    /// Target width in pixels (0 = no resize)
    pub width: u32,

    /// Center-crop to a square after resizing
    pub crop: bool,
}

impl CacheKey {
    /// Create a cache key from already validated values.
    pub fn new(
        bucket: impl Into<Arc<str>>,
        image_id: impl Into<Arc<str>>,
        width: u32,
        crop: bool,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            image_id: image_id.into(),
            width,
            crop,
        }
    }

    /// Build a key from request parameters.
    ///
    /// Never fails: a missing, negative or non-numeric width means "no
    /// resize", widths above `max_width` are clamped to it, and crop is set
    /// only when the flag is `"true"` in any letter case.
    pub fn from_params(params: &RequestParams, max_width: u32) -> Self {
        Self::new(
            params.bucket.as_str(),
            params.image_id.as_str(),
            parse_width(params.width.as_deref(), max_width),
            parse_crop(params.crop.as_deref()),
        )
    }

    /// Object name of the persisted variant, in the original's bucket.
    ///
    /// `photos/cat.jpg` at width 200 with crop becomes `photos/cat.jpg_w200_c`.
    pub fn modified_object_key(&self) -> String {
        let crop = if self.crop { "_c" } else { "" };
        format!("{}_w{}{}", self.image_id, self.width, crop)
    }

    /// The geometry this key asks for.
    pub fn transform(&self) -> Transform {
        Transform::new(self.width, self.crop)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}?s={}&c={}",
            self.bucket, self.image_id, self.width, self.crop
        )
    }
}

fn parse_width(raw: Option<&str>, max_width: u32) -> u32 {
    let parsed = raw.and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);
    parsed.clamp(0, max_width as i64) as u32
}

fn parse_crop(raw: Option<&str>) -> bool {
    raw.map(|s| s.eq_ignore_ascii_case("true")).unwrap_or(false)
}

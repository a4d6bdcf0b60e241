//! Image transform pipeline.
//!
//! Pure functions over image bytes: nothing in this module touches the store
//! or the cache.
//!
//! ```text
//! encoded bytes
//!      │
//!      ▼
//! ┌──────────┐   ┌─────────────┐   ┌──────────┐   ┌─────────────┐   ┌──────────┐
//! │  decode  │──▶│   orient    │──▶│  resize  │──▶│ center-crop │──▶│  encode  │
//! │ JPEG/PNG │   │ (EXIF tag)  │   │ width≠0  │   │  crop=true  │   │ same fmt │
//! └──────────┘   └─────────────┘   └──────────┘   └─────────────┘   └──────────┘
//! ```
//!
//! # Components
//!
//! - [`ImageFormat`]: Closed set of formats the server distinguishes
//! - [`Rotation`]: EXIF orientation correction
//! - [`Transform`]: Requested width and crop flag
//! - [`TransformPipeline`]: Runs a transform over encoded bytes

mod format;
mod orientation;
mod pipeline;

pub use format::ImageFormat;
pub use orientation::Rotation;
pub use pipeline::{
    center_crop, decode, encode, resize, Transform, TransformPipeline, DEFAULT_JPEG_QUALITY,
    MAX_JPEG_QUALITY, MAX_OUTPUT_BYTES, MIN_JPEG_QUALITY,
};

//! EXIF orientation correction.
//!
//! Cameras store pixels in sensor order and record how the picture should be
//! turned in the EXIF `Orientation` tag. Only the pure rotations are honored:
//!
//! | Tag | Rotation (counter-clockwise) |
//! |-----|------------------------------|
//! | 3   | 180°                         |
//! | 6   | 270°                         |
//! | 8   | 90°                          |
//!
//! Mirrored orientations, unknown values and missing or malformed EXIF data
//! all mean "leave the image as is".

use std::io::Cursor;

use image::DynamicImage;

/// Rotation needed to display an image upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Ccw90,
    Ccw180,
    Ccw270,
}

impl Rotation {
    /// Map an EXIF `Orientation` value to a rotation.
    pub fn from_exif_orientation(value: u32) -> Self {
        match value {
            6 => Rotation::Ccw270,
            3 => Rotation::Ccw180,
            8 => Rotation::Ccw90,
            _ => Rotation::None,
        }
    }

    /// Read the rotation from the EXIF block of encoded image bytes.
    pub fn read(data: &[u8]) -> Self {
        let mut cursor = Cursor::new(data);
        let Ok(exif) = exif::Reader::new().read_from_container(&mut cursor) else {
            return Rotation::None;
        };

        exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Rotation::from_exif_orientation)
            .unwrap_or_default()
    }

    /// Rotate a decoded image.
    ///
    /// `image` rotates clockwise, so counter-clockwise 270° is its `rotate90`.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Rotation::None => img,
            Rotation::Ccw90 => img.rotate270(),
            Rotation::Ccw180 => img.rotate180(),
            Rotation::Ccw270 => img.rotate90(),
        }
    }

    /// Whether the rotation swaps width and height.
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Rotation::Ccw90 | Rotation::Ccw270)
    }
}

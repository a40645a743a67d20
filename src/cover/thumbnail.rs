//! Cover thumbnails for reports.

use image::{ImageFormat, ImageReader, imageops::FilterType};
use std::io::Cursor;

use super::{CoverError, Thumbnail, ThumbnailRenderer};
use crate::config::ThumbnailConfig;

/// [`ThumbnailRenderer`] built on the `image` crate.
///
/// Pictures are checked against size limits before decoding, scaled down
/// to fit a square box (never up) and re-encoded as PNG.
#[derive(Debug, Clone)]
pub struct ImageThumbnailer {
    size: u32,
    max_dimension: u32,
    max_image_bytes: usize,
}

impl ImageThumbnailer {
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            size: config.size.max(1),
            max_dimension: config.max_dimension,
            max_image_bytes: config.max_image_bytes,
        }
    }
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self::new(&ThumbnailConfig::default())
    }
}

impl ThumbnailRenderer for ImageThumbnailer {
    fn render(&self, picture: &[u8]) -> Result<Thumbnail, CoverError> {
        if picture.len() > self.max_image_bytes {
            return Err(CoverError::TooLarge {
                size: picture.len(),
                limit: self.max_image_bytes,
            });
        }

        // Header-only read, so oversized pictures are rejected before decoding
        let (width, height) = ImageReader::new(Cursor::new(picture))
            .with_guessed_format()?
            .into_dimensions()?;
        if width > self.max_dimension || height > self.max_dimension {
            return Err(CoverError::Dimensions {
                width,
                height,
                limit: self.max_dimension,
            });
        }

        let mut image = image::load_from_memory(picture)?;
        if width > self.size || height > self.size {
            image = image.resize(self.size, self.size, FilterType::Triangle);
        }

        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        Ok(Thumbnail {
            width: image.width(),
            height: image.height(),
            png,
        })
    }
}

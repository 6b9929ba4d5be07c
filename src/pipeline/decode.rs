//! Decode extracted page content into a `DynamicImage`.

use crate::document::PageContent;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("pixel buffer of {len} bytes does not match a {width}x{height} RGBA image")]
    BufferMismatch { width: u32, height: u32, len: usize },

    #[error("extracted page is empty")]
    Empty,

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Turn extracted page content into an owned raster image.
pub fn decode_page(content: PageContent) -> Result<DynamicImage, DecodeError> {
    if content.is_empty() {
        return Err(DecodeError::Empty);
    }

    match content {
        PageContent::Rgba {
            width,
            height,
            pixels,
        } => {
            let len = pixels.len();
            RgbaImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgba8)
                .ok_or(DecodeError::BufferMismatch { width, height, len })
        }
        PageContent::Encoded(bytes) => Ok(image::load_from_memory(&bytes)?),
    }
}

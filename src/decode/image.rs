//! Raster image decoding.
//!
//! The original bytes are kept as the full image; only the thumbnail is
//! re-encoded.

use image::imageops::FilterType;
use tracing::warn;

use super::raster::{encode_jpeg, flatten_onto_white};
use crate::constants::{decode, quality};
use crate::error::{Error, Result};
use crate::geometry::{fit_centered, Size, THUMBNAIL_BOUNDS};
use crate::model::Slide;
use crate::types::{Dimensions, EncodedImage, SourceKind};

/// Native size of an image, substituting 800x600 when either side is zero.
pub fn native_dimensions(width: u32, height: u32) -> Dimensions {
    if width == 0 || height == 0 {
        Dimensions::native(decode::FALLBACK_IMAGE_WIDTH, decode::FALLBACK_IMAGE_HEIGHT)
    } else {
        Dimensions::native(f64::from(width), f64::from(height))
    }
}

/// Decode one raster image into a single slide. Never fails; an undecodable
/// image becomes a placeholder carrying the fallback dimensions.
pub fn decode_image(file_name: &str, bytes: Vec<u8>, mime: &str) -> Slide {
    match build_slide(file_name, bytes, mime) {
        Ok(slide) => slide,
        Err(e) => {
            warn!("{e}");
            fallback(file_name)
        }
    }
}

/// Placeholder used when an image cannot be read or decoded.
pub fn fallback(file_name: &str) -> Slide {
    Slide::placeholder(file_name, SourceKind::RasterImage, 0).with_dimensions(native_dimensions(0, 0))
}

fn build_slide(file_name: &str, bytes: Vec<u8>, mime: &str) -> Result<Slide> {
    let decoded = image::load_from_memory(&bytes).map_err(|e| Error::image(file_name, e.to_string()))?;
    let dimensions = native_dimensions(decoded.width(), decoded.height());

    let thumb = fit_centered(THUMBNAIL_BOUNDS, Size::new(dimensions.width, dimensions.height)).size();
    let (thumb_w, thumb_h) = thumb.to_pixels();
    let resized = decoded.resize_exact(thumb_w, thumb_h, FilterType::Triangle);
    let thumbnail = encode_jpeg(&flatten_onto_white(&resized), quality::IMAGE_THUMBNAIL)
        .map_err(|e| Error::image(file_name, e.to_string()))?;

    Ok(Slide::new(
        file_name,
        SourceKind::RasterImage,
        0,
        thumbnail,
        EncodedImage::new(mime, bytes),
        dimensions,
    ))
}

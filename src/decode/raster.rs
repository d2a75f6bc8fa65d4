//! Raster surface helpers shared by the decoders.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult, Rgba, RgbaImage};

use crate::geometry::Size;
use crate::types::EncodedImage;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A surface of `size` (truncated to whole pixels) filled with white.
pub fn white_surface(size: Size) -> RgbaImage {
    let (width, height) = size.to_pixels();
    RgbaImage::from_pixel(width, height, WHITE)
}

/// Draw `image` onto a white surface of the same size, dropping transparency.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbaImage {
    let mut surface = RgbaImage::from_pixel(image.width().max(1), image.height().max(1), WHITE);
    image::imageops::overlay(&mut surface, &image.to_rgba8(), 0, 0);
    surface
}

/// Encode a surface as JPEG.
pub fn encode_jpeg(surface: &RgbaImage, quality: u8) -> ImageResult<EncodedImage> {
    let rgb = DynamicImage::ImageRgba8(surface.clone()).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&rgb)?;
    Ok(EncodedImage::jpeg(bytes))
}

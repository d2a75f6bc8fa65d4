//! The fallback bitmap shown when a page or image cannot be extracted.
//!
//! Placeholder detection is an exact byte comparison against this one
//! bitmap; a visually similar image does not qualify.

use crate::types::EncodedImage;

/// MIME type of the placeholder bitmap.
pub const MIME: &str = "image/png";

/// A 1x1 PNG.
pub const BYTES: [u8; 70] = [
    137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0,
    0, 0, 31, 21, 196, 137, 0, 0, 0, 13, 73, 68, 65, 84, 120, 218, 99, 252, 207, 192, 240, 31, 0, 5,
    5, 2, 0, 95, 200, 241, 210, 0, 0, 0, 0, 73, 69, 78, 68, 174, 66, 96, 130,
];

/// A fresh copy of the placeholder bitmap.
pub fn image() -> EncodedImage {
    EncodedImage::new(MIME, BYTES.to_vec())
}

/// Whether `image` is the placeholder bitmap.
pub fn is_placeholder(image: &EncodedImage) -> bool {
    image.bytes == BYTES
}

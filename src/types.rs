//! Core type definitions for compile-time safety.
//!
//! This module provides newtype wrappers around string identifiers to prevent
//! accidental mixing of slide and group IDs, plus the small value types shared
//! by the decoders, the assembly engine and the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What kind of source a slide was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// One page of a paginated document (PDF).
    PaginatedPage,
    /// A standalone raster image.
    RasterImage,
}

impl SourceKind {
    /// Returns the human-readable name of this source kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PaginatedPage => "document",
            Self::RasterImage => "image",
        }
    }

    /// Whether slides of this kind carry a meaningful page number.
    #[must_use]
    pub const fn is_paginated(self) -> bool {
        matches!(self, Self::PaginatedPage)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Slide identifier, unique across the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlideId(pub String);

impl SlideId {
    /// Generate a fresh, never reused identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a new `SlideId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SlideId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SlideId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Presentation group identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl GroupId {
    /// Generate a fresh, never reused identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a new `GroupId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for GroupId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Native size of the source content and the size actually rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Native width (points for pages, pixels for images).
    pub width: f64,
    /// Native height.
    pub height: f64,
    /// Width of the full-resolution rendering.
    pub scaled_width: f64,
    /// Height of the full-resolution rendering.
    pub scaled_height: f64,
}

impl Dimensions {
    /// Dimensions of content stored at its native size.
    #[must_use]
    pub const fn native(width: f64, height: f64) -> Self {
        Self { width, height, scaled_width: width, scaled_height: height }
    }
}

/// An encoded image (JPEG, PNG, ...) together with its MIME type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// MIME type such as `image/jpeg`.
    pub mime: String,
    /// Encoded bytes.
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// Wrap already-encoded bytes.
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { mime: mime.into(), bytes }
    }

    /// JPEG bytes.
    #[must_use]
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new("image/jpeg", bytes)
    }

    /// File extension matching the MIME type, used for package part names.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "jpeg",
        }
    }

    /// Size of the encoded data in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether there is no encoded data.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Image payloads are large; keep debug output readable.
impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// MIME type for a raster image file extension.
#[must_use]
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}

mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        base64::decode(encoded).map_err(serde::de::Error::custom)
    }
}

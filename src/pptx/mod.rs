//! Presentation-writer collaborator and its .pptx implementation.
//!
//! The assembler only talks to [`PresentationWriter`] and
//! [`PresentationPage`]; coordinates are in inches on the slide canvas.

mod package;
mod parts;
mod templates;

pub use package::{PptxPage, PptxWriter};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::geometry::{Placement, Size};
use crate::types::EncodedImage;

/// Errors raised while building or serializing a presentation
#[derive(Debug, Error)]
pub enum WriterError {
    /// Archive could not be written
    #[error("Failed to write presentation archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Underlying write failed
    #[error("Failed to write presentation part: {0}")]
    Io(#[from] std::io::Error),

    /// Part markup could not be produced
    #[error("Failed to build presentation part {part}: {message}")]
    Part {
        /// Package part name.
        part: String,
        /// What went wrong.
        message: String,
    },

    /// An image with no data was placed
    #[error("Cannot place an empty {mime} image")]
    EmptyImage {
        /// MIME type of the rejected image.
        mime: String,
    },
}

impl WriterError {
    /// Create a part error
    pub fn part(part: impl Into<String>, message: impl ToString) -> Self {
        Self::Part { part: part.into(), message: message.to_string() }
    }
}

/// A 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Pure white.
    pub const WHITE: Self = Self(0xFF, 0xFF, 0xFF);

    /// Parse `RRGGBB` (an optional leading `#` is accepted).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self(channel(0)?, channel(2)?, channel(4)?))
    }

    /// `RRGGBB`, upper case.
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    /// Flush left.
    #[default]
    Left,
    /// Centred.
    Center,
    /// Flush right.
    Right,
}

/// How a text box is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font family.
    pub font: String,
    /// Size in points.
    pub size_pt: f64,
    /// Text colour.
    pub color: Rgb,
    /// Horizontal alignment.
    pub align: Align,
}

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentProperties {
    /// Document title.
    pub title: String,
    /// Author and last editor.
    pub author: String,
    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Default for DocumentProperties {
    fn default() -> Self {
        Self { title: String::new(), author: String::new(), created: Utc::now() }
    }
}

/// Builds a presentation page by page, then serializes it.
pub trait PresentationWriter {
    /// Page type handed out by [`PresentationWriter::add_page`].
    type Page: PresentationPage;

    /// Set the slide size in inches.
    fn set_layout(&mut self, size: Size);

    /// Set title, author and timestamps.
    fn set_properties(&mut self, properties: DocumentProperties);

    /// Append a blank page and return it for filling.
    fn add_page(&mut self) -> &mut Self::Page;

    /// Produce the finished file.
    fn serialize(self) -> Result<Vec<u8>, WriterError>
    where
        Self: Sized;
}

/// One output page.
pub trait PresentationPage {
    /// Fill the page background with a solid colour.
    fn set_background(&mut self, color: Rgb);

    /// Place an encoded image in the given box.
    fn place_image(&mut self, image: &EncodedImage, at: Placement) -> Result<(), WriterError>;

    /// Place a text box.
    fn place_text(&mut self, text: &str, at: Placement, style: &TextStyle);

    /// Append to the page's speaker notes.
    fn add_annotation(&mut self, text: &str);
}

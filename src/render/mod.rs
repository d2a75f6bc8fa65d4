//! Rendering-engine collaborator.
//!
//! A paginated document is opened from its bytes, asked for its page count,
//! and rendered one page at a time onto a caller-supplied RGBA surface.
//! Dropping a [`DocumentPage`] releases that page's render resources, so the
//! decoder holds at most one page at a time.
//!
//! Engines are driven from a single task, so the traits do not require
//! `Send`. Their futures must not block the calling thread: the decoder
//! races `open` against a deadline, which only works if `open` yields.
//! Engines built on a blocking native library run it on a
//! [`worker::WorkerEngine`] thread.

#[cfg(feature = "pdf")]
pub mod pdfium;
pub mod worker;

use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use thiserror::Error;

use crate::geometry::Size;

/// Errors reported by a rendering engine
#[derive(Debug, Error)]
pub enum RenderError {
    /// The engine could not be loaded
    #[error("Rendering engine unavailable: {0}")]
    Unavailable(String),

    /// The document bytes could not be parsed
    #[error("Failed to open document: {0}")]
    Open(String),

    /// Opening the document took longer than the configured deadline
    #[error("Document loading timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    /// A page could not be loaded or drawn
    #[error("Failed to render page {page}: {message}")]
    Page {
        /// Zero-based page index.
        page: usize,
        /// Engine-provided description.
        message: String,
    },
}

impl RenderError {
    /// Create a page error
    pub fn page(page: usize, message: impl Into<String>) -> Self {
        Self::Page { page, message: message.into() }
    }
}

/// Opens paginated documents.
#[async_trait(?Send)]
pub trait RenderEngine {
    /// Engine name (for logs).
    fn name(&self) -> &str;

    /// Parse a document. May suspend; the caller races it against a deadline.
    async fn open<'a>(&'a self, bytes: Vec<u8>) -> Result<Box<dyn RenderedDocument + 'a>, RenderError>;
}

/// An opened paginated document.
#[async_trait(?Send)]
pub trait RenderedDocument {
    /// Total number of pages.
    fn page_count(&self) -> usize;

    /// Load one page by zero-based index.
    async fn page<'p>(&'p self, index: usize) -> Result<Box<dyn DocumentPage + 'p>, RenderError>;
}

/// One loaded page. Dropping it releases its render resources.
#[async_trait(?Send)]
pub trait DocumentPage {
    /// Size of the page at scale 1.0.
    fn native_size(&self) -> Size;

    /// Draw the page at `scale` onto `surface`, which the caller has sized to
    /// the scaled page and may have pre-filled with a background.
    async fn render(&self, surface: &mut RgbaImage, scale: f64) -> Result<(), RenderError>;
}

//! `slidemerge` - extract slides from documents and images and merge them
//! into one presentation.
//!
//! Paginated documents and raster images are decoded into [`model::Slide`]s
//! (optionally grouped per source file), curated by toggling selection flags,
//! persisted in an embedded library, and assembled into a `.pptx` file.

// Re-export public modules for use in integration tests and as a library
pub mod assembly;
pub mod capabilities;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod geometry;
pub mod model;
pub mod pptx;
pub mod progress;
pub mod render;
pub mod store;
pub mod types;

pub use error::{Error, Result};

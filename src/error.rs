//! Application error types.
//!
//! Provides unified error handling with actionable context for debugging.

use thiserror::Error;

use crate::pptx::WriterError;
use crate::render::RenderError;
use crate::store::StoreError;

/// Application result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types with specific context for actionable debugging
#[derive(Debug, Error)]
pub enum Error {
    /// IO error with path context
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// The underlying IO error.
        source: std::io::Error,
        /// File path where the error occurred, if known.
        path: Option<std::path::PathBuf>,
    },

    /// Configuration error with guidance
    #[error("Configuration error: {message}. {hint}")]
    Config {
        /// Description of the configuration problem.
        message: String,
        /// Actionable guidance for fixing the issue.
        hint: &'static str,
    },

    /// Raster image could not be decoded or encoded
    #[error("Image error in {file}: {message}")]
    Image {
        /// Source file the image came from.
        file: String,
        /// Description of the failure.
        message: String,
    },

    /// Rendering engine failure
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Presentation writer failure
    #[error(transparent)]
    Writer(#[from] WriterError),

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The assembled artifact was empty and cannot be delivered
    #[error("Nothing to save: the merged presentation is empty")]
    EmptyArtifact,
}

impl Error {
    /// Create an IO error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<std::path::PathBuf>>) -> Self {
        Self::Io { source, path: path.into() }
    }

    /// Create a config error with actionable hint
    pub fn config(message: impl Into<String>, hint: &'static str) -> Self {
        Self::Config { message: message.into(), hint }
    }

    /// Create an image error for a source file
    pub fn image(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Image { file: file.into(), message: message.into() }
    }
}

//! What the host environment can do, decided once at startup.
//!
//! Components receive a [`Capabilities`] descriptor instead of probing the
//! environment themselves. Each optional collaborator is either available or
//! carries the reason it is not, and callers branch on that.

use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::render::RenderEngine;

/// An optional collaborator.
#[derive(Debug, Clone)]
pub enum Capability<T> {
    /// Ready to use.
    Available(T),
    /// Missing, with a human-readable reason.
    Unavailable {
        /// Why the collaborator cannot be used.
        reason: String,
    },
}

impl<T> Capability<T> {
    /// Build the unavailable variant.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }

    /// Whether the collaborator is available.
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Why the collaborator is unavailable, if it is.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

/// Output formats the assembly engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterKind {
    /// Office Open XML presentation (.pptx).
    Pptx,
}

/// Capability descriptor handed to the processor and the assembler.
#[derive(Clone)]
pub struct Capabilities {
    /// Reading input files and raster surfaces.
    pub files: Capability<()>,
    /// Paginated-document renderer.
    pub renderer: Capability<Rc<dyn RenderEngine>>,
    /// Presentation writer.
    pub writer: Capability<WriterKind>,
}

impl Capabilities {
    /// Probe the environment once.
    pub fn detect(config: &Config) -> Self {
        Self {
            files: Capability::Available(()),
            renderer: detect_renderer(config),
            writer: Capability::Available(WriterKind::Pptx),
        }
    }

    /// An environment without file, raster or writer primitives. Every entry
    /// point returns an empty result.
    pub fn headless() -> Self {
        let reason = "no file or raster primitives in this environment";
        Self {
            files: Capability::unavailable(reason),
            renderer: Capability::unavailable(reason),
            writer: Capability::unavailable(reason),
        }
    }

    /// Files and writer available, documents degrade to placeholders.
    pub fn without_renderer(reason: impl Into<String>) -> Self {
        Self {
            files: Capability::Available(()),
            renderer: Capability::unavailable(reason),
            writer: Capability::Available(WriterKind::Pptx),
        }
    }

    /// Files and writer available, documents rendered by `engine`.
    pub fn with_renderer(engine: Rc<dyn RenderEngine>) -> Self {
        Self {
            files: Capability::Available(()),
            renderer: Capability::Available(engine),
            writer: Capability::Available(WriterKind::Pptx),
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let renderer = match &self.renderer {
            Capability::Available(engine) => engine.name().to_string(),
            Capability::Unavailable { reason } => format!("unavailable ({reason})"),
        };
        f.debug_struct("Capabilities")
            .field("files", &self.files.is_available())
            .field("renderer", &renderer)
            .field("writer", &self.writer)
            .finish()
    }
}

#[cfg(feature = "pdf")]
fn detect_renderer(config: &Config) -> Capability<Rc<dyn RenderEngine>> {
    match crate::render::pdfium::engine(config.pdfium_library_path.as_deref()) {
        Ok(engine) => {
            tracing::info!("PDF rendering via pdfium");
            let engine: Rc<dyn RenderEngine> = Rc::new(engine);
            Capability::Available(engine)
        }
        Err(e) => {
            tracing::warn!("PDF rendering disabled: {e}");
            Capability::unavailable(e.to_string())
        }
    }
}

#[cfg(not(feature = "pdf"))]
fn detect_renderer(_config: &Config) -> Capability<Rc<dyn RenderEngine>> {
    Capability::unavailable("built without the `pdf` feature")
}

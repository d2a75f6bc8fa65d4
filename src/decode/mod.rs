//! Input decoding: turns user files into slides and presentation groups.
//!
//! Files are routed by extension and processed one at a time, so output order
//! always matches input order and page order within a file. Decoders build
//! their results locally; the processor appends them once each file is done.

pub mod document;
pub mod image;
pub mod placeholder;
pub mod raster;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::capabilities::{Capabilities, Capability};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{PresentationGroup, Slide};
use crate::progress::{NoopObserver, ProgressObserver};
use crate::types::{mime_for_extension, SourceKind};

use self::document::DocumentDecoder;

/// Extraction policy taken from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Pages processed per document.
    pub max_pages: usize,
    /// Deadline for opening a document.
    pub open_timeout: Duration,
    /// Placeholders emitted for a document that cannot be opened.
    pub placeholder_pages: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for DecodeOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_pages: config.max_pages,
            open_timeout: config.open_timeout,
            placeholder_pages: config.placeholder_pages,
        }
    }
}

/// How a file is handled, decided from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// Paginated document (PDF).
    Document,
    /// Raster or vector image.
    Image,
    /// Legacy slide deck; recognised but not parsed.
    LegacyDeck,
    /// Anything else.
    Unsupported,
}

impl FileClass {
    /// Classify a file name by its extension (case-insensitive).
    pub fn of(file_name: &str) -> Self {
        match extension(file_name).as_deref() {
            Some("pdf") => Self::Document,
            Some("jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg") => Self::Image,
            Some("ppt" | "pptx") => Self::LegacyDeck,
            _ => Self::Unsupported,
        }
    }

    /// Slide kind produced by this class, if it produces any.
    pub const fn kind(self) -> Option<SourceKind> {
        match self {
            Self::Document => Some(SourceKind::PaginatedPage),
            Self::Image => Some(SourceKind::RasterImage),
            Self::LegacyDeck | Self::Unsupported => None,
        }
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

#[derive(Debug, Clone)]
enum FileContent {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A user-supplied file, on disk or already in memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    name: String,
    content: FileContent,
}

impl InputFile {
    /// A file on disk; its name is the final path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy().to_string(), |n| n.to_string_lossy().to_string());
        Self { name, content: FileContent::Path(path) }
    }

    /// An in-memory file.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), content: FileContent::Bytes(bytes) }
    }

    /// Display name, used as the slides' source file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How this file will be handled.
    pub fn class(&self) -> FileClass {
        FileClass::of(&self.name)
    }

    /// Load the file's bytes.
    pub async fn read(&self) -> Result<Vec<u8>> {
        match &self.content {
            FileContent::Bytes(bytes) => Ok(bytes.clone()),
            FileContent::Path(path) => tokio::fs::read(path).await.map_err(|e| Error::io(e, path.clone())),
        }
    }
}

/// Routes files to the document and image decoders.
pub struct Processor {
    options: DecodeOptions,
    capabilities: Capabilities,
    observer: Box<dyn ProgressObserver>,
}

impl Processor {
    /// Create a processor that reports to `observer`.
    pub const fn new(options: DecodeOptions, capabilities: Capabilities, observer: Box<dyn ProgressObserver>) -> Self {
        Self { options, capabilities, observer }
    }

    /// Create a processor that discards progress notifications.
    pub fn silent(options: DecodeOptions, capabilities: Capabilities) -> Self {
        Self::new(options, capabilities, Box::new(NoopObserver))
    }

    /// Decode every file into one flat, ordered slide list.
    pub async fn process_files(&self, files: &[InputFile]) -> Vec<Slide> {
        if !self.ready() {
            return Vec::new();
        }

        let mut slides = Vec::new();
        for file in files {
            slides.extend(self.process_file(file).await);
        }
        info!("Processed {} files into {} slides", files.len(), slides.len());
        slides
    }

    /// Decode every file into one group per file. Files that yield no slides
    /// produce no group.
    pub async fn process_files_as_groups(&self, files: &[InputFile]) -> Vec<PresentationGroup> {
        if !self.ready() {
            return Vec::new();
        }

        let mut groups = Vec::new();
        for file in files {
            let Some(kind) = file.class().kind() else {
                skip(file);
                continue;
            };
            let slides = self.process_file(file).await;
            match PresentationGroup::from_slides(file.name(), kind, slides) {
                Some(group) => groups.push(group),
                None => warn!("{} produced no slides, skipping", file.name()),
            }
        }
        info!("Processed {} files into {} groups", files.len(), groups.len());
        groups
    }

    fn ready(&self) -> bool {
        if let Some(reason) = self.capabilities.files.reason() {
            warn!("Cannot process files: {reason}");
            return false;
        }
        true
    }

    async fn process_file(&self, file: &InputFile) -> Vec<Slide> {
        match file.class() {
            FileClass::Document => {
                let engine = match &self.capabilities.renderer {
                    Capability::Available(engine) => Ok(engine.as_ref()),
                    Capability::Unavailable { reason } => Err(reason.as_str()),
                };
                let decoder = DocumentDecoder::new(engine, &self.options, self.observer.as_ref());
                match file.read().await {
                    Ok(bytes) => decoder.decode(file.name(), bytes).await,
                    Err(e) => decoder.fail(file.name(), &e),
                }
            }
            FileClass::Image => {
                let mime = extension(file.name()).map_or("image/jpeg", |ext| mime_for_extension(&ext));
                match file.read().await {
                    Ok(bytes) => vec![image::decode_image(file.name(), bytes, mime)],
                    Err(e) => {
                        warn!("Could not read {}: {e}", file.name());
                        vec![image::fallback(file.name())]
                    }
                }
            }
            FileClass::LegacyDeck | FileClass::Unsupported => {
                skip(file);
                Vec::new()
            }
        }
    }
}

fn skip(file: &InputFile) {
    match file.class() {
        FileClass::LegacyDeck => warn!("{}: slide deck import is not supported yet, skipping", file.name()),
        _ => warn!("{}: unsupported file type, skipping", file.name()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(FileClass::of("Deck.PDF"), FileClass::Document);
        assert_eq!(FileClass::of("photo.jpeg"), FileClass::Image);
        assert_eq!(FileClass::of("logo.svg"), FileClass::Image);
        assert_eq!(FileClass::of("old.ppt"), FileClass::LegacyDeck);
        assert_eq!(FileClass::of("notes.txt"), FileClass::Unsupported);
        assert_eq!(FileClass::of("README"), FileClass::Unsupported);
    }

    #[test]
    fn options_follow_config() {
        let mut config = Config::default();
        config.max_pages = 3;
        let options = DecodeOptions::from(&config);
        assert_eq!(options.max_pages, 3);
        assert_eq!(options.placeholder_pages, 5);
    }

    #[test]
    fn name_comes_from_path() {
        let file = InputFile::from_path("/tmp/slides/deck.pdf");
        assert_eq!(file.name(), "deck.pdf");
    }

    #[tokio::test]
    async fn headless_processing_is_empty() {
        let processor = Processor::silent(DecodeOptions::default(), Capabilities::headless());
        let files = [InputFile::from_bytes("a.png", vec![1, 2, 3])];
        assert!(processor.process_files(&files).await.is_empty());
        assert!(processor.process_files_as_groups(&files).await.is_empty());
    }

    #[tokio::test]
    async fn unsupported_files_are_skipped() {
        let processor = Processor::silent(DecodeOptions::default(), Capabilities::without_renderer("test"));
        let files = [
            InputFile::from_bytes("old.pptx", vec![0; 4]),
            InputFile::from_bytes("notes.txt", vec![0; 4]),
        ];
        assert!(processor.process_files(&files).await.is_empty());
        assert!(processor.process_files_as_groups(&files).await.is_empty());
    }

    #[tokio::test]
    async fn document_without_renderer_degrades_to_placeholders() {
        let processor = Processor::silent(DecodeOptions::default(), Capabilities::without_renderer("test"));
        let slides = processor.process_files(&[InputFile::from_bytes("deck.pdf", b"%PDF".to_vec())]).await;
        assert_eq!(slides.len(), 5);
        assert!(slides.iter().all(|s| s.is_placeholder() && s.selected && s.dimensions.is_none()));
        let indices: Vec<_> = slides.iter().map(|s| s.page_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }
}

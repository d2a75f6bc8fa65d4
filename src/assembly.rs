//! Assembly engine: serializes the user's selection into one presentation.
//!
//! Assembly is all-or-nothing. Any failure is logged and reported as an
//! empty [`Artifact`], which callers must treat as the failure signal.

use std::path::Path;

use chrono::Utc;
use tracing::{error, info};

use crate::capabilities::Capabilities;
use crate::constants::assembly as consts;
use crate::error::{Error, Result};
use crate::geometry::{fit_centered, Placement, Size, SLIDE_CANVAS};
use crate::model::{flatten_selected, selected_slides, PresentationGroup, Slide};
use crate::pptx::{Align, DocumentProperties, PptxWriter, PresentationPage, PresentationWriter, Rgb, TextStyle};

/// The assembled file. Empty bytes mean assembly failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Serialized presentation.
    pub bytes: Vec<u8>,
    /// MIME type of the presentation format.
    pub mime: &'static str,
}

impl Artifact {
    /// The failure artifact: correctly typed, no content.
    pub const fn empty() -> Self {
        Self { bytes: Vec::new(), mime: consts::PPTX_MIME }
    }

    /// Whether assembly failed.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Write an artifact to `path`. Empty artifacts are refused.
pub fn save_artifact(artifact: &Artifact, path: &Path) -> Result<()> {
    if artifact.is_empty() {
        return Err(Error::EmptyArtifact);
    }
    fs_err::write(path, &artifact.bytes).map_err(|e| Error::io(e, path.to_path_buf()))?;
    info!("Saved {} bytes to {}", artifact.len(), path.display());
    Ok(())
}

/// Speaker notes recording where a slide came from.
pub fn provenance_note(slide: &Slide) -> String {
    let mut note = format!("{}\n\nSource: {}", consts::NOTES_HEADER, slide.source_file);
    if let Some(page) = slide.page_number() {
        note.push_str(&format!(" (Page {page})"));
    }
    note
}

/// Caption shown instead of content that could not be extracted.
pub fn fallback_caption(slide: &Slide) -> String {
    format!("Content from \"{}\" could not be loaded", slide.source_file)
}

/// Where a slide's full image goes on the output canvas.
pub fn placement_for(slide: &Slide) -> Placement {
    slide.dimensions.map_or_else(
        || Placement::full_bleed(SLIDE_CANVAS),
        |dims| fit_centered(SLIDE_CANVAS, Size::new(dims.width, dims.height)),
    )
}

fn caption_style() -> TextStyle {
    TextStyle {
        font: consts::CAPTION_FONT.to_string(),
        size_pt: consts::CAPTION_FONT_SIZE,
        color: Rgb::from_hex(consts::CAPTION_COLOR).unwrap_or(Rgb(0x66, 0x66, 0x66)),
        align: Align::Center,
    }
}

const CAPTION_BOX: Placement = Placement {
    x: consts::CAPTION_X_IN,
    y: consts::CAPTION_Y_IN,
    width: consts::CAPTION_W_IN,
    height: consts::CAPTION_H_IN,
};

/// Builds output decks from slides and groups.
#[derive(Debug, Clone)]
pub struct Assembler {
    capabilities: Capabilities,
}

impl Assembler {
    /// Create an assembler for the given environment.
    pub const fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    /// Assemble the selected slides of a flat collection.
    pub fn merge_slides(&self, slides: &[Slide]) -> Artifact {
        self.assemble(&selected_slides(slides))
    }

    /// Assemble every slide of the selected groups, in group order.
    pub fn merge_presentations(&self, groups: &[PresentationGroup]) -> Artifact {
        self.assemble(&flatten_selected(groups))
    }

    fn assemble(&self, slides: &[&Slide]) -> Artifact {
        if let Some(reason) = self.capabilities.writer.reason() {
            error!("Cannot assemble presentation: {reason}");
            return Artifact::empty();
        }

        match assemble_with(PptxWriter::new(), slides) {
            Ok(bytes) => {
                info!("Assembled {} slides into {} bytes", slides.len(), bytes.len());
                Artifact { bytes, mime: consts::PPTX_MIME }
            }
            Err(e) => {
                error!("Error merging slides: {e}");
                Artifact::empty()
            }
        }
    }
}

/// Lay out `slides` on `writer`, one page each, and serialize.
pub fn assemble_with<W: PresentationWriter>(mut writer: W, slides: &[&Slide]) -> Result<Vec<u8>> {
    writer.set_layout(SLIDE_CANVAS);
    writer.set_properties(DocumentProperties {
        title: consts::TITLE.to_string(),
        author: consts::AUTHOR.to_string(),
        created: Utc::now(),
    });

    let style = caption_style();
    for slide in slides {
        let page = writer.add_page();
        page.set_background(Rgb::WHITE);

        match slide.full_image.as_ref().filter(|_| !slide.is_placeholder()) {
            Some(image) => page.place_image(image, placement_for(slide))?,
            None => page.place_text(&fallback_caption(slide), CAPTION_BOX, &style),
        }

        page.add_annotation(&provenance_note(slide));
    }

    writer.serialize().map_err(Error::from)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::pptx::WriterError;
    use crate::types::{Dimensions, EncodedImage, SourceKind};

    fn page_slide(page_index: usize, width: f64, height: f64) -> Slide {
        Slide::new(
            "deck.pdf",
            SourceKind::PaginatedPage,
            page_index,
            EncodedImage::jpeg(vec![1]),
            EncodedImage::jpeg(vec![2]),
            Dimensions { width, height, scaled_width: width, scaled_height: height },
        )
    }

    #[test]
    fn notes_name_the_page_for_documents_only() {
        assert_eq!(
            provenance_note(&page_slide(2, 612.0, 792.0)),
            "Created with slidemerge\n\nSource: deck.pdf (Page 3)"
        );
        let image = Slide::placeholder("cat.png", SourceKind::RasterImage, 0);
        assert_eq!(provenance_note(&image), "Created with slidemerge\n\nSource: cat.png");
    }

    #[test]
    fn landscape_pages_fill_the_slide() {
        let placement = placement_for(&page_slide(0, 1920.0, 1080.0));
        assert!((placement.width - 10.0).abs() < 1e-9);
        assert!((placement.height - 5.625).abs() < 1e-9);
        assert!(placement.x.abs() < 1e-9 && placement.y.abs() < 1e-9);
    }

    #[test]
    fn portrait_pages_are_centred() {
        let placement = placement_for(&page_slide(0, 612.0, 792.0));
        assert!((placement.height - 5.625).abs() < 1e-9);
        let right_margin = 10.0 - placement.x - placement.width;
        assert!((placement.x - right_margin).abs() < 1e-9);
    }

    #[test]
    fn missing_dimensions_use_full_bleed() {
        let slide = Slide::placeholder("deck.pdf", SourceKind::PaginatedPage, 0);
        assert_eq!(placement_for(&slide), Placement::full_bleed(SLIDE_CANVAS));
    }

    #[test]
    fn caption_quotes_the_file() {
        let slide = Slide::placeholder("deck.pdf (Error on page 2)", SourceKind::PaginatedPage, 1);
        assert_eq!(fallback_caption(&slide), "Content from \"deck.pdf (Error on page 2)\" could not be loaded");
    }

    #[test]
    fn headless_assembly_is_empty() {
        let assembler = Assembler::new(Capabilities::headless());
        let artifact = assembler.merge_slides(&[page_slide(0, 100.0, 100.0)]);
        assert!(artifact.is_empty());
        assert_eq!(artifact.mime, consts::PPTX_MIME);
    }

    #[test]
    fn writer_failure_yields_empty_artifact() {
        let mut slide = page_slide(0, 100.0, 100.0);
        slide.full_image = Some(EncodedImage::jpeg(Vec::new()));
        let assembler = Assembler::new(Capabilities::without_renderer("test"));
        assert!(assembler.merge_slides(&[slide]).is_empty());
    }

    #[test]
    fn writer_errors_are_reported_as_writer_errors() {
        let mut slide = page_slide(0, 100.0, 100.0);
        slide.full_image = Some(EncodedImage::jpeg(Vec::new()));
        let result = assemble_with(PptxWriter::new(), &[&slide]);
        assert!(matches!(result, Err(Error::Writer(WriterError::EmptyImage { .. }))));
    }

    #[test]
    fn empty_artifacts_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pptx");
        assert!(matches!(save_artifact(&Artifact::empty(), &path), Err(Error::EmptyArtifact)));
        assert!(!path.exists());

        let artifact = Artifact { bytes: vec![1, 2, 3], mime: consts::PPTX_MIME };
        save_artifact(&artifact, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }
}

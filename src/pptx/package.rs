//! In-memory deck and its serialization into an OPC zip package.

use std::io::{Cursor, Write};

use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::parts::{self, Rel};
use super::templates;
use super::{DocumentProperties, PresentationPage, PresentationWriter, Rgb, TextStyle, WriterError};
use crate::geometry::{Placement, Size, SLIDE_CANVAS};
use crate::types::EncodedImage;

#[derive(Debug, Clone)]
pub(super) enum Shape {
    Picture { image: EncodedImage, placement: Placement },
    Text { text: String, placement: Placement, style: TextStyle },
}

/// One page of a [`PptxWriter`] deck.
#[derive(Debug, Clone, Default)]
pub struct PptxPage {
    pub(super) background: Option<Rgb>,
    pub(super) shapes: Vec<Shape>,
    pub(super) notes: Vec<String>,
}

impl PptxPage {
    /// Speaker notes, one entry per annotation.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Number of shapes placed on the page.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    fn images(&self) -> impl Iterator<Item = &EncodedImage> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Picture { image, .. } => Some(image),
            Shape::Text { .. } => None,
        })
    }

    fn notes_text(&self) -> Option<String> {
        if self.notes.is_empty() {
            None
        } else {
            Some(self.notes.join("\n"))
        }
    }
}

impl PresentationPage for PptxPage {
    fn set_background(&mut self, color: Rgb) {
        self.background = Some(color);
    }

    fn place_image(&mut self, image: &EncodedImage, at: Placement) -> Result<(), WriterError> {
        if image.is_empty() {
            return Err(WriterError::EmptyImage { mime: image.mime.clone() });
        }
        self.shapes.push(Shape::Picture { image: image.clone(), placement: at });
        Ok(())
    }

    fn place_text(&mut self, text: &str, at: Placement, style: &TextStyle) {
        self.shapes.push(Shape::Text { text: text.to_string(), placement: at, style: style.clone() });
    }

    fn add_annotation(&mut self, text: &str) {
        self.notes.push(text.to_string());
    }
}

/// Writes Office Open XML presentations.
#[derive(Debug, Clone)]
pub struct PptxWriter {
    size: Size,
    properties: DocumentProperties,
    pages: Vec<PptxPage>,
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PptxWriter {
    /// An empty 16:9 deck.
    pub fn new() -> Self {
        Self { size: SLIDE_CANVAS, properties: DocumentProperties::default(), pages: Vec::new() }
    }

    /// Pages added so far.
    pub fn pages(&self) -> &[PptxPage] {
        &self.pages
    }
}

impl PresentationWriter for PptxWriter {
    type Page = PptxPage;

    fn set_layout(&mut self, size: Size) {
        self.size = size;
    }

    fn set_properties(&mut self, properties: DocumentProperties) {
        self.properties = properties;
    }

    fn add_page(&mut self) -> &mut PptxPage {
        self.pages.push(PptxPage::default());
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn serialize(self) -> Result<Vec<u8>, WriterError> {
        let mut package = Package::new();

        let has_notes = self.pages.iter().any(|p| !p.notes.is_empty());
        let notes_count = self.pages.iter().filter(|p| !p.notes.is_empty()).count();

        // Presentation-level relationships: fixed parts first, then slides.
        let mut pres_rels = vec![
            Rel::new(1, "slideMaster", "slideMasters/slideMaster1.xml"),
            Rel::new(2, "presProps", "presProps.xml"),
            Rel::new(3, "viewProps", "viewProps.xml"),
            Rel::new(4, "theme", "theme/theme1.xml"),
            Rel::new(5, "tableStyles", "tableStyles.xml"),
        ];
        let notes_master_rel = has_notes.then(|| {
            let rel = Rel::new(pres_rels.len() + 1, "notesMaster", "notesMasters/notesMaster1.xml");
            let id = rel.id.clone();
            pres_rels.push(rel);
            id
        });

        let mut slide_rel_ids = Vec::with_capacity(self.pages.len());
        let mut media_index = 0;
        let mut notes_index = 0;

        for (i, page) in self.pages.iter().enumerate() {
            let number = i + 1;
            let slide_part = format!("ppt/slides/slide{number}.xml");

            let rel = Rel::new(pres_rels.len() + 1, "slide", format!("slides/slide{number}.xml"));
            slide_rel_ids.push(rel.id.clone());
            pres_rels.push(rel);

            let mut slide_rels = vec![Rel::new(1, "slideLayout", "../slideLayouts/slideLayout1.xml")];
            let mut image_rel_ids = Vec::new();
            for image in page.images() {
                media_index += 1;
                let ext = image.extension();
                let media_name = format!("image{media_index}.{ext}");
                let rel = Rel::new(slide_rels.len() + 1, "image", format!("../media/{media_name}"));
                image_rel_ids.push(rel.id.clone());
                slide_rels.push(rel);
                package.media(ext);
                package.part(format!("ppt/media/{media_name}"), None, image.bytes.clone());
            }

            if let Some(notes) = page.notes_text() {
                notes_index += 1;
                let notes_name = format!("notesSlide{notes_index}.xml");
                slide_rels.push(Rel::new(slide_rels.len() + 1, "notesSlide", format!("../notesSlides/{notes_name}")));

                let notes_rels = [
                    Rel::new(1, "notesMaster", "../notesMasters/notesMaster1.xml"),
                    Rel::new(2, "slide", format!("../slides/slide{number}.xml")),
                ];
                package.part(
                    format!("ppt/notesSlides/{notes_name}"),
                    Some(parts::presentation_ct("notesSlide")),
                    parts::notes_slide(&notes),
                );
                package.part(format!("ppt/notesSlides/_rels/{notes_name}.rels"), None, parts::relationships(&notes_rels));
            }

            package.part(slide_part, Some(parts::presentation_ct("slide")), parts::slide(page, &image_rel_ids)?);
            package.part(format!("ppt/slides/_rels/slide{number}.xml.rels"), None, parts::relationships(&slide_rels));
        }

        package.part(
            "ppt/presentation.xml",
            Some(parts::presentation_ct("presentation.main")),
            parts::presentation(self.size, notes_master_rel.as_deref(), &slide_rel_ids),
        );
        package.part("ppt/_rels/presentation.xml.rels", None, parts::relationships(&pres_rels));

        package.part(
            "ppt/slideMasters/slideMaster1.xml",
            Some(parts::presentation_ct("slideMaster")),
            templates::slide_master(),
        );
        package.part(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            None,
            parts::relationships(&[
                Rel::new(1, "slideLayout", "../slideLayouts/slideLayout1.xml"),
                Rel::new(2, "theme", "../theme/theme1.xml"),
            ]),
        );
        package.part(
            "ppt/slideLayouts/slideLayout1.xml",
            Some(parts::presentation_ct("slideLayout")),
            templates::blank_layout(),
        );
        package.part(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            None,
            parts::relationships(&[Rel::new(1, "slideMaster", "../slideMasters/slideMaster1.xml")]),
        );
        package.part("ppt/theme/theme1.xml", Some(parts::theme_ct()), templates::theme("Office Theme"));
        package.part("ppt/presProps.xml", Some(parts::presentation_ct("presProps")), templates::pres_props());
        package.part("ppt/viewProps.xml", Some(parts::presentation_ct("viewProps")), templates::view_props());
        package.part("ppt/tableStyles.xml", Some(parts::presentation_ct("tableStyles")), templates::table_styles());

        if has_notes {
            package.part(
                "ppt/notesMasters/notesMaster1.xml",
                Some(parts::presentation_ct("notesMaster")),
                templates::notes_master(),
            );
            package.part(
                "ppt/notesMasters/_rels/notesMaster1.xml.rels",
                None,
                parts::relationships(&[Rel::new(1, "theme", "../theme/theme2.xml")]),
            );
            package.part("ppt/theme/theme2.xml", Some(parts::theme_ct()), templates::theme("Notes Theme"));
        }

        package.part("docProps/core.xml", Some(parts::core_ct()), parts::core_properties(&self.properties));
        package.part(
            "docProps/app.xml",
            Some(parts::app_ct()),
            parts::app_properties(env!("CARGO_PKG_NAME"), self.pages.len(), notes_count),
        );
        package.part(
            "_rels/.rels",
            None,
            parts::relationships(&[
                Rel::new(1, "officeDocument", "ppt/presentation.xml"),
                Rel::new(2, "core-properties", "docProps/core.xml"),
                Rel::new(3, "extended-properties", "docProps/app.xml"),
            ]),
        );

        let bytes = package.finish()?;
        debug!("Serialized {} slides into {} bytes", self.pages.len(), bytes.len());
        Ok(bytes)
    }
}

/// Collects parts, then writes `[Content_Types].xml` first followed by
/// every part in insertion order.
struct Package {
    parts: Vec<(String, Vec<u8>)>,
    overrides: Vec<(String, String)>,
    media: Vec<&'static str>,
}

impl Package {
    const fn new() -> Self {
        Self { parts: Vec::new(), overrides: Vec::new(), media: Vec::new() }
    }

    fn part(&mut self, name: impl Into<String>, content_type: Option<String>, data: impl Into<Vec<u8>>) {
        let name = name.into();
        if let Some(content_type) = content_type {
            self.overrides.push((name.clone(), content_type));
        }
        self.parts.push((name, data.into()));
    }

    fn media(&mut self, extension: &'static str) {
        if !self.media.contains(&extension) {
            self.media.push(extension);
        }
    }

    fn finish(self) -> Result<Vec<u8>, WriterError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(parts::content_types(&self.media, &self.overrides).as_bytes())?;

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

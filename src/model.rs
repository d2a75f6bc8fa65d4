//! Slide and presentation group records.
//!
//! Both records are created only by the decoders. After creation the only
//! mutation is the user's selection toggle; the store round-trips them
//! unchanged.

use serde::{Deserialize, Serialize};

use crate::decode::placeholder;
use crate::types::{Dimensions, EncodedImage, GroupId, SlideId, SourceKind};

/// One visual unit extracted from a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Globally unique, never reused.
    pub id: SlideId,
    /// Name of the originating file (not a key).
    pub source_file: String,
    /// Page of a document or a standalone image.
    pub kind: SourceKind,
    /// Zero-based position within the source file.
    pub page_index: usize,
    /// Small preview, at most 300x225 for images.
    pub thumbnail: EncodedImage,
    /// Full-resolution rendering placed on the output slide.
    #[serde(default)]
    pub full_image: Option<EncodedImage>,
    /// Included in the merged output.
    #[serde(default = "default_selected")]
    pub selected: bool,
    /// Native and rendered size; absent for placeholders made without rendering.
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

const fn default_selected() -> bool {
    true
}

impl Slide {
    /// A successfully extracted slide.
    pub fn new(
        source_file: impl Into<String>,
        kind: SourceKind,
        page_index: usize,
        thumbnail: EncodedImage,
        full_image: EncodedImage,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            id: SlideId::generate(),
            source_file: source_file.into(),
            kind,
            page_index,
            thumbnail,
            full_image: Some(full_image),
            selected: true,
            dimensions: Some(dimensions),
        }
    }

    /// A fallback slide showing the placeholder bitmap.
    pub fn placeholder(source_file: impl Into<String>, kind: SourceKind, page_index: usize) -> Self {
        Self {
            id: SlideId::generate(),
            source_file: source_file.into(),
            kind,
            page_index,
            thumbnail: placeholder::image(),
            full_image: Some(placeholder::image()),
            selected: true,
            dimensions: None,
        }
    }

    /// Attach dimensions (used for image fallbacks so layout never divides by zero).
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Whether this slide's content is the placeholder bitmap.
    pub fn is_placeholder(&self) -> bool {
        self.full_image.as_ref().map_or(true, placeholder::is_placeholder)
    }

    /// One-based page number for paginated sources.
    pub const fn page_number(&self) -> Option<usize> {
        if self.kind.is_paginated() {
            Some(self.page_index + 1)
        } else {
            None
        }
    }
}

/// All slides extracted from one source file, selectable as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationGroup {
    /// Group identifier.
    pub id: GroupId,
    /// Name of the originating file.
    pub source_file_name: String,
    /// Dominant slide kind.
    pub kind: SourceKind,
    /// Slides in page order; never empty.
    pub slides: Vec<Slide>,
    /// Gates every contained slide at assembly time.
    #[serde(default = "default_selected")]
    pub selected: bool,
    /// Copy of the first slide's thumbnail.
    pub thumbnail: EncodedImage,
}

impl PresentationGroup {
    /// Group the slides of one file. Returns `None` when there are no slides,
    /// so empty groups never reach the collection.
    pub fn from_slides(
        source_file_name: impl Into<String>,
        kind: SourceKind,
        slides: Vec<Slide>,
    ) -> Option<Self> {
        let thumbnail = slides.first()?.thumbnail.clone();
        Some(Self {
            id: GroupId::generate(),
            source_file_name: source_file_name.into(),
            kind,
            slides,
            selected: true,
            thumbnail,
        })
    }

    /// Number of slides in the group.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false for groups built through [`PresentationGroup::from_slides`].
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// Slides of the selected groups, in group order then page order.
///
/// Group selection gates all its slides; per-slide flags are not consulted.
pub fn flatten_selected(groups: &[PresentationGroup]) -> Vec<&Slide> {
    groups
        .iter()
        .filter(|g| g.selected)
        .flat_map(|g| g.slides.iter())
        .collect()
}

/// Selected slides of a flat collection, in order.
pub fn selected_slides(slides: &[Slide]) -> Vec<&Slide> {
    slides.iter().filter(|s| s.selected).collect()
}

//! Aspect-preserving placement of content on a fixed canvas.
//!
//! The same rule sizes full-resolution page renders (1920x1080 pixels),
//! image thumbnails (300x225 pixels) and images on the output slide
//! (10x5.625 inches). Because every stage feeds the *native* content size
//! through [`fit_centered`], a page rendered edge-to-edge is also placed
//! edge-to-edge, with no rounding carried from one stage into the next.

use serde::{Deserialize, Serialize};

use crate::constants::{assembly, decode};

/// A width/height pair in arbitrary units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    #[must_use]
    pub fn ratio(self) -> f64 {
        self.width / self.height
    }

    /// Whether both extents are finite and strictly positive.
    #[must_use]
    pub fn is_usable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Uniformly scale both extents.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// Whole-pixel surface size: each extent truncated, never below one pixel.
    #[must_use]
    pub fn to_pixels(self) -> (u32, u32) {
        let px = |v: f64| if v.is_finite() && v >= 1.0 { v.floor().min(f64::from(u32::MAX)) as u32 } else { 1 };
        (px(self.width), px(self.height))
    }
}

/// The 1920x1080 canvas full page renders are fitted into.
pub const RENDER_CANVAS: Size = Size::new(decode::RENDER_WIDTH, decode::RENDER_HEIGHT);

/// The 300x225 bounding box for image thumbnails.
pub const THUMBNAIL_BOUNDS: Size = Size::new(decode::IMAGE_THUMB_WIDTH, decode::IMAGE_THUMB_HEIGHT);

/// The 10x5.625 inch output slide.
pub const SLIDE_CANVAS: Size = Size::new(assembly::SLIDE_WIDTH_IN, assembly::SLIDE_HEIGHT_IN);

/// Position and size of content on a canvas, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Placed width.
    pub width: f64,
    /// Placed height.
    pub height: f64,
}

impl Placement {
    /// Cover the whole canvas.
    #[must_use]
    pub const fn full_bleed(canvas: Size) -> Self {
        Self { x: 0.0, y: 0.0, width: canvas.width, height: canvas.height }
    }

    /// Placed size without the offset.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Scale `content` uniformly so it fills `canvas` on one axis and is
/// centred on the other.
///
/// Content wider than the canvas ratio is fitted to the canvas width,
/// anything else to the canvas height. Content without a usable size
/// (zero, negative or non-finite) gets the full-bleed placement.
#[must_use]
pub fn fit_centered(canvas: Size, content: Size) -> Placement {
    if !content.is_usable() {
        return Placement::full_bleed(canvas);
    }

    let content_ratio = content.ratio();
    if content_ratio > canvas.ratio() {
        let height = canvas.width / content_ratio;
        Placement { x: 0.0, y: (canvas.height - height) / 2.0, width: canvas.width, height }
    } else {
        let width = canvas.height * content_ratio;
        Placement { x: (canvas.width - width) / 2.0, y: 0.0, width, height: canvas.height }
    }
}

/// Uniform scale factor that maps `content` onto its fitted size in `canvas`.
#[must_use]
pub fn fit_scale(canvas: Size, content: Size) -> f64 {
    if !content.is_usable() {
        return 1.0;
    }
    fit_centered(canvas, content).width / content.width
}

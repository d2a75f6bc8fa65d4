//! Application constants.
//!
//! Centralizes magic numbers and configuration values for better maintainability.

/// Extraction policy for paginated documents and images.
pub mod decode {
    use std::time::Duration;

    /// Default maximum pages processed per document.
    pub const MAX_PAGES: usize = 50;

    /// Default deadline for opening a document.
    pub const OPEN_TIMEOUT: Duration = Duration::from_secs(30);

    /// Placeholder slides emitted for a document that cannot be opened.
    pub const PLACEHOLDER_PAGES: usize = 5;

    /// Scale applied to a page's native size for its thumbnail.
    pub const THUMBNAIL_SCALE: f64 = 0.2;

    /// Render target for full-resolution page images (16:9).
    pub const RENDER_WIDTH: f64 = 1920.0;

    /// Render target height for full-resolution page images.
    pub const RENDER_HEIGHT: f64 = 1080.0;

    /// Bounding box for raster image thumbnails.
    pub const IMAGE_THUMB_WIDTH: f64 = 300.0;

    /// Bounding box height for raster image thumbnails.
    pub const IMAGE_THUMB_HEIGHT: f64 = 225.0;

    /// Size assumed for images whose dimensions cannot be determined.
    pub const FALLBACK_IMAGE_WIDTH: f64 = 800.0;

    /// Height assumed for images whose dimensions cannot be determined.
    pub const FALLBACK_IMAGE_HEIGHT: f64 = 600.0;
}

/// JPEG qualities (0-100) used when encoding rendered output.
pub mod quality {
    /// Page thumbnails.
    pub const PAGE_THUMBNAIL: u8 = 70;

    /// Full-resolution page renders.
    pub const PAGE_FULL: u8 = 90;

    /// Raster image thumbnails.
    pub const IMAGE_THUMBNAIL: u8 = 80;
}

/// Output deck geometry and text.
pub mod assembly {
    /// Slide width in inches (16:9 layout).
    pub const SLIDE_WIDTH_IN: f64 = 10.0;

    /// Slide height in inches.
    pub const SLIDE_HEIGHT_IN: f64 = 5.625;

    /// English Metric Units per inch.
    pub const EMU_PER_INCH: f64 = 914_400.0;

    /// Author recorded in the output document properties.
    pub const AUTHOR: &str = "Slide Merge";

    /// Title recorded in the output document properties.
    pub const TITLE: &str = "Merged Presentation";

    /// First line of every slide's speaker notes.
    pub const NOTES_HEADER: &str = "Created with slidemerge";

    /// Caption box for slides whose content could not be extracted.
    pub const CAPTION_X_IN: f64 = 0.5;

    /// Caption box top edge.
    pub const CAPTION_Y_IN: f64 = 2.5;

    /// Caption box width.
    pub const CAPTION_W_IN: f64 = 9.0;

    /// Caption box height.
    pub const CAPTION_H_IN: f64 = 0.6;

    /// Caption font.
    pub const CAPTION_FONT: &str = "Arial";

    /// Caption size in points.
    pub const CAPTION_FONT_SIZE: f64 = 18.0;

    /// Caption colour (RGB hex).
    pub const CAPTION_COLOR: &str = "666666";

    /// MIME type of the assembled artifact.
    pub const PPTX_MIME: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation";
}

/// Embedded library locations.
pub mod store {
    /// Directory under the platform data dir.
    pub const APP_DIR: &str = "slidemerge";

    /// Database file name.
    pub const DB_FILE: &str = "library.redb";
}


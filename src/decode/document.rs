//! Paginated-document decoding.
//!
//! A document is opened against a deadline, capped at a maximum page count,
//! and rendered one page at a time. Each page yields a small thumbnail and a
//! full render fitted into the 16:9 render canvas. A page that fails becomes
//! a placeholder; a document that fails to open becomes a fixed run of
//! placeholders. Completion is reported exactly once either way.

use tracing::{debug, info, warn};

use super::raster::{encode_jpeg, white_surface};
use super::DecodeOptions;
use crate::constants::{decode, quality};
use crate::error::{self, Error};
use crate::geometry::{fit_scale, RENDER_CANVAS};
use crate::model::Slide;
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::render::{RenderEngine, RenderError, RenderedDocument};
use crate::types::{Dimensions, SourceKind};

/// Turns paginated documents into slides.
pub struct DocumentDecoder<'a> {
    engine: Result<&'a dyn RenderEngine, &'a str>,
    options: &'a DecodeOptions,
    observer: &'a dyn ProgressObserver,
}

impl<'a> DocumentDecoder<'a> {
    /// `engine` is `Err(reason)` when no renderer is available; every
    /// document then degrades to placeholders.
    pub const fn new(
        engine: Result<&'a dyn RenderEngine, &'a str>,
        options: &'a DecodeOptions,
        observer: &'a dyn ProgressObserver,
    ) -> Self {
        Self { engine, options, observer }
    }

    /// Decode one document. Never fails; failures become placeholders.
    pub async fn decode(&self, file_name: &str, bytes: Vec<u8>) -> Vec<Slide> {
        let slides = match self.render_document(file_name, bytes).await {
            Ok(slides) => slides,
            Err(e) => {
                warn!("Could not open {file_name}: {e}");
                self.placeholders(file_name)
            }
        };
        self.observer.on_complete(file_name);
        slides
    }

    /// Placeholders for a document whose bytes could not even be read.
    pub fn fail(&self, file_name: &str, error: &Error) -> Vec<Slide> {
        warn!("Could not read {file_name}: {error}");
        let slides = self.placeholders(file_name);
        self.observer.on_complete(file_name);
        slides
    }

    fn placeholders(&self, file_name: &str) -> Vec<Slide> {
        (0..self.options.placeholder_pages)
            .map(|index| Slide::placeholder(file_name, SourceKind::PaginatedPage, index))
            .collect()
    }

    async fn render_document(&self, file_name: &str, bytes: Vec<u8>) -> error::Result<Vec<Slide>> {
        let engine = self.engine.map_err(|reason| RenderError::Unavailable(reason.to_string()))?;

        let deadline = self.options.open_timeout;
        let document = tokio::time::timeout(deadline, engine.open(bytes))
            .await
            .map_err(|_| RenderError::Timeout(deadline))??;

        let total = document.page_count();
        let pages = total.min(self.options.max_pages);
        if pages < total {
            warn!("{file_name} has {total} pages, only the first {pages} will be processed");
        }
        info!("Rendering {pages} pages of {file_name} with {}", engine.name());

        self.observer.on_progress(ProgressEvent {
            file_name: file_name.to_string(),
            page_index: 0,
            total_pages: pages,
        });

        let mut slides = Vec::with_capacity(pages);
        for index in 0..pages {
            let slide = match render_page(document.as_ref(), file_name, index).await {
                Ok(slide) => slide,
                Err(e) => {
                    warn!("{file_name}: {e}");
                    Slide::placeholder(
                        format!("{file_name} (Error on page {})", index + 1),
                        SourceKind::PaginatedPage,
                        index,
                    )
                }
            };
            slides.push(slide);

            self.observer.on_progress(ProgressEvent {
                file_name: file_name.to_string(),
                page_index: index + 1,
                total_pages: pages,
            });
        }

        Ok(slides)
    }
}

/// Render one page. The page handle is dropped before returning, so only one
/// page's render resources are alive at a time.
async fn render_page(
    document: &dyn RenderedDocument,
    file_name: &str,
    index: usize,
) -> Result<Slide, RenderError> {
    let page = document.page(index).await?;
    let native = page.native_size();
    if !native.is_usable() {
        return Err(RenderError::page(index, format!("unusable page size {}x{}", native.width, native.height)));
    }

    let thumb_size = native.scaled(decode::THUMBNAIL_SCALE);
    let mut thumb_surface = white_surface(thumb_size);
    page.render(&mut thumb_surface, decode::THUMBNAIL_SCALE).await?;

    let scale = fit_scale(RENDER_CANVAS, native);
    let full_size = native.scaled(scale);
    let mut full_surface = white_surface(full_size);
    page.render(&mut full_surface, scale).await?;
    drop(page);

    let thumbnail = encode_jpeg(&thumb_surface, quality::PAGE_THUMBNAIL)
        .map_err(|e| RenderError::page(index, e.to_string()))?;
    let full_image = encode_jpeg(&full_surface, quality::PAGE_FULL)
        .map_err(|e| RenderError::page(index, e.to_string()))?;

    debug!("{file_name} page {}: {:.0}x{:.0} -> {:.0}x{:.0}", index + 1, native.width, native.height, full_size.width, full_size.height);

    Ok(Slide::new(
        file_name,
        SourceKind::PaginatedPage,
        index,
        thumbnail,
        full_image,
        Dimensions {
            width: native.width,
            height: native.height,
            scaled_width: full_size.width,
            scaled_height: full_size.height,
        },
    ))
}

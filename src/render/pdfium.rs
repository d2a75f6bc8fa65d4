//! PDFium-backed rendering engine.
//!
//! Requires the pdfium shared library at runtime. It is looked up in
//! `PDFIUM_LIBRARY_PATH` when set, then the working directory, then the
//! system library paths. PDFium calls block, so the library is bound and
//! driven on a [`WorkerEngine`] thread.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::*;

use super::worker::{Backend, DocumentKey, WorkerEngine};
use super::RenderError;
use crate::geometry::Size;

/// Bind pdfium on a dedicated render thread.
pub fn engine(library_dir: Option<&Path>) -> Result<WorkerEngine, RenderError> {
    let library_dir = library_dir.map(Path::to_path_buf);
    WorkerEngine::spawn("pdfium", move || PdfiumBackend::bind(library_dir))
}

struct PdfiumBackend {
    pdfium: &'static Pdfium,
    documents: HashMap<DocumentKey, PdfDocument<'static>>,
    next: DocumentKey,
}

impl PdfiumBackend {
    fn bind(library_dir: Option<PathBuf>) -> Result<Self, RenderError> {
        let dir = library_dir.map_or_else(|| "./".to_string(), |dir| dir.to_string_lossy().to_string());
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| RenderError::Unavailable(format!("{e:?}")))?;

        // Bound once for the life of the process; documents borrow it.
        let pdfium: &'static Pdfium = Box::leak(Box::new(Pdfium::new(bindings)));
        Ok(Self { pdfium, documents: HashMap::new(), next: 0 })
    }

    fn page(&self, document: DocumentKey, index: usize) -> Result<PdfPage<'static>, RenderError> {
        let doc = self
            .documents
            .get(&document)
            .ok_or_else(|| RenderError::page(index, "document is closed"))?;
        let page_index = u16::try_from(index).map_err(|_| RenderError::page(index, "page index out of range"))?;
        doc.pages().get(page_index).map_err(|e| RenderError::page(index, format!("{e:?}")))
    }
}

impl Backend for PdfiumBackend {
    fn open(&mut self, bytes: Vec<u8>) -> Result<(DocumentKey, usize), RenderError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|e| RenderError::Open(format!("{e:?}")))?;
        let pages = usize::from(document.pages().len());

        self.next += 1;
        self.documents.insert(self.next, document);
        Ok((self.next, pages))
    }

    fn page_size(&mut self, document: DocumentKey, index: usize) -> Result<Size, RenderError> {
        let page = self.page(document, index)?;
        Ok(Size::new(f64::from(page.width().value), f64::from(page.height().value)))
    }

    fn render(&mut self, document: DocumentKey, index: usize, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let config = PdfRenderConfig::new()
            .set_target_width(target_extent(width, index)?)
            .set_target_height(target_extent(height, index)?);

        let page = self.page(document, index)?;
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| RenderError::page(index, format!("{e:?}")))?;
        Ok(bitmap.as_rgba_bytes())
    }

    fn close(&mut self, document: DocumentKey) {
        self.documents.remove(&document);
    }
}

/// Surface extent as the signed pixel count pdfium expects.
fn target_extent(extent: u32, index: usize) -> Result<i32, RenderError> {
    i32::try_from(extent).map_err(|_| RenderError::page(index, format!("render size {extent} is too large")))
}

//! The rasterisation capability and its pdfium implementation.
//!
//! The renderer only needs four operations from a PDF engine: open, page
//! count, page size, render a page at a scale. [`RasterBackend`] and
//! [`RasterDocument`] capture exactly those, so the rest of the pipeline can
//! be exercised with an in-memory fake while production code binds pdfium.
//!
//! ## Why a closure instead of returning a handle?
//!
//! A pdfium document borrows the `Pdfium` bindings it was loaded from. Lending
//! the document to a closure keeps both on the stack of the blocking thread
//! and guarantees the document is closed on every exit path, including early
//! returns and panics inside the closure.

use crate::error::{DocumentError, Pdf2PicsError};
use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An open PDF document.
pub trait RasterDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Native page size in PDF points (1/72 inch), `(width, height)`.
    fn page_size(&self, index: usize) -> Result<(f32, f32), String>;

    /// Render page `index` (0-based) scaled uniformly by `scale`.
    fn render_page(&self, index: usize, scale: f32) -> Result<RgbImage, String>;
}

/// A PDF engine able to open documents.
///
/// Implementations are shared across tasks and moved into blocking threads.
pub trait RasterBackend: Send + Sync + 'static {
    /// Open `path`, lend the document to `f`, and close it before returning.
    ///
    /// Fails with [`DocumentError::Open`] when the file is missing, corrupt
    /// or not a PDF.
    fn with_document<R>(
        &self,
        path: &Path,
        f: impl FnOnce(&dyn RasterDocument) -> Result<R, DocumentError>,
    ) -> Result<R, DocumentError>;
}

/// [`RasterBackend`] backed by the pdfium C++ library.
///
/// Binds pdfium afresh for every document (mirroring `Pdfium::default()`),
/// which keeps the backend itself `Send + Sync` without relying on pdfium's
/// own thread-safety.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_path: Option<PathBuf>,
}

impl PdfiumBackend {
    /// Create a backend and check that pdfium can actually be bound.
    ///
    /// With `library_path` set, that library is tried first; the system
    /// library is the fallback.
    pub fn new(library_path: Option<PathBuf>) -> Result<Self, Pdf2PicsError> {
        let backend = Self { library_path };
        backend
            .bind()
            .map_err(|e| Pdf2PicsError::PdfiumBindingFailed(format!("{e:?}")))?;
        Ok(backend)
    }

    fn bind(&self) -> Result<Pdfium, PdfiumError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path).or_else(|e| {
                debug!("pdfium at '{}' unusable ({:?}), trying system library", path.display(), e);
                Pdfium::bind_to_system_library()
            })?,
            None => Pdfium::bind_to_system_library()?,
        };
        Ok(Pdfium::new(bindings))
    }
}

impl RasterBackend for PdfiumBackend {
    fn with_document<R>(
        &self,
        path: &Path,
        f: impl FnOnce(&dyn RasterDocument) -> Result<R, DocumentError>,
    ) -> Result<R, DocumentError> {
        let pdfium = self.bind().map_err(|e| DocumentError::Open {
            path: path.to_path_buf(),
            detail: format!("pdfium unavailable: {e:?}"),
        })?;

        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| DocumentError::Open {
                path: path.to_path_buf(),
                detail: format!("{e:?}"),
            })?;

        // Must drop before `pdfium`, which it borrows.
        let document = PdfiumDocument { document };
        f(&document)
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>, String> {
        let index = u16::try_from(index).map_err(|_| format!("page index {index} out of range"))?;
        self.document.pages().get(index).map_err(|e| format!("{e:?}"))
    }
}

impl RasterDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32), String> {
        let page = self.page(index)?;
        Ok((page.width().value, page.height().value))
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<RgbImage, String> {
        let page = self.page(index)?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| format!("{e:?}"))?;
        Ok(bitmap.as_image().to_rgb8())
    }
}

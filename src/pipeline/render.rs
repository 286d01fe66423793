//! PDF rasterisation: render every selected page of one document to PNG files.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is CPU-bound C++ with thread-local state. Each document is opened,
//! rendered and closed inside `tokio::task::spawn_blocking`, so the Tokio
//! worker threads keep serving uploads and protocol requests meanwhile.
//!
//! ## Output layout
//!
//! `{output_root}/{relative_dir}/{stem}-{page}.png`, pages 1-indexed. The
//! returned paths are relative to the output root with `/` separators, in
//! ascending page order.

use crate::config::PageSelection;
use crate::error::DocumentError;
use crate::pipeline::backend::{RasterBackend, RasterDocument};
use crate::pipeline::flatten::{page_file_name, to_slash};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// One page written to local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Path relative to the output root, `/` separated.
    pub relative_path: String,
    pub width: u32,
    pub height: u32,
}

/// Renders documents with a fixed zoom and page selection.
pub struct Renderer<B> {
    backend: Arc<B>,
    output_root: PathBuf,
    zoom: f32,
    pages: PageSelection,
}

impl<B: RasterBackend> Renderer<B> {
    pub fn new(backend: Arc<B>, output_root: PathBuf, zoom: f32, pages: PageSelection) -> Self {
        Self {
            backend,
            output_root,
            zoom,
            pages,
        }
    }

    /// Render `pdf_path` into `{output_root}/{relative_dir}` as
    /// `{stem}-{page}.png`.
    ///
    /// The document handle is released before this returns, whether
    /// rendering succeeded or not.
    pub async fn render(
        &self,
        pdf_path: &Path,
        relative_dir: &Path,
        stem: &str,
    ) -> Result<Vec<RenderedPage>, DocumentError> {
        let backend = Arc::clone(&self.backend);
        let job = RenderJob {
            pdf_path: pdf_path.to_path_buf(),
            output_root: self.output_root.clone(),
            relative_dir: relative_dir.to_path_buf(),
            stem: stem.to_string(),
            zoom: self.zoom,
            pages: self.pages.clone(),
        };

        tokio::task::spawn_blocking(move || {
            backend.with_document(&job.pdf_path, |doc| job.render_all(doc))
        })
        .await
        .map_err(|e| DocumentError::Aborted {
            path: pdf_path.to_path_buf(),
            detail: e.to_string(),
        })?
    }
}

struct RenderJob {
    pdf_path: PathBuf,
    output_root: PathBuf,
    relative_dir: PathBuf,
    stem: String,
    zoom: f32,
    pages: PageSelection,
}

impl RenderJob {
    fn render_all(&self, doc: &dyn RasterDocument) -> Result<Vec<RenderedPage>, DocumentError> {
        let total_pages = doc.page_count();
        let indices = self.pages.to_indices(total_pages);
        info!(
            "Rendering '{}': {}/{} pages at zoom {}",
            self.pdf_path.display(),
            indices.len(),
            total_pages,
            self.zoom
        );

        let out_dir = self.output_root.join(&self.relative_dir);
        std::fs::create_dir_all(&out_dir).map_err(|e| DocumentError::Write {
            path: out_dir.clone(),
            detail: e.to_string(),
        })?;

        let relative_dir = to_slash(&self.relative_dir);
        let mut rendered = Vec::with_capacity(indices.len());

        for idx in indices {
            let page_num = idx + 1;
            let render_err = |detail: String| DocumentError::Render {
                path: self.pdf_path.clone(),
                page: page_num,
                detail,
            };

            let (width_pts, height_pts) = doc.page_size(idx).map_err(render_err)?;
            let image = doc.render_page(idx, self.zoom).map_err(render_err)?;
            debug!(
                "Rendered page {} ({}x{} pt) → {}x{} px",
                page_num,
                width_pts,
                height_pts,
                image.width(),
                image.height()
            );

            let file_name = page_file_name(&self.stem, page_num);
            let target = out_dir.join(&file_name);
            image
                .save_with_format(&target, ImageFormat::Png)
                .map_err(|e| DocumentError::Write {
                    path: target.clone(),
                    detail: e.to_string(),
                })?;

            rendered.push(RenderedPage {
                page_num,
                relative_path: if relative_dir.is_empty() {
                    file_name
                } else {
                    format!("{relative_dir}/{file_name}")
                },
                width: image.width(),
                height: image.height(),
            });
        }

        Ok(rendered)
    }
}

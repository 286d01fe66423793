//! Batch conversion entry points.
//!
//! A [`Converter`] owns an immutable [`BatchConfig`] plus the two
//! capabilities it drives: a [`RasterBackend`] for rendering and a
//! [`RemoteStore`] for publishing. Each call:
//!
//! ```text
//! input ─ 1. Discover   resolve under the PDF root, enumerate PDFs (sorted)
//!         2. Render     per document, sequentially, on a blocking thread
//!         3. Relocate   (upload only) move pages to their flat names
//!         4. Upload     (upload only) bounded-parallel, per document
//!         5. Aggregate  BatchReport → ConversionMapping
//! ```
//!
//! Only discovery can fail the call. A document that cannot be rendered is
//! logged and left out of the mapping; an image that cannot be published is
//! logged and left out of its document's list. A page whose flat name was
//! already taken by another document earlier in the batch counts as an
//! unpublished image.

use crate::config::BatchConfig;
use crate::error::{DocumentError, Pdf2PicsError};
use crate::output::{BatchReport, ConversionMapping, DocumentOutcome};
use crate::pipeline::backend::{PdfiumBackend, RasterBackend};
use crate::pipeline::discover::{self, DocumentRef};
use crate::pipeline::flatten::relocation;
use crate::pipeline::render::Renderer;
use crate::pipeline::upload::{upload_all, HttpStore, RemoteStore};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Drives discovery, rendering and publishing for one configuration.
pub struct Converter<B = PdfiumBackend, S = HttpStore> {
    config: BatchConfig,
    renderer: Renderer<B>,
    store: S,
}

impl Converter {
    /// Converter backed by pdfium and the HTTP store.
    ///
    /// # Errors
    /// [`Pdf2PicsError::PdfiumBindingFailed`] when no pdfium library can be
    /// bound.
    pub fn new(config: BatchConfig) -> Result<Self, Pdf2PicsError> {
        let backend = PdfiumBackend::new(config.pdfium_lib_path.clone())?;
        Ok(Self::with_parts(config, Arc::new(backend), HttpStore::new()))
    }
}

impl<B: RasterBackend, S: RemoteStore> Converter<B, S> {
    /// Converter with explicit capabilities.
    pub fn with_parts(config: BatchConfig, backend: Arc<B>, store: S) -> Self {
        let renderer = Renderer::new(
            backend,
            config.output_root.clone(),
            config.zoom,
            config.pages.clone(),
        );
        Self {
            config,
            renderer,
            store,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Convert every PDF below `input` (relative to the PDF root).
    ///
    /// `input` may also name a single PDF. With `upload` set the image lists
    /// hold remote URLs, otherwise paths relative to the output root.
    ///
    /// # Errors
    /// [`Pdf2PicsError::InvalidInput`] when `input` escapes the PDF root or is
    /// neither a directory nor a PDF file.
    pub async fn convert_directory(
        &self,
        input: &str,
        upload: bool,
    ) -> Result<ConversionMapping, Pdf2PicsError> {
        Ok(self.convert_directory_report(input, upload).await?.into_mapping())
    }

    /// Convert one PDF; the mapping has exactly one entry on success and none
    /// when the document could not be rendered.
    pub async fn convert_single(
        &self,
        input: &str,
        upload: bool,
    ) -> Result<ConversionMapping, Pdf2PicsError> {
        Ok(self.convert_single_report(input, upload).await?.into_mapping())
    }

    /// Like [`Self::convert_directory`] but keeps per-document failures.
    pub async fn convert_directory_report(
        &self,
        input: &str,
        upload: bool,
    ) -> Result<BatchReport, Pdf2PicsError> {
        let documents = discover::discover(&self.config.pdf_root, input)?;
        Ok(self.run(documents, upload).await)
    }

    /// Like [`Self::convert_single`] but keeps the failure, if any.
    pub async fn convert_single_report(
        &self,
        input: &str,
        upload: bool,
    ) -> Result<BatchReport, Pdf2PicsError> {
        let document = discover::discover_single(&self.config.pdf_root, input)?;
        Ok(self.run(vec![document], upload).await)
    }

    async fn run(&self, documents: Vec<DocumentRef>, upload: bool) -> BatchReport {
        let start = Instant::now();
        let total = documents.len();
        info!(
            "Converting {} documents (upload: {}) into '{}'",
            total,
            upload,
            self.config.output_root.display()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total);
        }

        let mut report = BatchReport::default();
        let mut flat_names: HashMap<String, String> = HashMap::new();

        for (i, doc) in documents.into_iter().enumerate() {
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_document_start(&doc.key, i + 1, total);
            }

            let result = self
                .convert_document(&doc, upload, &mut flat_names, &mut report.failed_uploads)
                .await;

            match &result {
                Ok(images) => {
                    info!(document = %doc.key, "Converted → {} images", images.len());
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_document_complete(&doc.key, images.len());
                    }
                }
                Err(e) => {
                    error!(document = %doc.key, "Skipping document: {}", e);
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_document_error(&doc.key, e);
                    }
                }
            }

            report.outcomes.push(DocumentOutcome {
                document: doc.key,
                result,
            });
        }

        let succeeded = report.succeeded();
        info!(
            "Batch complete: {}/{} documents in {}ms",
            succeeded,
            total,
            start.elapsed().as_millis()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total, succeeded);
        }
        report
    }

    async fn convert_document(
        &self,
        doc: &DocumentRef,
        upload: bool,
        flat_names: &mut HashMap<String, String>,
        failed_uploads: &mut usize,
    ) -> Result<Vec<String>, DocumentError> {
        let pages = self
            .renderer
            .render(&doc.path, &doc.output_dir(), &doc.stem())
            .await?;
        let local: Vec<String> = pages.into_iter().map(|p| p.relative_path).collect();

        if !upload {
            return Ok(local);
        }

        // every relocation of this document finishes before its first upload
        let mut staged: Vec<PathBuf> = Vec::with_capacity(local.len());
        for relative in &local {
            let plan = relocation(&self.config.output_root, relative);

            // first come keeps a flat name for the whole batch
            if let Some(owner) = flat_names.get(&plan.flat_name) {
                if owner != relative {
                    error!(
                        document = %doc.key,
                        "'{}' flattens to '{}', already published for '{}'; not uploaded",
                        relative,
                        plan.flat_name,
                        owner
                    );
                    *failed_uploads += 1;
                    continue;
                }
            }
            flat_names.insert(plan.flat_name.clone(), relative.clone());

            if !plan.is_noop() {
                if let Err(e) = tokio::fs::rename(&plan.from, &plan.to).await {
                    error!(
                        document = %doc.key,
                        path = %plan.from.display(),
                        "Cannot move to '{}': {}",
                        plan.to.display(),
                        e
                    );
                    *failed_uploads += 1;
                    continue;
                }
                debug!("Moved '{}' → '{}'", plan.from.display(), plan.to.display());
            }
            staged.push(plan.to);
        }

        let results = upload_all(
            &self.store,
            &staged,
            &self.config.upload_endpoint,
            self.config.upload_concurrency,
            &doc.key,
        )
        .await;

        // back to page order; uploads complete in any order
        let mut urls: HashMap<PathBuf, String> = HashMap::with_capacity(results.len());
        for result in results {
            match result.url {
                Some(url) => {
                    urls.insert(result.local_path, url);
                }
                None => *failed_uploads += 1,
            }
        }
        let published: Vec<String> = staged.iter().filter_map(|p| urls.remove(p)).collect();
        info!(
            document = %doc.key,
            "Uploaded {}/{} images",
            published.len(),
            local.len()
        );
        Ok(published)
    }
}

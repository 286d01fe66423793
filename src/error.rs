//! Error types for the pdf2pics library.
//!
//! Three error types reflect three distinct blast radii:
//!
//! * [`Pdf2PicsError`] is **fatal**: the call cannot proceed at all (input
//!   outside the PDF root, bad configuration, pdfium missing). Returned as
//!   `Err(Pdf2PicsError)` from the top-level `convert_*` functions.
//!
//! * [`DocumentError`] is **per document**: one PDF could not be opened,
//!   rendered or written. The document is skipped and the batch continues;
//!   the error is kept in [`crate::output::DocumentOutcome`].
//!
//! * [`UploadError`] is **per image**: one rendered page could not be
//!   published. The image is dropped from the document's URL list; the error
//!   is kept in [`crate::pipeline::upload::UploadResult`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2pics library.
#[derive(Debug, Error)]
pub enum Pdf2PicsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Caller-supplied path does not name a PDF or directory under the root.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or startup validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The output root (or a directory below it) could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, or point PDFIUM_LIB_PATH at an existing copy\n\
(prebuilt binaries: https://github.com/bblanchon/pdfium-binaries/releases).\n"
    )]
    PdfiumBindingFailed(String),
}

impl Pdf2PicsError {
    pub(crate) fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Pdf2PicsError::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// A non-fatal error for a single document.
///
/// Whatever pages were written before the failure stay on disk, but the
/// document never appears in the returned mapping.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The file is missing, corrupt, encrypted or not a PDF.
    #[error("Cannot open '{path}': {detail}")]
    Open { path: PathBuf, detail: String },

    /// Rasterisation of one page failed.
    #[error("Page {page} of '{path}': rasterisation failed: {detail}")]
    Render {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// The rendered PNG could not be written.
    #[error("Failed to write '{path}': {detail}")]
    Write { path: PathBuf, detail: String },

    /// The render task panicked or was cancelled before finishing.
    #[error("Rendering '{path}' aborted: {detail}")]
    Aborted { path: PathBuf, detail: String },
}

/// A non-fatal error for a single upload.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum UploadError {
    /// The local file vanished before it could be sent.
    #[error("File '{path}' does not exist")]
    FileMissing { path: PathBuf },

    /// Network failure or non-success HTTP status.
    #[error("Upload of '{path}' failed: {detail}")]
    Transport { path: PathBuf, detail: String },
}

//! Pipeline stages for PDF-to-PNG conversion.
//!
//! Each submodule implements one step and is tested on its own; the
//! orchestration lives in [`crate::convert`].
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ render ──▶ flatten ──▶ upload
//! (walk root)  (pdfium)   (rename)    (multipart POST)
//! ```
//!
//! 1. [`discover`] resolves a caller path under the PDF root and lists PDFs
//! 2. [`backend`] is the rasterisation capability; pdfium in production
//! 3. [`render`] writes one PNG per selected page, inside `spawn_blocking`
//!    because pdfium is not async-safe
//! 4. [`flatten`] plans the move to a flat, upload-safe file name
//! 5. [`upload`] publishes files with bounded parallelism; the only stage
//!    with network I/O

pub mod backend;
pub mod discover;
pub mod flatten;
pub mod render;
pub mod upload;

//! # pdf2pics
//!
//! Convert batches of PDF documents into one PNG per page, optionally
//! publishing every image to a file host, and report where each page ended up.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input (relative to the PDF root)
//!  │
//!  ├─ 1. Discover  directory → every *.pdf below it, or a single PDF
//!  ├─ 2. Render    rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Relocate  a/b/c-1.png → a_b_c-1.png   (upload only)
//!  ├─ 4. Upload    bounded-parallel multipart POST (upload only)
//!  └─ 5. Report    {"a/b/c.pdf": ["<endpoint>/a_b_c-1.png", …]}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2pics::{BatchConfig, Converter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder()
//!         .pdf_root("pdfs")
//!         .output_root("output")
//!         .upload_endpoint("http://127.0.0.1:8000")
//!         .build()?;
//!     let converter = Converter::new(config)?;
//!     let mapping = converter.convert_directory("reports", true).await?;
//!     for (document, urls) in &mapping {
//!         println!("{document}: {} pages", urls.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2pics` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2pics = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod server;

#[cfg(test)]
mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchConfig, BatchConfigBuilder, PageSelection};
pub use convert::Converter;
pub use error::{DocumentError, Pdf2PicsError, UploadError};
pub use output::{BatchReport, ConversionMapping, DocumentOutcome};
pub use pipeline::backend::{PdfiumBackend, RasterBackend, RasterDocument};
pub use pipeline::upload::{HttpStore, RemoteStore, UploadResult};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use server::{serve_stdio, ToolServer};

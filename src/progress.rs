//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive events
//! as the converter walks through a batch.
//!
//! # Example
//!
//! ```rust
//! use pdf2pics::{BatchConfig, BatchProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, document: &str, images: usize) {
//!         let n = self.done.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("#{n} {document}: {images} images");
//!     }
//! }
//!
//! let config = BatchConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::DocumentError;
use std::sync::Arc;

/// Called by the converter as it processes each document of a batch.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Documents are processed one at a time, but the trait
/// is `Send + Sync` so an implementation can be shared with other tasks.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after discovery, before the first document is rendered.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document is opened.
    ///
    /// # Arguments
    /// * `document`: path relative to the PDF root
    /// * `index`:    1-indexed position in the batch
    /// * `total`:    number of documents in the batch
    fn on_document_start(&self, document: &str, index: usize, total: usize) {
        let _ = (document, index, total);
    }

    /// Called when a document finished, with the number of image locations
    /// that ended up in the mapping.
    fn on_document_complete(&self, document: &str, images: usize) {
        let _ = (document, images);
    }

    /// Called when a document is skipped.
    fn on_document_error(&self, document: &str, error: &DocumentError) {
        let _ = (document, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, succeeded: usize) {
        let _ = (total_documents, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

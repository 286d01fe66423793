//! Result types returned by the converter.

use crate::error::DocumentError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Document path (relative to the PDF root, `/` separated) → image
/// locations. Locations are local paths relative to the output root, or
/// remote URLs when upload was requested.
pub type ConversionMapping = BTreeMap<String, Vec<String>>;

/// What happened to one document of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    /// Path relative to the PDF root, `/` separated.
    pub document: String,
    /// Image locations, or why the document was skipped.
    pub result: Result<Vec<String>, DocumentError>,
}

impl DocumentOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Every document of a batch, successful or not, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    /// Images that could not be published (upload mode only).
    pub failed_uploads: usize,
}

impl BatchReport {
    /// Number of documents attempted.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of documents that produced a mapping entry.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Documents that were skipped, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DocumentError)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(e) => Some((o.document.as_str(), e)),
        })
    }

    /// Keep only the successful documents.
    pub fn into_mapping(self) -> ConversionMapping {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok().map(|images| (o.document, images)))
            .collect()
    }
}

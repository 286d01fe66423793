//! Configuration types for batch conversion.
//!
//! Everything the converter needs to know is captured once, at startup, in an
//! immutable [`BatchConfig`] built via [`BatchConfigBuilder`]. The converter
//! never reads ambient process state after construction.

use crate::error::Pdf2PicsError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default zoom: 4 × the PDF's native 72 dpi, roughly 288 dpi.
pub const DEFAULT_ZOOM: f32 = 4.0;

/// Default number of uploads in flight per document.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 5;

/// Default upload endpoint.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "http://127.0.0.1:8000";

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 16.0;

/// Configuration for a batch conversion.
///
/// Built via [`BatchConfig::builder()`] or using [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2pics::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .pdf_root("pdfs")
///     .output_root("out")
///     .upload_endpoint("http://files.internal:8000")
///     .upload_concurrency(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.upload_concurrency, 8);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory every caller-supplied document path is resolved against. Default: `.`.
    pub pdf_root: PathBuf,

    /// Directory rendered images (and the log file) are written below. Default: `output`.
    pub output_root: PathBuf,

    /// Base URL rendered images are POSTed to. Stored without a trailing `/`.
    pub upload_endpoint: String,

    /// Maximum uploads in flight for one document. Default: 5.
    pub upload_concurrency: usize,

    /// Uniform scale applied to the page's native size. Range: 0.1–16. Default: 4.
    pub zoom: f32,

    /// Page selection applied to every document. Default: all pages.
    pub pages: PageSelection,

    /// Explicit pdfium library to bind. `None` binds the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pdf_root: PathBuf::from("."),
            output_root: PathBuf::from("output"),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            zoom: DEFAULT_ZOOM,
            pages: PageSelection::default(),
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("pdf_root", &self.pdf_root)
            .field("output_root", &self.output_root)
            .field("upload_endpoint", &self.upload_endpoint)
            .field("upload_concurrency", &self.upload_concurrency)
            .field("zoom", &self.zoom)
            .field("pages", &self.pages)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check the PDF root exists and create the output root.
    ///
    /// Called once by the binary at startup, before the log file is opened.
    pub fn ensure_roots(&self) -> Result<(), Pdf2PicsError> {
        if !self.pdf_root.is_dir() {
            return Err(Pdf2PicsError::InvalidConfig(format!(
                "PDF root '{}' does not exist or is not a directory",
                self.pdf_root.display()
            )));
        }
        std::fs::create_dir_all(&self.output_root).map_err(|e| Pdf2PicsError::OutputDirFailed {
            path: self.output_root.clone(),
            source: e,
        })
    }

    /// Path of the rolling log file below the output root.
    pub fn log_file(&self) -> PathBuf {
        self.output_root.join("conversion.log")
    }
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl fmt::Debug for BatchConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl BatchConfigBuilder {
    pub fn pdf_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.pdf_root = root.into();
        self
    }

    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = root.into();
        self
    }

    pub fn upload_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.upload_endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn upload_concurrency(mut self, n: usize) -> Self {
        self.config.upload_concurrency = n.max(1);
        self
    }

    pub fn zoom(mut self, zoom: f32) -> Self {
        self.config.zoom = zoom;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, Pdf2PicsError> {
        let c = &self.config;
        if !c.zoom.is_finite() || c.zoom < MIN_ZOOM || c.zoom > MAX_ZOOM {
            return Err(Pdf2PicsError::InvalidConfig(format!(
                "Zoom must be {MIN_ZOOM}–{MAX_ZOOM}, got {}",
                c.zoom
            )));
        }
        if c.upload_concurrency == 0 {
            return Err(Pdf2PicsError::InvalidConfig(
                "Upload concurrency must be ≥ 1".into(),
            ));
        }
        validate_endpoint(&c.upload_endpoint)?;
        if c.output_root.as_os_str().is_empty() {
            return Err(Pdf2PicsError::InvalidConfig(
                "Output root must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), Pdf2PicsError> {
    let url = reqwest::Url::parse(endpoint).map_err(|e| {
        Pdf2PicsError::InvalidConfig(format!("Upload endpoint '{endpoint}' is not a URL: {e}"))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Pdf2PicsError::InvalidConfig(format!(
            "Upload endpoint must be http or https, got '{other}'"
        ))),
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of each PDF to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Render all pages (default).
    #[default]
    All,
    /// Render a single page (1-indexed).
    Single(usize),
    /// Render a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Render specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// Parses `all`, `5`, `3-15` or `1,3,5,7`.
impl FromStr for PageSelection {
    type Err = Pdf2PicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let invalid = |msg: String| Pdf2PicsError::InvalidConfig(format!("pages: {msg}"));
        let page = |p: &str| -> Result<usize, Pdf2PicsError> {
            let n: usize = p
                .trim()
                .parse()
                .map_err(|_| invalid(format!("invalid page number '{}'", p.trim())))?;
            if n < 1 {
                return Err(invalid("pages are 1-indexed, minimum is 1".into()));
            }
            Ok(n)
        };

        if s == "all" || s.is_empty() {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start)?, page(end)?);
            if start > end {
                return Err(invalid(format!("range '{start}-{end}': start must be <= end")));
            }
            return Ok(PageSelection::Range(start, end));
        }

        if s.contains(',') {
            let pages = s.split(',').map(page).collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }

        Ok(PageSelection::Single(page(&s)?))
    }
}

/// Whether `path` has a `.pdf` extension, ignoring case.
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

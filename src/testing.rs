//! In-memory fakes of the rasterisation and storage capabilities for unit tests.
//!
//! A fake PDF is a text file: the `%PDF-fake` header followed by one
//! `width height` line (in points) per page. Anything else fails to open.
//! A zero-sized page fails to render; a negative width makes the renderer
//! panic.

use crate::error::{DocumentError, UploadError};
use crate::pipeline::backend::{RasterBackend, RasterDocument};
use crate::pipeline::upload::{remote_url, RemoteStore};
use image::{Rgb, RgbImage};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const FAKE_HEADER: &str = "%PDF-fake";

/// Write a fake PDF with the given page sizes, creating parent directories.
pub fn write_fake_pdf(path: &Path, pages: &[(f32, f32)]) {
    let mut body = format!("{FAKE_HEADER}\n");
    for (w, h) in pages {
        body.push_str(&format!("{w} {h}\n"));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, body).unwrap();
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    open: AtomicUsize,
    opened: AtomicUsize,
}

impl FakeBackend {
    /// Documents currently open.
    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Documents ever opened successfully.
    pub fn total_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

struct FakeDocument<'a> {
    pages: Vec<(f32, f32)>,
    open: &'a AtomicUsize,
}

impl Drop for FakeDocument<'_> {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RasterDocument for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32), String> {
        self.pages
            .get(index)
            .copied()
            .ok_or_else(|| format!("no page {index}"))
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<RgbImage, String> {
        let (w, h) = self.page_size(index)?;
        assert!(w >= 0.0, "negative width on page {index}");
        let (w, h) = ((w * scale).round() as u32, (h * scale).round() as u32);
        if w == 0 || h == 0 {
            return Err(format!("page {index} has an empty media box"));
        }
        Ok(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, index as u8])
        }))
    }
}

impl RasterBackend for FakeBackend {
    fn with_document<R>(
        &self,
        path: &Path,
        f: impl FnOnce(&dyn RasterDocument) -> Result<R, DocumentError>,
    ) -> Result<R, DocumentError> {
        let open_err = |detail: &str| DocumentError::Open {
            path: path.to_path_buf(),
            detail: detail.to_string(),
        };
        let text = std::fs::read_to_string(path).map_err(|e| open_err(&e.to_string()))?;
        let mut lines = text.lines();
        if lines.next() != Some(FAKE_HEADER) {
            return Err(open_err("missing PDF header"));
        }
        let pages = lines
            .map(|line| {
                let mut it = line.split_whitespace().map(str::parse::<f32>);
                match (it.next(), it.next()) {
                    (Some(Ok(w)), Some(Ok(h))) => Ok((w, h)),
                    _ => Err(open_err("bad page line")),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        let doc = FakeDocument {
            pages,
            open: &self.open,
        };
        f(&doc)
    }
}

/// Store that keeps names in memory, can fail chosen files, add latency and
/// records the peak number of concurrent uploads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    fail: HashSet<String>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    stored: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn failing<const N: usize>(mut self, names: [&str; N]) -> Self {
        self.fail.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }
}

impl RemoteStore for MemoryStore {
    async fn put(&self, local_path: &Path, endpoint: &str) -> Result<String, UploadError> {
        if !local_path.is_file() {
            return Err(UploadError::FileMissing {
                path: local_path.to_path_buf(),
            });
        }
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.contains(&name) {
            return Err(UploadError::Transport {
                path: local_path.to_path_buf(),
                detail: "HTTP 503".into(),
            });
        }
        self.stored.lock().unwrap().push(name.clone());
        Ok(remote_url(endpoint, &name))
    }
}

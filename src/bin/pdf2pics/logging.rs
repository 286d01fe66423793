//! Logging setup for the binary.
//!
//! Two `tracing-subscriber` fmt layers share one registry:
//!
//! * stderr, filtered by `RUST_LOG` or the `--verbose`/`--quiet` level
//!   (stdout belongs to the tool protocol and the JSON mapping);
//! * `conversion.log` under the output root, always at `info` or finer,
//!   rotated by size to `conversion.log.1 … .N`.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Default size at which the log file is rotated: 10 MiB.
pub const DEFAULT_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Rotated files kept next to the active one.
pub const LOG_FILES_KEPT: usize = 5;

/// Append-only file that rolls over once it would exceed `max_bytes`.
///
/// A single write larger than `max_bytes` still lands in one file; rotation
/// happens between writes, never inside one.
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    keep: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, keep: usize) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes: max_bytes.max(1),
            keep: keep.max(1),
            file,
            written,
        })
    }

    fn backup(&self, n: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let oldest = self.backup(self.keep);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        for n in (1..self.keep).rev() {
            let from = self.backup(n);
            if from.exists() {
                std::fs::rename(&from, self.backup(n + 1))?;
            }
        }
        std::fs::rename(&self.path, self.backup(1))?;
        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Install the global subscriber.
///
/// `stderr_level` applies unless `RUST_LOG` is set; the file gets `debug`
/// when `verbose`, `info` otherwise.
pub fn init(log_file: &Path, max_bytes: u64, stderr_level: &str, verbose: bool) -> Result<()> {
    let file = RotatingFile::open(log_file, max_bytes, LOG_FILES_KEPT)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(stderr_level)),
        );

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(EnvFilter::new(if verbose { "debug" } else { "info" }));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_by_size_and_keeps_n_files() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("conversion.log");
        let mut f = RotatingFile::open(&log, 10, 2).unwrap();

        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            f.write_all(line.as_bytes()).unwrap();
        }
        f.flush().unwrap();

        let read = |p: PathBuf| std::fs::read_to_string(p).unwrap();
        assert_eq!(read(log.clone()), "dddddddd\n");
        assert_eq!(read(tmp.path().join("conversion.log.1")), "cccccccc\n");
        assert_eq!(read(tmp.path().join("conversion.log.2")), "bbbbbbbb\n");
        assert!(!tmp.path().join("conversion.log.3").exists());
    }

    #[test]
    fn appends_to_existing_log() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("conversion.log");
        std::fs::write(&log, "old\n").unwrap();

        let mut f = RotatingFile::open(&log, 1024, 3).unwrap();
        f.write_all(b"new\n").unwrap();
        f.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "old\nnew\n");
    }

    #[test]
    fn existing_size_counts_towards_rotation() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("conversion.log");
        std::fs::write(&log, "0123456789").unwrap();

        let mut f = RotatingFile::open(&log, 12, 3).unwrap();
        f.write_all(b"xyz").unwrap();
        f.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "xyz");
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("conversion.log.1")).unwrap(),
            "0123456789"
        );
    }
}

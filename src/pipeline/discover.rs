//! Input resolution: map a caller-supplied path onto documents below the PDF root.
//!
//! Callers (tool clients, the CLI) only ever name paths *relative* to the
//! configured PDF root. Absolute paths and `..` components are rejected
//! before touching the file system, so a request can never read outside
//! the root.

use crate::config::is_pdf_path;
use crate::error::Pdf2PicsError;
use crate::pipeline::flatten::to_slash;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// A document found below the PDF root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// Location on disk.
    pub path: PathBuf,
    /// Location relative to the PDF root.
    pub relative: PathBuf,
    /// `relative` with `/` separators; the key in the conversion mapping.
    pub key: String,
}

impl DocumentRef {
    fn new(pdf_root: &Path, relative: PathBuf) -> Self {
        Self {
            path: pdf_root.join(&relative),
            key: to_slash(&relative),
            relative,
        }
    }

    /// File name without extension; prefix of every page image.
    pub fn stem(&self) -> String {
        self.relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory (relative to the output root) the page images go to.
    pub fn output_dir(&self) -> PathBuf {
        self.relative
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// Validate `input` and return it as a path relative to the PDF root.
///
/// An empty input or `.` names the root itself.
pub fn resolve_relative(input: &str) -> Result<PathBuf, Pdf2PicsError> {
    let mut relative = PathBuf::new();
    for component in Path::new(input.trim()).components() {
        match component {
            Component::Normal(seg) => relative.push(seg),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Pdf2PicsError::invalid_input(input, "'..' escapes the PDF root"))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Pdf2PicsError::invalid_input(
                    input,
                    "expected a path relative to the PDF root",
                ))
            }
        }
    }
    Ok(relative)
}

/// Resolve `input` under `pdf_root` and enumerate the documents it names.
///
/// A directory yields every `.pdf` below it (recursively, sorted by path);
/// a PDF file yields itself. Anything else is
/// [`Pdf2PicsError::InvalidInput`].
pub fn discover(pdf_root: &Path, input: &str) -> Result<Vec<DocumentRef>, Pdf2PicsError> {
    let relative = resolve_relative(input)?;
    let resolved = pdf_root.join(&relative);

    if resolved.is_dir() {
        let mut found = Vec::new();
        walk(pdf_root, &relative, &mut found);
        found.sort();
        debug!("Discovered {} PDFs under '{}'", found.len(), resolved.display());
        return Ok(found
            .into_iter()
            .map(|rel| DocumentRef::new(pdf_root, rel))
            .collect());
    }

    if resolved.is_file() && is_pdf_path(&resolved) {
        return Ok(vec![DocumentRef::new(pdf_root, relative)]);
    }

    Err(Pdf2PicsError::invalid_input(
        input,
        format!(
            "'{}' is neither a directory nor a PDF file",
            resolved.display()
        ),
    ))
}

/// Resolve `input` to exactly one PDF file.
pub fn discover_single(pdf_root: &Path, input: &str) -> Result<DocumentRef, Pdf2PicsError> {
    let relative = resolve_relative(input)?;
    let resolved = pdf_root.join(&relative);
    if resolved.is_file() && is_pdf_path(&resolved) {
        Ok(DocumentRef::new(pdf_root, relative))
    } else {
        Err(Pdf2PicsError::invalid_input(
            input,
            format!("'{}' is not a PDF file", resolved.display()),
        ))
    }
}

/// Collect every PDF below `pdf_root/relative`; unreadable directories are
/// logged and skipped. Symlinked directories are not followed.
fn walk(pdf_root: &Path, relative: &Path, found: &mut Vec<PathBuf>) {
    let dir = pdf_root.join(relative);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Skipping unreadable directory '{}': {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let child = relative.join(entry.file_name());
        if file_type.is_dir() {
            walk(pdf_root, &child, found);
        } else if is_pdf_path(&child) && entry.path().is_file() {
            found.push(child);
        }
    }
}

//! Output naming: per-page file names and the flat names used for upload.
//!
//! Rendered pages live in a tree mirroring the PDF root
//! (`a/b/c.pdf` → `a/b/c-1.png`). The file host has a flat namespace, so
//! before upload every separator in that relative path becomes
//! [`SEPARATOR_SUBSTITUTE`] (`a/b/c-1.png` → `a_b_c-1.png`) and the file is
//! moved to the output root under that name.
//!
//! Everything here is pure; the actual rename happens in
//! [`crate::convert`].

use std::path::{Component, Path, PathBuf};

/// Character every path separator is replaced with.
pub const SEPARATOR_SUBSTITUTE: char = '_';

/// File name of page `page_num` (1-indexed) of a document with stem `stem`.
pub fn page_file_name(stem: &str, page_num: usize) -> String {
    format!("{stem}-{page_num}.png")
}

/// Render a relative path with `/` separators, independent of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace every path separator in `relative` with [`SEPARATOR_SUBSTITUTE`].
///
/// Both `/` and `\` count as separators so names produced on one platform
/// flatten the same way on another.
pub fn flatten(relative: &str) -> String {
    relative
        .chars()
        .map(|c| if c == '/' || c == '\\' { SEPARATOR_SUBSTITUTE } else { c })
        .collect()
}

/// A planned move of one rendered image to its flat upload name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Current location (output root + nested relative path).
    pub from: PathBuf,
    /// Target location (output root + flat name).
    pub to: PathBuf,
    /// Flat file name, also the last segment of the remote URL.
    pub flat_name: String,
}

impl Relocation {
    /// Whether the file already sits at its flat location.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Plan the move of `relative_image` (relative to `output_root`, `/`
/// separated) to its flattened name directly below `output_root`.
pub fn relocation(output_root: &Path, relative_image: &str) -> Relocation {
    let flat_name = flatten(relative_image);
    let from = relative_image
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .fold(output_root.to_path_buf(), |acc, seg| acc.join(seg));
    Relocation {
        from,
        to: output_root.join(&flat_name),
        flat_name,
    }
}

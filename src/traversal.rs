//! Source tree traversal
//!
//! [`SourceTree::entries`] walks a directory tree lazily and yields one
//! [`ArchiveEntry`] per filesystem object below the root, in a deterministic
//! depth-first order: a directory comes before its contents and siblings are
//! sorted by file name. The root itself is not yielded.
//!
//! Symbolic links are reported as [`EntryKind::Symlink`] and never followed.
//! The first walk error ends the useful part of the sequence; callers are
//! expected to stop there.
//!
//! ```rust,no_run
//! use cron_backup::traversal::SourceTree;
//!
//! # fn main() -> cron_backup::Result<()> {
//! for entry in SourceTree::new("./project").entries() {
//!     let entry = entry?;
//!     println!("{} {}", entry.kind, entry.relative_path.display());
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{BackupError, Result};
use crate::types::{ArchiveEntry, EntryKind};
use crate::utils;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Directory tree to archive
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    /// Create a tree rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lazily walk the tree
    pub fn entries(&self) -> Entries {
        let inner = WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        Entries {
            inner,
            root: self.root.clone(),
        }
    }
}

/// Iterator returned by [`SourceTree::entries`]
pub struct Entries {
    inner: walkdir::IntoIter,
    root: PathBuf,
}

impl Iterator for Entries {
    type Item = Result<ArchiveEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.inner.next()?;
        Some(next.map_err(|e| walk_error(&self.root, e)).and_then(|entry| self.describe(entry)))
    }
}

impl Entries {
    fn describe(&self, entry: walkdir::DirEntry) -> Result<ArchiveEntry> {
        let path = entry.path().to_path_buf();
        let metadata = entry.metadata().map_err(|e| walk_error(&path, e))?;
        let kind = EntryKind::from_file_type(entry.file_type());

        let modified = metadata.modified().map_err(|e| {
            BackupError::header(&path, format!("modification time unavailable: {}", e))
        })?;
        let relative_path = utils::make_relative(&path, &self.root)?;

        trace!("Visited {} {:?}", kind, relative_path);

        Ok(ArchiveEntry {
            size: if kind == EntryKind::File { metadata.len() } else { 0 },
            permissions: utils::get_permissions(&metadata),
            modified: DateTime::<Local>::from(modified),
            relative_path,
            kind,
            path,
        })
    }
}

fn walk_error(fallback: &Path, err: walkdir::Error) -> BackupError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf());
    let source = std::io::Error::from(err);
    BackupError::SourceUnreadable { path, source }
}

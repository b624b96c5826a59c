//! Core data types used throughout cron-backup
//!
//! - **Jobs**: [`ArchiveJob`] describes one archive run
//! - **Entries**: [`ArchiveEntry`] and [`EntryKind`] describe one object of
//!   the source tree as it is written into the archive
//! - **Results**: [`ArchiveSummary`] and [`ArchiveProgress`] report what a
//!   run did
//!
//! ## Examples
//!
//! ```rust
//! use cron_backup::types::ArchiveJob;
//! use chrono::{Local, TimeZone};
//!
//! let at = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
//! let job = ArchiveJob::new("/srv/data", "/backups", at);
//! assert!(job.destination.ends_with("2024-03-01 12:30:05.zip"));
//! ```

use crate::error::{BackupError, Result};
use crate::utils;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// One archive operation: snapshot `source_root` into `destination`
///
/// Built by the scheduler at each trigger and consumed once by the archiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    /// Root of the tree to archive
    pub source_root: PathBuf,
    /// Archive file to create (truncated if it already exists)
    pub destination: PathBuf,
    /// Moment the job was triggered
    pub triggered_at: DateTime<Local>,
}

impl ArchiveJob {
    /// Create a job whose archive is named after `triggered_at`
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination_dir: impl AsRef<Path>,
        triggered_at: DateTime<Local>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            destination: destination_dir
                .as_ref()
                .join(utils::archive_file_name(&triggered_at)),
            triggered_at,
        }
    }
}

/// Type of a filesystem object as recorded in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file, written with its full contents
    File,
    /// Directory, header only
    Directory,
    /// Symbolic link, header only (never followed)
    Symlink,
    /// Fifo, socket, or device node, header only
    Other,
}

impl EntryKind {
    /// Classify a file type without following symlinks
    pub fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    /// Whether entries of this kind carry a data stream
    pub fn has_data(&self) -> bool {
        matches!(self, EntryKind::File)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "special file",
        };
        f.write_str(name)
    }
}

/// One object of the source tree, in traversal order
///
/// The contents of a regular file are not held here; the archiver opens
/// `path` when the entry is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Absolute (or root-joined) path used to open the object
    pub path: PathBuf,
    /// Path relative to the source root
    pub relative_path: PathBuf,
    /// Object type
    pub kind: EntryKind,
    /// Last modified timestamp
    pub modified: DateTime<Local>,
    /// Unix file permissions
    pub permissions: u32,
    /// Size in bytes as reported by metadata (0 for non-files)
    pub size: u64,
}

impl ArchiveEntry {
    /// Name of the entry inside the archive, `/`-separated
    ///
    /// # Errors
    ///
    /// - [`BackupError::HeaderConstructionFailed`] if the relative path is
    ///   empty or a component is not valid UTF-8
    pub fn archive_name(&self) -> Result<String> {
        let mut parts = Vec::new();
        for component in self.relative_path.components() {
            match component {
                std::path::Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        BackupError::header(&self.path, "name is not valid UTF-8")
                    })?;
                    parts.push(part);
                }
                other => {
                    return Err(BackupError::header(
                        &self.path,
                        format!("unexpected path component {:?}", other.as_os_str()),
                    ));
                }
            }
        }

        if parts.is_empty() {
            return Err(BackupError::header(&self.path, "empty relative path"));
        }
        Ok(parts.join("/"))
    }
}

/// Result of one successful archive run
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// Finalized archive file
    pub destination: PathBuf,
    /// Number of entries written (files, directories, and others)
    pub entries: usize,
    /// Number of regular files written
    pub files: usize,
    /// Total bytes copied from regular files
    pub bytes_copied: u64,
    /// Wall-clock time spent on the run
    pub duration: Duration,
}

/// Progress callback invoked after each regular file is archived
pub type ProgressCallback = Arc<dyn Fn(ArchiveProgress) + Send + Sync>;

/// Information passed to progress callbacks
#[derive(Debug, Clone)]
pub struct ArchiveProgress {
    /// Source path of the file just archived
    pub path: PathBuf,
    /// Bytes copied for this file
    pub bytes: u64,
    /// Regular files archived so far in this run
    pub files_processed: usize,
    /// Bytes copied so far in this run
    pub bytes_processed: u64,
}

//! Zip archive writer
//!
//! The [`Archiver`] turns one [`ArchiveJob`] into one zip file. Entries are
//! appended in traversal order, each one framed independently:
//!
//! - directories get a header ending in `/` and no data
//! - regular files get a Deflate-compressed copy of their exact bytes
//! - symbolic links get a header-only symlink entry
//! - other special files get a header-only, zero-length entry
//!
//! The output file and the zip writer are owned by [`Archiver::archive`] and
//! released on every return path. When an error occurs before the central
//! directory is written the file on disk is an unfinished archive and must
//! not be trusted.
//!
//! ```rust,no_run
//! use cron_backup::Archiver;
//!
//! # fn main() -> cron_backup::Result<()> {
//! let summary = Archiver::new().archive_to("/backups/today.zip", "/srv/data")?;
//! println!("{} entries, {} bytes", summary.entries, summary.bytes_copied);
//! # Ok(())
//! # }
//! ```

use crate::error::{BackupError, Result};
use crate::traversal::SourceTree;
use crate::types::{ArchiveEntry, ArchiveJob, ArchiveProgress, ArchiveSummary, EntryKind, ProgressCallback};
use crate::utils;
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Buffer size for copying file contents into the archive
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Entries at or above this size need zip64 headers
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Something that can execute an [`ArchiveJob`]
///
/// The scheduler drives an `ArchiveRunner`; [`Archiver`] is the real one.
pub trait ArchiveRunner: Send + Sync + 'static {
    /// Run the job to completion
    fn run(&self, job: &ArchiveJob) -> Result<ArchiveSummary>;
}

/// Writes zip archives of a source tree
#[derive(Clone, Default)]
pub struct Archiver {
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Archiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archiver")
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Archiver {
    /// Create an archiver without progress reporting
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every archived regular file to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Archive `source_root` into `destination`
    pub fn archive_to(
        &self,
        destination: impl Into<PathBuf>,
        source_root: impl Into<PathBuf>,
    ) -> Result<ArchiveSummary> {
        let job = ArchiveJob {
            source_root: source_root.into(),
            destination: destination.into(),
            triggered_at: Local::now(),
        };
        self.archive(&job)
    }

    /// Write the archive described by `job`
    ///
    /// # Errors
    ///
    /// - [`BackupError::SourceUnreadable`] if the tree or a file cannot be read
    /// - [`BackupError::HeaderConstructionFailed`] if an entry header cannot be built
    /// - [`BackupError::WriteFailed`] if writing a header or data fails
    /// - [`BackupError::FinalizeFailed`] if the central directory cannot be written
    pub fn archive(&self, job: &ArchiveJob) -> Result<ArchiveSummary> {
        let start = Instant::now();
        let destination = job.destination.as_path();

        let file = File::create(destination).map_err(|e| BackupError::write_io(destination, e))?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        let mut stats = RunStats::default();

        for entry in SourceTree::new(&job.source_root).entries() {
            let entry = entry?;
            self.write_entry(&mut writer, destination, &entry, &mut stats)?;
        }

        let buffered = writer.finish().map_err(|source| BackupError::FinalizeFailed {
            path: destination.to_path_buf(),
            source,
        })?;
        let file = buffered.into_inner().map_err(|e| BackupError::FinalizeFailed {
            path: destination.to_path_buf(),
            source: ZipError::Io(e.into_error()),
        })?;
        file.sync_all().map_err(|e| BackupError::FinalizeFailed {
            path: destination.to_path_buf(),
            source: ZipError::Io(e),
        })?;

        let summary = ArchiveSummary {
            destination: destination.to_path_buf(),
            entries: stats.entries,
            files: stats.files,
            bytes_copied: stats.bytes,
            duration: start.elapsed(),
        };
        info!(
            "Archived {} entries ({}) from {:?} into {:?} in {:?}",
            summary.entries,
            utils::format_bytes(summary.bytes_copied),
            job.source_root,
            summary.destination,
            summary.duration
        );
        Ok(summary)
    }

    fn write_entry<W: Write + std::io::Seek>(
        &self,
        writer: &mut ZipWriter<W>,
        destination: &Path,
        entry: &ArchiveEntry,
        stats: &mut RunStats,
    ) -> Result<()> {
        let name = entry.archive_name()?;
        let options = header_options(entry);
        let write_failed = |source: ZipError| BackupError::WriteFailed {
            path: destination.to_path_buf(),
            source,
        };

        match entry.kind {
            EntryKind::Directory => writer.add_directory(name, options).map_err(write_failed)?,
            EntryKind::Symlink => writer.add_symlink(name, "", options).map_err(write_failed)?,
            // zip 0.6 keeps only the low permission bits, so fifos, sockets and
            // devices read back as empty regular files
            EntryKind::Other => writer.start_file(name, options).map_err(write_failed)?,
            EntryKind::File => {
                // Open before the header so an unreadable file leaves no entry behind
                let file = File::open(&entry.path)
                    .map_err(|e| BackupError::source_unreadable(&entry.path, e))?;
                writer.start_file(name, options).map_err(write_failed)?;
                let copied = copy_contents(file, &entry.path, writer, destination)?;

                stats.files += 1;
                stats.bytes += copied;
                debug!("Archived {:?} ({} bytes)", entry.path, copied);
                if let Some(callback) = &self.progress {
                    callback(ArchiveProgress {
                        path: entry.path.clone(),
                        bytes: copied,
                        files_processed: stats.files,
                        bytes_processed: stats.bytes,
                    });
                }
            }
        }

        stats.entries += 1;
        Ok(())
    }
}

impl ArchiveRunner for Archiver {
    fn run(&self, job: &ArchiveJob) -> Result<ArchiveSummary> {
        self.archive(job)
    }
}

#[derive(Debug, Default)]
struct RunStats {
    entries: usize,
    files: usize,
    bytes: u64,
}

fn header_options(entry: &ArchiveEntry) -> FileOptions {
    let (modified, clamped) = utils::to_zip_datetime(&entry.modified);
    if clamped {
        debug!(
            "Modification time of {:?} ({}) clamped to zip range",
            entry.path, entry.modified
        );
    }

    let method = if entry.kind.has_data() {
        CompressionMethod::Deflated
    } else {
        CompressionMethod::Stored
    };

    FileOptions::default()
        .compression_method(method)
        .last_modified_time(modified)
        .unix_permissions(entry.permissions)
        .large_file(entry.size >= ZIP64_THRESHOLD)
}

/// Copy `file` into the open zip entry, byte for byte
///
/// Read errors are source errors, write errors belong to the archive.
fn copy_contents<W: Write>(
    mut file: File,
    path: &Path,
    out: &mut W,
    destination: &Path,
) -> Result<u64> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied = 0u64;

    loop {
        let n = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(BackupError::source_unreadable(path, e)),
        };
        out.write_all(&buffer[..n])
            .map_err(|e| BackupError::write_io(destination, e))?;
        copied += n as u64;
    }

    Ok(copied)
}

//! Error types for cron-backup
//!
//! Every failure during a backup run is reported as a [`BackupError`]. A run
//! never retries and never skips an unreadable object: the first error aborts
//! the current archive and is handed back to the caller, which decides what
//! to do with it (the binary terminates the process).

use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;

/// Type alias for Results in the cron-backup library
pub type Result<T> = std::result::Result<T, BackupError>;

/// Main error type for all backup operations
#[derive(Debug, Error)]
pub enum BackupError {
    /// The source root or one of its descendants could not be listed, opened,
    /// or read
    #[error("Source unreadable: {path:?}: {source}")]
    SourceUnreadable {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Metadata for an object could not be turned into an archive entry header
    #[error("Cannot build archive header for {path:?}: {reason}")]
    HeaderConstructionFailed {
        /// Path of the object
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The destination file or the archive writer reported an error while
    /// writing a header or copying data
    #[error("Write failed for {path:?}: {source}")]
    WriteFailed {
        /// Archive path or source path being written
        path: PathBuf,
        /// Underlying archive writer error
        #[source]
        source: ZipError,
    },

    /// The closing structure of the archive could not be written
    #[error("Failed to finalize archive {path:?}: {source}")]
    FinalizeFailed {
        /// Archive path
        path: PathBuf,
        /// Underlying archive writer error
        #[source]
        source: ZipError,
    },

    /// The destination directory did not exist and could not be created
    #[error("Cannot create destination directory {path:?}: {source}")]
    DestinationDirCreateFailed {
        /// Destination directory
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BackupError {
    /// Create a source error for `path`
    pub fn source_unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BackupError::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    /// Create a header error for `path` with a custom message
    pub fn header(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BackupError::HeaderConstructionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a write error from a plain I/O error
    pub fn write_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BackupError::WriteFailed {
            path: path.into(),
            source: ZipError::Io(source),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        BackupError::Internal(msg.into())
    }

    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            BackupError::SourceUnreadable { path, .. }
            | BackupError::HeaderConstructionFailed { path, .. }
            | BackupError::WriteFailed { path, .. }
            | BackupError::FinalizeFailed { path, .. }
            | BackupError::DestinationDirCreateFailed { path, .. } => Some(path),
            BackupError::InvalidConfiguration(_) | BackupError::Internal(_) => None,
        }
    }

    /// Whether an unfinished, invalid archive may have been left on disk
    pub fn is_partial_archive(&self) -> bool {
        matches!(
            self,
            BackupError::SourceUnreadable { .. }
                | BackupError::HeaderConstructionFailed { .. }
                | BackupError::WriteFailed { .. }
                | BackupError::FinalizeFailed { .. }
        )
    }
}

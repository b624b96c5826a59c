//! Backup configuration
//!
//! A [`BackupConfig`] is built once from the startup parameters and handed to
//! the [`Scheduler`](crate::scheduler::Scheduler). Nothing else in the crate
//! holds global state.

use crate::error::{BackupError, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Default interval between two archive runs, in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Shortest allowed interval, in seconds
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Configuration for periodic backups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    /// Directory tree to archive
    pub source_dir: PathBuf,
    /// Directory receiving the archives
    pub destination_dir: PathBuf,
    /// Time between two triggers
    pub interval: Duration,
}

impl BackupConfig {
    /// Create a configuration; `interval_secs` is raised to at least
    /// [`MIN_INTERVAL_SECS`]
    pub fn new(
        source_dir: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        interval_secs: u64,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            interval: Duration::from_secs(interval_secs.max(MIN_INTERVAL_SECS)),
        }
    }

    /// Check that the source directory can be archived
    ///
    /// # Errors
    ///
    /// - [`BackupError::InvalidConfiguration`] if a path is empty or the
    ///   source is not an existing directory
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(BackupError::InvalidConfiguration(
                "source directory is required".to_string(),
            ));
        }
        if self.destination_dir.as_os_str().is_empty() {
            return Err(BackupError::InvalidConfiguration(
                "destination directory is required".to_string(),
            ));
        }
        match fs::metadata(&self.source_dir) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(BackupError::InvalidConfiguration(format!(
                "source {:?} is not a directory",
                self.source_dir
            ))),
            Err(e) => Err(BackupError::InvalidConfiguration(format!(
                "source {:?} is not accessible: {}",
                self.source_dir, e
            ))),
        }
    }

    /// Create the destination directory (and parents) if it is missing
    ///
    /// # Errors
    ///
    /// - [`BackupError::DestinationDirCreateFailed`] if creation fails or the
    ///   path exists but is not a directory
    pub fn prepare_destination(&self) -> Result<()> {
        if self.destination_dir.is_dir() {
            debug!("Destination {:?} already exists", self.destination_dir);
            return Ok(());
        }

        fs::create_dir_all(&self.destination_dir).map_err(|source| {
            BackupError::DestinationDirCreateFailed {
                path: self.destination_dir.clone(),
                source,
            }
        })?;
        info!("Created destination directory {:?}", self.destination_dir);
        Ok(())
    }
}

//! # cron-backup - Periodic zip snapshots of a directory
//!
//! cron-backup captures the full contents of a source directory into a
//! timestamped zip archive, once at startup and then on a fixed interval,
//! until the process is stopped.
//!
//! ## Overview
//!
//! - [`traversal`] walks the source tree lazily and deterministically
//! - [`archiver`] writes one zip file per job, entry by entry
//! - [`scheduler`] triggers jobs immediately and then every interval, never
//!   running two at once
//! - [`config`] holds the startup parameters and prepares the destination
//!
//! Each archive is an independent, complete snapshot named
//! `<destination>/<YYYY-MM-DD HH:MM:SS>.zip`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cron_backup::{Archiver, BackupConfig, Scheduler};
//!
//! # async fn example() -> cron_backup::Result<()> {
//! // One archive, right now
//! let summary = Archiver::new().archive_to("/backups/manual.zip", "/srv/data")?;
//! println!("Wrote {} entries", summary.entries);
//!
//! // Hourly archives, forever
//! let config = BackupConfig::new("/srv/data", "/backups", 3600);
//! config.validate()?;
//! config.prepare_destination()?;
//! if let Err(e) = Scheduler::new(config).run().await {
//!     eprintln!("backup failed: {}", e);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, BackupError>`. There is no retry and no
//! skipping: the first failure aborts the running archive and stops the
//! scheduler. An archive that was not finalized is left on disk; it may look
//! valid but must not be trusted.

pub mod archiver;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod traversal;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use archiver::{ArchiveRunner, Archiver};
pub use config::{BackupConfig, DEFAULT_INTERVAL_SECS};
pub use error::{BackupError, Result};
pub use scheduler::Scheduler;
pub use traversal::SourceTree;
pub use types::*;

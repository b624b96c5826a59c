//! Utility functions for cron-backup
//!
//! Path manipulation, archive naming, permission extraction, timestamp
//! conversion for zip headers, and byte formatting.

use crate::error::{BackupError, Result};
use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Timestamp layout of archive file names (second resolution)
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Extension of archive files
pub const ARCHIVE_EXTENSION: &str = "zip";

/// File name of the archive triggered at `at`
///
/// ```rust
/// use cron_backup::utils::archive_file_name;
/// use chrono::{Local, TimeZone};
///
/// let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(archive_file_name(&at), "2024-01-02 03:04:05.zip");
/// ```
pub fn archive_file_name(at: &DateTime<Local>) -> String {
    format!("{}.{}", at.format(ARCHIVE_TIMESTAMP_FORMAT), ARCHIVE_EXTENSION)
}

/// Make a path relative to a base path
///
/// Tries a lexical strip first so symbolic links keep their own path, and
/// only falls back to canonicalising both sides when that fails.
///
/// # Errors
///
/// - [`BackupError::SourceUnreadable`] if canonicalization fails
/// - [`BackupError::HeaderConstructionFailed`] if `path` is not below `base`
pub fn make_relative(path: &Path, base: &Path) -> Result<PathBuf> {
    if let Ok(relative) = path.strip_prefix(base) {
        return Ok(relative.to_path_buf());
    }

    let path_canon = path
        .canonicalize()
        .map_err(|e| BackupError::source_unreadable(path, e))?;
    let base_canon = base
        .canonicalize()
        .map_err(|e| BackupError::source_unreadable(base, e))?;

    path_canon
        .strip_prefix(&base_canon)
        .map(|p| p.to_path_buf())
        .map_err(|_| {
            BackupError::header(
                path,
                format!("path is not relative to {:?}", base_canon),
            )
        })
}

/// Get Unix permissions from metadata
#[cfg(unix)]
pub fn get_permissions(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

/// Get permissions from metadata (non-Unix implementation)
///
/// Read-only files map to 0o444, writable files to 0o644; directories get
/// the execute bits added.
#[cfg(not(unix))]
pub fn get_permissions(metadata: &fs::Metadata) -> u32 {
    let mut mode = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    if metadata.is_dir() {
        mode |= 0o111;
    }
    mode
}

/// Convert a local timestamp into a zip header timestamp
///
/// Zip headers store MS-DOS dates, which only cover 1980 through 2107.
/// Timestamps outside that range are clamped to the nearest end; the second
/// value of the tuple reports whether clamping happened.
pub fn to_zip_datetime(at: &DateTime<Local>) -> (zip::DateTime, bool) {
    let year = at.year();
    if year < 1980 {
        return (zip::DateTime::default(), true);
    }
    if year > 2107 {
        return (latest_zip_datetime(), true);
    }

    match zip::DateTime::from_date_and_time(
        year as u16,
        at.month() as u8,
        at.day() as u8,
        at.hour() as u8,
        at.minute() as u8,
        at.second().min(59) as u8,
    ) {
        Ok(datetime) => (datetime, false),
        Err(()) => {
            trace!("Timestamp {} not representable in zip header", at);
            (zip::DateTime::default(), true)
        }
    }
}

fn latest_zip_datetime() -> zip::DateTime {
    zip::DateTime::from_date_and_time(2107, 12, 31, 23, 59, 58).unwrap_or_default()
}

/// Format bytes in human-readable form
///
/// Uses binary units (1024-based). Values below 1024 are shown as whole
/// numbers, larger values with two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

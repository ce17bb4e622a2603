//! Timestamped backup files and retention.
//!
//! Backups live in a single directory and are named
//! `data_<yyyyMMdd_HHmmss>.rdb.gz` using the UTC wall clock. Ordering for
//! listing and pruning uses the file's last-write time, not the name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

const BACKUP_PREFIX: &str = "data_";
const BACKUP_SUFFIX: &str = ".rdb.gz";

/// Builds the backup file name for the given instant.
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("{BACKUP_PREFIX}{}{BACKUP_SUFFIX}", now.format("%Y%m%d_%H%M%S"))
}

/// Returns the path of a new backup file in `dir` for the current time.
pub fn backup_path(dir: &Path) -> PathBuf {
    dir.join(backup_file_name(Utc::now()))
}

/// Returns true if `name` looks like a backup produced by this module.
pub fn is_backup_name(name: &str) -> bool {
    name.len() > BACKUP_PREFIX.len() + BACKUP_SUFFIX.len()
        && name.starts_with(BACKUP_PREFIX)
        && name.ends_with(BACKUP_SUFFIX)
}

/// Lists backup file names in `dir`, newest first by last-write time.
///
/// A missing directory yields an empty list.
pub fn list_backups(dir: &Path) -> io::Result<Vec<String>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut found: Vec<(SystemTime, String)> = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !is_backup_name(&name) {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        found.push((modified, name));
    }

    // newest first; ties broken by name so the order is stable
    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    Ok(found.into_iter().map(|(_, name)| name).collect())
}

/// Deletes the oldest backups in `dir` so that at most `keep` remain.
///
/// Returns the names that were deleted. A file that fails to delete is
/// logged and skipped; it does not abort the rest of the pass.
pub fn prune_backups(dir: &Path, keep: usize) -> io::Result<Vec<String>> {
    let files = list_backups(dir)?;
    if files.len() <= keep {
        return Ok(Vec::new());
    }

    let mut deleted = Vec::new();
    for name in files.into_iter().skip(keep) {
        match fs::remove_file(dir.join(&name)) {
            Ok(()) => {
                info!(file = %name, "deleted backup file");
                deleted.push(name);
            }
            Err(e) => warn!(file = %name, "failed to delete backup file: {e}"),
        }
    }
    Ok(deleted)
}

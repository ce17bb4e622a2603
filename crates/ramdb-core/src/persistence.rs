//! Saving and loading the store.
//!
//! This is the boundary where persistence errors stop: everything below
//! returns `Result`, everything here logs the failure and reports a
//! plain success flag to the caller. In-memory state is only replaced
//! once a file has been fully decoded.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use ramdb_persistence::{backup, snapshot};
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::keyspace::Store;

/// Writes snapshots of a [`Store`] and reads them back.
///
/// Saves and loads on the same manager are serialized, so the
/// auto-backup thread and a manual save never write the same file at
/// the same time.
#[derive(Debug)]
pub struct PersistenceManager {
    store: Arc<Store>,
    data_path: PathBuf,
    backup_dir: PathBuf,
    max_backups: usize,
    write_lock: Mutex<()>,
}

impl PersistenceManager {
    /// Creates a manager for `store` using the paths in `config`.
    pub fn new(store: Arc<Store>, config: &EngineConfig) -> Self {
        Self {
            store,
            data_path: config.data_path.clone(),
            backup_dir: config.backup_dir.clone(),
            max_backups: config.max_backups,
            write_lock: Mutex::new(()),
        }
    }

    /// The primary snapshot file.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// The backup directory.
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshots the store and writes it to the primary file, plus a new
    /// timestamped backup when `create_backup` is set.
    ///
    /// Returns false (after logging) if any write fails. A failed backup
    /// write doesn't undo a primary write that already succeeded.
    pub fn save(&self, create_backup: bool) -> bool {
        let _guard = self.lock();
        let data = self.store.snapshot();

        if let Err(e) = snapshot::write_snapshot(&self.data_path, &data) {
            warn!(path = %self.data_path.display(), "save failed: {e}");
            return false;
        }
        info!(
            path = %self.data_path.display(),
            strings = data.strings.len(),
            hashes = data.hashes.len(),
            lists = data.lists.len(),
            "snapshot written"
        );

        if create_backup {
            let path = backup::backup_path(&self.backup_dir);
            if let Err(e) = snapshot::write_snapshot(&path, &data) {
                warn!(path = %path.display(), "backup failed: {e}");
                return false;
            }
            info!(path = %path.display(), "backup written");
        }
        true
    }

    /// Replaces the store's contents with the snapshot at `path`.
    ///
    /// Returns false if the file is missing, has the wrong format version,
    /// or is corrupt; the store is left untouched in all of those cases.
    pub fn load(&self, path: &Path) -> bool {
        let _guard = self.lock();

        if !path.exists() {
            warn!(path = %path.display(), "snapshot file not found");
            return false;
        }

        let data = match snapshot::read_snapshot(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), "load failed: {e}");
                return false;
            }
        };

        let (strings, hashes, lists) = (data.strings.len(), data.hashes.len(), data.lists.len());
        self.store.restore(data);
        info!(path = %path.display(), strings, hashes, lists, "snapshot loaded");
        true
    }

    /// Loads the primary snapshot file.
    pub fn load_primary(&self) -> bool {
        self.load(&self.data_path)
    }

    /// Lists backup file names, newest first. I/O errors yield an empty list.
    pub fn list_backups(&self) -> Vec<String> {
        match backup::list_backups(&self.backup_dir) {
            Ok(files) => files,
            Err(e) => {
                warn!(dir = %self.backup_dir.display(), "failed to list backups: {e}");
                Vec::new()
            }
        }
    }

    /// Deletes the oldest backups beyond the configured maximum.
    ///
    /// Does nothing when the maximum is 0. Returns the number deleted.
    pub fn prune_backups(&self) -> usize {
        if self.max_backups == 0 {
            return 0;
        }
        match backup::prune_backups(&self.backup_dir, self.max_backups) {
            Ok(deleted) => deleted.len(),
            Err(e) => {
                warn!(dir = %self.backup_dir.display(), "failed to prune backups: {e}");
                0
            }
        }
    }

    /// Writes the primary file and a new backup, then prunes old backups.
    ///
    /// This is one auto-backup tick; it can also be triggered by hand.
    pub fn backup_now(&self) -> bool {
        let ok = self.save(true);
        if !ok {
            error!("automatic backup failed");
        }
        self.prune_backups();
        ok
    }
}

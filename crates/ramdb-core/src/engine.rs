//! The engine: lifecycle owner for the store.
//!
//! Opening an engine builds the [`Store`], restores the primary snapshot
//! and starts the auto-backup thread as configured. Closing it (or
//! dropping it) stops the thread and writes a final backup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::auto_backup::AutoBackup;
use crate::config::EngineConfig;
use crate::keyspace::Store;
use crate::persistence::PersistenceManager;

/// A running ramdb instance.
///
/// All data access goes through [`store`](Self::store), which is safe to
/// share across threads.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    store: Arc<Store>,
    persistence: Arc<PersistenceManager>,
    auto_backup: Option<AutoBackup>,
    /// Set when an unreadable primary file could not be moved aside; the
    /// final save is skipped so the file is not overwritten.
    keep_primary: bool,
    closed: bool,
}

impl Engine {
    /// Opens an engine with the given config.
    ///
    /// A missing or unreadable primary file is logged and the engine
    /// starts empty; opening never fails. An unreadable file is renamed to
    /// `<data_path>.unreadable` first, so later saves cannot replace it.
    pub fn open(config: EngineConfig) -> Self {
        let store = Arc::new(Store::new());
        let persistence = Arc::new(PersistenceManager::new(Arc::clone(&store), &config));

        let mut keep_primary = false;
        if config.load_on_open
            && persistence.data_path().exists()
            && !persistence.load_primary()
        {
            keep_primary = !set_aside(persistence.data_path());
        }

        let auto_backup = config
            .backup_interval()
            .and_then(|interval| AutoBackup::spawn(Arc::clone(&persistence), interval));

        info!(
            data_path = %config.data_path.display(),
            keys = store.key_count(),
            auto_backup = auto_backup.is_some(),
            "engine opened"
        );

        Self {
            config,
            store,
            persistence,
            auto_backup,
            keep_primary,
            closed: false,
        }
    }

    /// An engine that never touches the filesystem on its own: nothing is
    /// loaded on open, no backup thread runs, and nothing is saved on close.
    pub fn in_memory() -> Self {
        Self::open(EngineConfig {
            auto_backup: false,
            load_on_open: false,
            save_on_close: false,
            ..Default::default()
        })
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The persistence manager bound to this engine's store.
    pub fn persistence(&self) -> &Arc<PersistenceManager> {
        &self.persistence
    }

    /// The config the engine was opened with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns true if the auto-backup thread is running.
    pub fn auto_backup_running(&self) -> bool {
        self.auto_backup.is_some()
    }

    /// Stops background work and performs the final save.
    ///
    /// Returns the result of the final save, or true when saving on close
    /// is disabled. Calling it again is a no-op.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return true;
        }
        self.closed = true;

        if let Some(mut auto) = self.auto_backup.take() {
            auto.stop();
        }

        let saved = if !self.config.save_on_close {
            true
        } else if self.keep_primary {
            warn!(
                path = %self.persistence.data_path().display(),
                "skipping final save over an unreadable snapshot"
            );
            false
        } else {
            self.persistence.save(true)
        };
        info!(keys = self.store.key_count(), "engine closed");
        saved
    }
}

/// Path an unreadable primary file is moved to.
fn unreadable_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".unreadable");
    PathBuf::from(name)
}

/// Renames an unreadable primary file out of the way. Returns false if it
/// is still in place.
fn set_aside(path: &Path) -> bool {
    let target = unreadable_path(path);
    match fs::rename(path, &target) {
        Ok(()) => {
            warn!(
                path = %path.display(),
                moved_to = %target.display(),
                "unreadable snapshot moved aside"
            );
            true
        }
        Err(e) => {
            warn!(path = %path.display(), "failed to move unreadable snapshot aside: {e}");
            false
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.close();
    }
}

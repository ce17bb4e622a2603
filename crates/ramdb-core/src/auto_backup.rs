//! Periodic background backups.
//!
//! The timer runs as a plain `std::thread` that sleeps on a channel with
//! a timeout. A tick writes a backup and prunes old ones; dropping the
//! handle disconnects the channel, which wakes the thread immediately so
//! shutdown never waits out a full interval.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::persistence::PersistenceManager;

/// Handle to the running auto-backup thread. Stops and joins it on drop.
#[derive(Debug)]
pub struct AutoBackup {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AutoBackup {
    /// Starts a thread calling [`PersistenceManager::backup_now`] every
    /// `interval`.
    ///
    /// Returns `None` if the thread can't be spawned; the engine keeps
    /// working without automatic backups in that case.
    pub fn spawn(persistence: Arc<PersistenceManager>, interval: Duration) -> Option<Self> {
        let (tx, rx) = mpsc::channel::<()>();

        let spawned = std::thread::Builder::new()
            .name("ramdb-backup".into())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        debug!("auto-backup tick");
                        persistence.backup_now();
                    }
                    // explicit stop or every sender dropped
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        match spawned {
            Ok(thread) => {
                info!(interval_secs = interval.as_secs(), "auto-backup started");
                Some(Self {
                    stop: Some(tx),
                    thread: Some(thread),
                })
            }
            Err(e) => {
                warn!("failed to spawn auto-backup thread: {e}");
                None
            }
        }
    }

    /// Stops the thread and waits for an in-flight backup to finish.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("auto-backup thread panicked");
            } else {
                info!("auto-backup stopped");
            }
        }
    }
}

impl Drop for AutoBackup {
    fn drop(&mut self) {
        self.stop();
    }
}

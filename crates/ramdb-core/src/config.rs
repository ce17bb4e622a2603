//! Engine configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! gives a working engine that persists to `@ramdb/data.rdb.gz`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Default primary snapshot file.
pub const DEFAULT_DATA_PATH: &str = "@ramdb/data.rdb.gz";

/// Default backup directory.
pub const DEFAULT_BACKUP_DIR: &str = "@ramdb/backups";

/// Default output budget, in bytes, for a single host response.
pub const DEFAULT_BUFFER_SIZE: usize = 20480;

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Primary snapshot file used by `save(false)` and `load_primary`.
    pub data_path: PathBuf,
    /// Directory holding timestamped backups.
    pub backup_dir: PathBuf,
    /// Whether the periodic backup thread runs at all.
    pub auto_backup: bool,
    /// Minutes between automatic backups. 0 disables the thread.
    pub backup_interval_minutes: u64,
    /// Number of backups to keep when pruning. 0 keeps everything.
    pub max_backups: usize,
    /// Output budget for chunked delivery.
    pub buffer_size: usize,
    /// Load the primary file, if present, when the engine opens.
    pub load_on_open: bool,
    /// Write the store to a new backup when the engine closes.
    pub save_on_close: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            auto_backup: false,
            backup_interval_minutes: 0,
            max_backups: 0,
            buffer_size: DEFAULT_BUFFER_SIZE,
            load_on_open: true,
            save_on_close: true,
        }
    }
}

impl EngineConfig {
    /// Reads a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parses a config from TOML text. Missing fields take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a config file, falling back to the defaults (with a warning)
    /// if it can't be read or parsed.
    pub fn from_file_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), "{e}, using default config");
                Self::default()
            }
        }
    }

    /// Renders the config as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The auto-backup period, or `None` when automatic backups are off.
    pub fn backup_interval(&self) -> Option<Duration> {
        if self.auto_backup && self.backup_interval_minutes > 0 {
            Some(Duration::from_secs(self.backup_interval_minutes.saturating_mul(60)))
        } else {
            None
        }
    }
}

//! Error types for the core engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned when loading or rendering an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file couldn't be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file isn't valid TOML or has fields of the wrong type.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config couldn't be rendered back to TOML.
    #[error("failed to render config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

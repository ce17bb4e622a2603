//! ramdb-core: the storage engine.
//!
//! Owns the three keyspaces (strings, hashes, lists), the snapshot
//! save/load boundary, the auto-backup thread, and the engine lifecycle.
//! Everything is synchronous and thread-safe; callers share one
//! [`Store`] across as many threads as they like.

pub mod auto_backup;
pub mod config;
pub mod engine;
pub mod error;
pub mod keyspace;
pub mod persistence;

pub use auto_backup::AutoBackup;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::ConfigError;
pub use keyspace::{HashKeyspace, InsertPosition, ListKeyspace, Store, StringKeyspace};
pub use persistence::PersistenceManager;
pub use ramdb_persistence::SnapshotData;

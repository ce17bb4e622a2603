//! ramdb-persistence: durability layer.
//!
//! Handles the versioned binary snapshot format, gzip framing, atomic
//! snapshot writes, and timestamped backup retention.

pub mod backup;
pub mod format;
pub mod snapshot;

pub use format::{FormatError, FORMAT_VERSION};
pub use snapshot::SnapshotData;

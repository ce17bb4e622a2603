//! The keyspaces: ramdb's core data store.
//!
//! A [`Store`] owns three independent concurrent keyspaces: plain
//! strings, hashes (field -> value maps), and lists. The same key may
//! exist in all three at once; they never interact except through the
//! cross-keyspace [`Store::exists`] and [`Store::del`] operations.
//!
//! Each keyspace is a `DashMap`, so operations on different keys run in
//! parallel. Single-key operations are atomic: string read-modify-write
//! goes through the map's entry API, hash fields are individually atomic
//! inside a nested `DashMap`, and each list sits behind its own mutex so
//! structural edits never interleave.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use dashmap::DashMap;
use ramdb_persistence::SnapshotData;

mod hash;
mod list;
mod registry;
mod string;

pub use hash::HashKeyspace;
pub use list::{InsertPosition, ListKeyspace};
pub use string::StringKeyspace;

/// The process-wide store: one instance owning all three keyspaces.
///
/// Construct it once and share it (typically behind an `Arc`) with every
/// caller. There is no global state.
#[derive(Debug, Default)]
pub struct Store {
    strings: StringKeyspace,
    hashes: HashKeyspace,
    lists: ListKeyspace,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The string keyspace.
    pub fn strings(&self) -> &StringKeyspace {
        &self.strings
    }

    /// The hash keyspace.
    pub fn hashes(&self) -> &HashKeyspace {
        &self.hashes
    }

    /// The list keyspace.
    pub fn lists(&self) -> &ListKeyspace {
        &self.lists
    }

    /// Total number of keys, counted once per keyspace they appear in.
    pub fn key_count(&self) -> usize {
        self.strings.len() + self.hashes.len() + self.lists.len()
    }

    /// Returns true if every keyspace is empty.
    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }

    /// Removes every key from every keyspace.
    pub fn clear(&self) {
        self.strings.clear();
        self.hashes.clear();
        self.lists.clear();
    }

    /// Copies the contents of all three keyspaces.
    ///
    /// Each keyspace is copied independently, one key at a time, so a
    /// concurrent writer may be reflected in one keyspace and not in
    /// another. A single key's value is never torn.
    pub fn snapshot(&self) -> SnapshotData {
        SnapshotData {
            strings: self.strings.snapshot(),
            hashes: self.hashes.snapshot(),
            lists: self.lists.snapshot(),
        }
    }

    /// Replaces the store's contents with `data`.
    ///
    /// All keyspaces are cleared first. When the data repeats a key (or a
    /// hash repeats a field) the first occurrence wins and later ones are
    /// ignored.
    pub fn restore(&self, data: SnapshotData) {
        self.clear();
        for (key, value) in data.strings {
            self.strings.insert_if_absent(key, value);
        }
        for (key, fields) in data.hashes {
            self.hashes.insert_if_absent(key, fields);
        }
        for (key, items) in data.lists {
            self.lists.insert_if_absent(key, items);
        }
    }
}

/// Parses a stored value as an integer, treating anything unparsable as 0.
fn int_or_zero(value: Option<&str>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// Parses a stored value as a float, treating anything unparsable as 0.0.
fn float_or_zero(value: Option<&str>) -> f64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0.0)
}

/// Converts possibly-negative `index` into a position within `len`.
///
/// Negative indices count from the end (-1 is the last element).
/// Returns `None` when the index falls outside the sequence.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if index < 0 { index + len } else { index };
    if idx < 0 || idx >= len {
        None
    } else {
        Some(idx as usize)
    }
}

/// Normalizes an inclusive `[start, end]` range against `len`.
///
/// Negative indices add `len` once, then `start` is clamped to 0 and
/// `end` to `len - 1`. Returns `None` if the resulting range is empty.
fn normalize_range(start: i64, end: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let mut s = if start < 0 { start + len } else { start };
    let mut e = if end < 0 { end + len } else { end };
    s = s.max(0);
    e = e.min(len - 1);
    if s > e {
        None
    } else {
        Some((s as usize, e as usize))
    }
}

type Fields = DashMap<String, String>;
type List = Mutex<VecDeque<String>>;

fn fields_from_pairs(pairs: Vec<(String, String)>) -> Fields {
    let fields = Fields::with_capacity(pairs.len());
    for (field, value) in pairs {
        fields.entry(field).or_insert(value);
    }
    fields
}

fn fields_to_map(fields: &Fields) -> HashMap<String, String> {
    fields
        .iter()
        .map(|f| (f.key().clone(), f.value().clone()))
        .collect()
}

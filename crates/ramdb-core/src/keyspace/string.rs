use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{float_or_zero, int_or_zero};

/// The string keyspace: key -> string value.
///
/// Reads and writes on different keys never contend. Numeric increments
/// are a single read-modify-write under the map's entry lock, so
/// concurrent increments on one key never lose updates.
#[derive(Debug, Default)]
pub struct StringKeyspace {
    /// Using Box<str> instead of String saves 8 bytes per key (no capacity field).
    data: DashMap<Box<str>, String>,
}

impl StringKeyspace {
    /// Creates an empty keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` at `key`, overwriting any previous value.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Returns the value at `key`, or `None` if it doesn't exist.
    ///
    /// An empty stored string is `Some("")`, never `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).map(|v| v.value().clone())
    }

    /// Adds `delta` to the integer stored at `key` and returns the result.
    ///
    /// A missing key, or a value that doesn't parse as an integer, counts
    /// as 0. The sum wraps on overflow. The result replaces the stored
    /// value in decimal form.
    pub fn incr_by(&self, key: &str, delta: i64) -> i64 {
        match self.data.entry(key.into()) {
            Entry::Occupied(mut e) => {
                let next = int_or_zero(Some(e.get())).wrapping_add(delta);
                e.insert(next.to_string());
                next
            }
            Entry::Vacant(e) => {
                e.insert(delta.to_string());
                delta
            }
        }
    }

    /// Adds `delta` to the float stored at `key` and returns the result
    /// as a string.
    ///
    /// Same missing/unparsable policy as [`incr_by`](Self::incr_by), with 0.0.
    pub fn incr_by_float(&self, key: &str, delta: f64) -> String {
        let mut entry = self.data.entry(key.into()).or_default();
        let next = (float_or_zero(Some(entry.as_str())) + delta).to_string();
        *entry = next.clone();
        next
    }

    /// Returns true if `key` exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes `key`, returning true if it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the keyspace is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Clears all keys.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Inserts `value` only if `key` is absent. Returns true if inserted.
    pub fn insert_if_absent(&self, key: String, value: String) -> bool {
        match self.data.entry(key.into_boxed_str()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                e.insert(value);
                true
            }
        }
    }

    /// Copies every key-value pair.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.data
            .iter()
            .map(|e| (e.key().to_string(), e.value().clone()))
            .collect()
    }
}

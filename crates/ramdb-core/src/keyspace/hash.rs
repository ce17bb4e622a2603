use std::collections::HashMap;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{fields_from_pairs, fields_to_map, float_or_zero, int_or_zero, Fields};

/// The hash keyspace: key -> (field -> value).
///
/// A hash is created lazily on its first field write and stays in the
/// keyspace even after its last field is deleted; only a keyspace-level
/// delete removes the key. Each field is updated atomically on its own,
/// so a concurrent [`hgetall`](Self::hgetall) may observe a multi-field
/// [`hmset`](Self::hmset) half applied.
#[derive(Debug, Default)]
pub struct HashKeyspace {
    data: DashMap<Box<str>, Fields>,
}

impl HashKeyspace {
    /// Creates an empty keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the fields of `key`, or returns `None` if the
    /// hash doesn't exist. The key can't be removed while `f` runs.
    fn with_fields<R>(&self, key: &str, f: impl FnOnce(&Fields) -> R) -> Option<R> {
        self.data.get(key).map(|h| f(h.value()))
    }

    /// Like [`with_fields`](Self::with_fields) but creates an empty hash
    /// first if `key` is missing.
    fn with_fields_or_create<R>(&self, key: &str, f: impl FnOnce(&Fields) -> R) -> R {
        if let Some(h) = self.data.get(key) {
            return f(h.value());
        }
        let h = self.data.entry(key.into()).or_default().downgrade();
        f(h.value())
    }

    /// Sets `field` to `value`. Returns true if the field is new, false
    /// if an existing value was overwritten.
    pub fn hset(&self, key: &str, field: &str, value: &str) -> bool {
        self.with_fields_or_create(key, |fields| {
            fields.insert(field.to_owned(), value.to_owned()).is_none()
        })
    }

    /// Sets several fields at once. Returns the number of fields that
    /// were newly created; overwritten fields aren't counted.
    pub fn hmset(&self, key: &str, pairs: &[(String, String)]) -> usize {
        self.with_fields_or_create(key, |fields| {
            pairs
                .iter()
                .filter(|(f, v)| fields.insert(f.clone(), v.clone()).is_none())
                .count()
        })
    }

    /// Returns the value of `field`, or `None` if the key or field is missing.
    pub fn hget(&self, key: &str, field: &str) -> Option<String> {
        self.with_fields(key, |fields| fields.get(field).map(|v| v.value().clone()))
            .flatten()
    }

    /// Returns a copy of every field. Missing keys yield an empty map.
    pub fn hgetall(&self, key: &str) -> HashMap<String, String> {
        self.with_fields(key, fields_to_map).unwrap_or_default()
    }

    /// Removes the given fields. Returns how many were actually removed.
    pub fn hdel(&self, key: &str, fields: &[String]) -> usize {
        self.with_fields(key, |map| {
            fields.iter().filter(|f| map.remove(f.as_str()).is_some()).count()
        })
        .unwrap_or(0)
    }

    /// Returns true if `field` exists in the hash at `key`.
    pub fn hexists(&self, key: &str, field: &str) -> bool {
        self.with_fields(key, |fields| fields.contains_key(field))
            .unwrap_or(false)
    }

    /// Returns the number of fields, or 0 if the key is missing.
    pub fn hlen(&self, key: &str) -> usize {
        self.with_fields(key, |fields| fields.len()).unwrap_or(0)
    }

    /// Returns all field names. Missing keys yield an empty vec.
    pub fn hkeys(&self, key: &str) -> Vec<String> {
        self.with_fields(key, |fields| fields.iter().map(|f| f.key().clone()).collect())
            .unwrap_or_default()
    }

    /// Returns all field values. Missing keys yield an empty vec.
    pub fn hvals(&self, key: &str) -> Vec<String> {
        self.with_fields(key, |fields| {
            fields.iter().map(|f| f.value().clone()).collect()
        })
        .unwrap_or_default()
    }

    /// Adds `delta` to the integer in `field`, creating the hash and the
    /// field as needed. Unparsable values count as 0; the sum wraps.
    pub fn hincrby(&self, key: &str, field: &str, delta: i64) -> i64 {
        self.with_fields_or_create(key, |fields| match fields.entry(field.to_owned()) {
            Entry::Occupied(mut e) => {
                let next = int_or_zero(Some(e.get())).wrapping_add(delta);
                e.insert(next.to_string());
                next
            }
            Entry::Vacant(e) => {
                e.insert(delta.to_string());
                delta
            }
        })
    }

    /// Adds `delta` to the float in `field` and returns the result as a
    /// string. Same creation and parsing policy as [`hincrby`](Self::hincrby).
    pub fn hincrbyfloat(&self, key: &str, field: &str, delta: f64) -> String {
        self.with_fields_or_create(key, |fields| {
            let mut value = fields.entry(field.to_owned()).or_default();
            let next = (float_or_zero(Some(value.as_str())) + delta).to_string();
            *value = next.clone();
            next
        })
    }

    /// Returns true if a hash exists at `key`, even one with no fields.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes the hash at `key`, returning true if it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Returns the number of hashes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the keyspace is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Clears all hashes.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Inserts a hash built from `pairs` only if `key` is absent. Within
    /// `pairs`, the first occurrence of a field wins.
    pub fn insert_if_absent(&self, key: String, pairs: Vec<(String, String)>) -> bool {
        match self.data.entry(key.into_boxed_str()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                e.insert(fields_from_pairs(pairs));
                true
            }
        }
    }

    /// Copies every hash and its fields.
    pub fn snapshot(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.data
            .iter()
            .map(|h| {
                let fields = h
                    .value()
                    .iter()
                    .map(|f| (f.key().clone(), f.value().clone()))
                    .collect();
                (h.key().to_string(), fields)
            })
            .collect()
    }
}

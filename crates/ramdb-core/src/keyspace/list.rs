use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{normalize_index, normalize_range, List};

/// Where [`ListKeyspace::linsert`] places the new element relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

/// The list keyspace: key -> ordered sequence of strings.
///
/// Every list is guarded by its own mutex, held for the whole of any
/// mutating or length-dependent operation. The outer map is only read
/// locked while that happens, so lists under different keys never
/// block each other.
///
/// Like hashes, a list that becomes empty stays in the keyspace until it
/// is deleted explicitly.
#[derive(Debug, Default)]
pub struct ListKeyspace {
    data: DashMap<Box<str>, List>,
}

/// Locks a list, recovering the data if a previous holder panicked.
fn lock(list: &List) -> MutexGuard<'_, VecDeque<String>> {
    list.lock().unwrap_or_else(|e| e.into_inner())
}

impl ListKeyspace {
    /// Creates an empty keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_list<R>(&self, key: &str, f: impl FnOnce(&mut VecDeque<String>) -> R) -> Option<R> {
        self.data.get(key).map(|l| {
            let mut list = lock(l.value());
            f(&mut list)
        })
    }

    fn with_list_or_create<R>(&self, key: &str, f: impl FnOnce(&mut VecDeque<String>) -> R) -> R {
        if let Some(l) = self.data.get(key) {
            let mut list = lock(l.value());
            return f(&mut list);
        }
        let l = self.data.entry(key.into()).or_default().downgrade();
        let mut list = lock(l.value());
        f(&mut list)
    }

    /// Pushes each value onto the head in argument order, so the last
    /// value ends up first. Returns the new length.
    pub fn lpush(&self, key: &str, values: &[String]) -> usize {
        self.with_list_or_create(key, |list| {
            for v in values {
                list.push_front(v.clone());
            }
            list.len()
        })
    }

    /// Appends each value to the tail in argument order. Returns the new length.
    pub fn rpush(&self, key: &str, values: &[String]) -> usize {
        self.with_list_or_create(key, |list| {
            list.extend(values.iter().cloned());
            list.len()
        })
    }

    /// Removes up to `count` elements from the head, in head-to-tail order.
    ///
    /// Returns `None` if the key is missing or the list is empty.
    pub fn lpop(&self, key: &str, count: usize) -> Option<Vec<String>> {
        self.with_list(key, |list| {
            if list.is_empty() {
                return None;
            }
            let n = count.min(list.len());
            Some(list.drain(..n).collect())
        })
        .flatten()
    }

    /// Removes up to `count` elements from the tail, in removal order
    /// (last element first).
    ///
    /// Returns `None` if the key is missing or the list is empty.
    pub fn rpop(&self, key: &str, count: usize) -> Option<Vec<String>> {
        self.with_list(key, |list| {
            if list.is_empty() {
                return None;
            }
            let n = count.min(list.len());
            Some((0..n).filter_map(|_| list.pop_back()).collect())
        })
        .flatten()
    }

    /// Returns the elements in the inclusive range `[start, end]`.
    ///
    /// Negative indices count from the end. Out-of-range bounds are
    /// clamped; a missing key or an empty range yields an empty vec.
    pub fn lrange(&self, key: &str, start: i64, end: i64) -> Vec<String> {
        self.with_list(key, |list| match normalize_range(start, end, list.len()) {
            Some((s, e)) => list.range(s..=e).cloned().collect(),
            None => Vec::new(),
        })
        .unwrap_or_default()
    }

    /// Returns the element at `index`, or `None` if out of range or missing.
    pub fn lindex(&self, key: &str, index: i64) -> Option<String> {
        self.with_list(key, |list| {
            normalize_index(index, list.len()).and_then(|i| list.get(i).cloned())
        })
        .flatten()
    }

    /// Returns the length of the list, or 0 if the key is missing.
    pub fn llen(&self, key: &str) -> usize {
        self.with_list(key, |list| list.len()).unwrap_or(0)
    }

    /// Inserts `value` next to the first element equal to `pivot`.
    ///
    /// Returns the new length on success, 0 if the key is missing, or
    /// -1 if the pivot isn't in the list.
    pub fn linsert(&self, key: &str, position: InsertPosition, pivot: &str, value: &str) -> i64 {
        self.with_list(key, |list| {
            let Some(at) = list.iter().position(|v| v == pivot) else {
                return -1;
            };
            let at = match position {
                InsertPosition::Before => at,
                InsertPosition::After => at + 1,
            };
            list.insert(at, value.to_owned());
            list.len() as i64
        })
        .unwrap_or(0)
    }

    /// Overwrites the element at `index`. Returns false if the key is
    /// missing or the index is out of range.
    pub fn lset(&self, key: &str, index: i64, value: &str) -> bool {
        self.with_list(key, |list| match normalize_index(index, list.len()) {
            Some(i) => {
                list[i] = value.to_owned();
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    /// Removes elements equal to `value`.
    ///
    /// `count == 0` removes every match, `count > 0` removes up to `count`
    /// scanning from the head, and `count < 0` removes up to `|count|`
    /// scanning from the tail. Returns the number removed.
    pub fn lrem(&self, key: &str, count: i64, value: &str) -> usize {
        self.with_list(key, |list| {
            let before = list.len();
            if count >= 0 {
                let limit = if count == 0 { usize::MAX } else { count as usize };
                let mut removed = 0usize;
                list.retain(|v| {
                    if removed < limit && v == value {
                        removed += 1;
                        false
                    } else {
                        true
                    }
                });
            } else {
                let limit = count.unsigned_abs() as usize;
                let mut removed = 0usize;
                let mut kept = VecDeque::with_capacity(list.len());
                while let Some(v) = list.pop_back() {
                    if removed < limit && v == value {
                        removed += 1;
                    } else {
                        kept.push_front(v);
                    }
                }
                *list = kept;
            }
            before - list.len()
        })
        .unwrap_or(0)
    }

    /// Trims the list to the inclusive range `[start, end]`.
    ///
    /// If the normalized range is empty the whole list is cleared. Returns
    /// false only when the key is missing.
    pub fn ltrim(&self, key: &str, start: i64, end: i64) -> bool {
        self.with_list(key, |list| {
            match normalize_range(start, end, list.len()) {
                Some((s, e)) => {
                    list.truncate(e + 1);
                    list.drain(..s);
                }
                None => list.clear(),
            }
        })
        .is_some()
    }

    /// Returns true if a list exists at `key`, even an empty one.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes the list at `key`, returning true if it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Returns the number of lists.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the keyspace is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Clears all lists.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Inserts a list holding `items` only if `key` is absent.
    pub fn insert_if_absent(&self, key: String, items: Vec<String>) -> bool {
        match self.data.entry(key.into_boxed_str()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                e.insert(Mutex::new(VecDeque::from(items)));
                true
            }
        }
    }

    /// Copies every list in head-to-tail order.
    pub fn snapshot(&self) -> Vec<(String, Vec<String>)> {
        self.data
            .iter()
            .map(|l| {
                let items = lock(l.value()).iter().cloned().collect();
                (l.key().to_string(), items)
            })
            .collect()
    }
}

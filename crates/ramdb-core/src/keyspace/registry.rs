//! Operations that span all three keyspaces.

use super::Store;

impl Store {
    /// Counts how many of `keys` exist in each keyspace, summed.
    ///
    /// A key present as both a string and a list counts twice. Repeated
    /// keys in the argument are counted each time.
    pub fn exists<K: AsRef<str>>(&self, keys: &[K]) -> usize {
        keys.iter()
            .map(|k| {
                let k = k.as_ref();
                usize::from(self.strings.contains_key(k))
                    + usize::from(self.hashes.contains_key(k))
                    + usize::from(self.lists.contains_key(k))
            })
            .sum()
    }

    /// Deletes each of `keys` from every keyspace.
    ///
    /// Returns the number of (key, keyspace) entries removed. Keys are
    /// processed one at a time, so a concurrent reader can see some keys
    /// deleted and others not yet.
    pub fn del<K: AsRef<str>>(&self, keys: &[K]) -> usize {
        keys.iter()
            .map(|k| {
                let k = k.as_ref();
                usize::from(self.strings.remove(k))
                    + usize::from(self.hashes.remove(k))
                    + usize::from(self.lists.remove(k))
            })
            .sum()
    }
}

use std::vec;

use crate::{KeyValueIterator, Result};

/// A cursor over a materialised snapshot of entries.
///
/// The in-memory cache and store copy the matching range out of their maps
/// when a scan starts, so later writes never disturb an open cursor.
#[derive(Debug)]
pub struct MemoryIterator<K, V> {
    entries: vec::IntoIter<(K, V)>,
}

impl<K, V> MemoryIterator<K, V> {
    /// Wraps entries that are already in scan order.
    pub fn new(entries: Vec<(K, V)>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Entries not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

impl<K, V> Default for MemoryIterator<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryIterator<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<K, V> KeyValueIterator for MemoryIterator<K, V> {
    type Key = K;
    type Value = V;

    fn next_entry(&mut self) -> Result<Option<(K, V)>> {
        Ok(self.entries.next())
    }

    fn close(&mut self) -> Result<()> {
        // Release the snapshot.
        self.entries = Vec::new().into_iter();
        Ok(())
    }
}

//! # Cache - segment-scoped write-through cache
//!
//! The in-memory side of the window store. Writes land here first and are
//! marked dirty until the store layer flushes them; reads consult the cache
//! before the segmented store because the cache is always at least as fresh.
//!
//! Entries are keyed by *cache key*: the store key prefixed with its segment
//! id (see [`SegmentedCacheFunction`]). A deletion is kept as a dirty
//! tombstone until it has been applied to the store.
//!
//! ```text
//!  put / delete ──► WindowCache (BTreeMap<cache key, CacheEntry>)
//!                        │                         │
//!                 fetch(query)               take_dirty()
//!                        │                         │
//!                        ▼                         ▼
//!               MemoryIterator snapshot     SegmentedStore writes
//! ```
//!
//! Eviction is not modelled: entries stay until [`WindowCache::clear`].

mod segmented;

pub use segmented::{SegmentedCacheFunction, SEGMENT_ID_BYTES};

use cursor::MemoryIterator;
use log::debug;
use std::collections::BTreeMap;
use std::ops::Bound;
use windowkey::{range_is_empty, Result, WindowQuery};

/// A cached value. `value == None` is a tombstone (pending delete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: Option<Vec<u8>>,
    /// `true` until the entry has been flushed to the store.
    pub dirty: bool,
}

impl CacheEntry {
    /// A clean entry, as read back from the store.
    pub fn clean(value: Vec<u8>) -> Self {
        Self {
            value: Some(value),
            dirty: false,
        }
    }

    /// A dirty tombstone.
    pub fn tombstone() -> Self {
        Self {
            value: None,
            dirty: true,
        }
    }

    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    fn size(&self) -> usize {
        self.value.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Default)]
pub struct WindowCache {
    map: BTreeMap<Vec<u8>, CacheEntry>,
    approx_size: usize,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a dirty value.
    pub fn put(&mut self, cache_key: Vec<u8>, value: Vec<u8>) {
        self.insert(
            cache_key,
            CacheEntry {
                value: Some(value),
                dirty: true,
            },
        );
    }

    /// Replaces any entry with a dirty tombstone.
    pub fn delete(&mut self, cache_key: Vec<u8>) {
        self.insert(cache_key, CacheEntry::tombstone());
    }

    /// Inserts an entry as-is. Used to populate clean entries.
    pub fn insert(&mut self, cache_key: Vec<u8>, entry: CacheEntry) {
        let added = cache_key.len() + entry.size();
        if let Some(old) = self.map.get(&cache_key) {
            self.approx_size = self.approx_size.saturating_sub(cache_key.len() + old.size());
        }
        self.approx_size += added;
        self.map.insert(cache_key, entry);
    }

    /// The entry for a cache key, tombstones included.
    pub fn get(&self, cache_key: &[u8]) -> Option<&CacheEntry> {
        self.map.get(cache_key)
    }

    /// Snapshot of the entries within `bounds`, ascending when `forward`,
    /// descending otherwise.
    pub fn range(
        &self,
        bounds: (Bound<Vec<u8>>, Bound<Vec<u8>>),
        forward: bool,
    ) -> MemoryIterator<Vec<u8>, CacheEntry> {
        if range_is_empty(&bounds) {
            return MemoryIterator::empty();
        }
        let range = self.map.range::<Vec<u8>, _>(bounds);
        let entries: Vec<_> = if forward {
            range.map(|(k, v)| (k.clone(), v.clone())).collect()
        } else {
            range.rev().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        MemoryIterator::new(entries)
    }

    /// Snapshot of the entries matching `query`, segment by segment.
    ///
    /// Tombstones are returned too: the merge needs them to hide store
    /// records that were deleted but not yet flushed.
    ///
    /// # Errors
    ///
    /// Returns [`windowkey::Error::CorruptKey`] if a cached key in range does
    /// not decode under the function's schema.
    pub fn fetch(
        &self,
        query: &WindowQuery,
        function: &SegmentedCacheFunction,
        forward: bool,
    ) -> Result<MemoryIterator<Vec<u8>, CacheEntry>> {
        if query.is_empty() {
            return Ok(MemoryIterator::empty());
        }
        let bounds = function.cache_range(query);
        if range_is_empty(&bounds) {
            return Ok(MemoryIterator::empty());
        }

        let schema = function.schema();
        let mut entries = Vec::new();
        let mut visit = |k: &Vec<u8>, v: &CacheEntry| -> Result<()> {
            if query.matches(schema, function.key(k)?)? {
                entries.push((k.clone(), v.clone()));
            }
            Ok(())
        };
        let range = self.map.range::<Vec<u8>, _>(bounds);
        if forward {
            for (k, v) in range {
                visit(k, v)?;
            }
        } else {
            for (k, v) in range.rev() {
                visit(k, v)?;
            }
        }
        debug!(
            "cache fetch matched {} entries (forward={})",
            entries.len(),
            forward
        );
        Ok(MemoryIterator::new(entries))
    }

    /// Returns every dirty entry in cache-key order and marks it clean.
    ///
    /// Tombstones are handed out once and then dropped: after the flush the
    /// store no longer holds the record they were hiding.
    pub fn take_dirty(&mut self) -> Vec<(Vec<u8>, Option<Vec<u8>>)> {
        let mut dirty = Vec::new();
        for (k, entry) in self.map.iter_mut() {
            if entry.dirty {
                entry.dirty = false;
                dirty.push((k.clone(), entry.value.clone()));
            }
        }

        let mut freed = 0;
        self.map.retain(|k, entry| {
            if entry.is_tombstone() {
                freed += k.len();
                false
            } else {
                true
            }
        });
        self.approx_size = self.approx_size.saturating_sub(freed);
        dirty
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Approximate bytes held (keys plus values).
    pub fn approx_size(&self) -> usize {
        self.approx_size
    }

    pub fn dirty_count(&self) -> usize {
        self.map.values().filter(|e| e.dirty).count()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.approx_size = 0;
    }
}

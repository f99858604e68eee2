/// Write path: `put()`, `delete()`, and `flush()`.
///
/// Mutations only touch the cache. Each write is encoded into a store key,
/// wrapped into its segment's cache key, and stored dirty. `flush()` hands
/// the dirty entries to the segmented store.
use anyhow::Result;
use log::debug;

use crate::{CachingWindowStore, MAX_KEY_SIZE, MAX_VALUE_SIZE, SEQNUM_MASK};

impl CachingWindowStore {
    /// Writes `value` for `key` in the window starting at `window_start`.
    ///
    /// Without `retain_duplicates` a second put to the same key and window
    /// overwrites the first. With it, every put gets the next sequence
    /// number and is kept.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>, window_start: i64) -> Result<()> {
        check_key(&key)?;
        anyhow::ensure!(
            value.len() <= MAX_VALUE_SIZE,
            "value too large: {} bytes (max {})",
            value.len(),
            MAX_VALUE_SIZE
        );
        check_window_start(window_start)?;

        let seq = self.next_seq();
        let store_key = self.config.schema.encode(&key, window_start, seq);
        let cache_key = self.function.cache_key(&store_key)?;
        self.cache.put(cache_key, value);
        Ok(())
    }

    /// Deletes the record for `key` in the window starting at `window_start`
    /// by caching a tombstone.
    ///
    /// With `retain_duplicates` there is no single record to delete, so the
    /// call is ignored.
    pub fn delete(&mut self, key: Vec<u8>, window_start: i64) -> Result<()> {
        check_key(&key)?;
        check_window_start(window_start)?;

        if self.config.retain_duplicates {
            debug!("delete ignored: store retains duplicates");
            return Ok(());
        }

        let store_key = self.config.schema.encode(&key, window_start, 0);
        let cache_key = self.function.cache_key(&store_key)?;
        self.cache.delete(cache_key);
        Ok(())
    }

    /// Applies every dirty cache entry to the segmented store and returns
    /// how many were applied. Tombstones become store deletes.
    ///
    /// # Errors
    ///
    /// Returns an error if a cached key does not decode. Entries before it
    /// have already been applied.
    pub fn flush(&mut self) -> Result<usize> {
        let dirty = self.cache.take_dirty();
        let mut puts = 0;
        let mut deletes = 0;
        for (cache_key, value) in &dirty {
            let store_key = self.function.key(cache_key)?;
            match value {
                Some(v) => {
                    self.store.put(store_key.to_vec(), v.clone())?;
                    puts += 1;
                }
                None => {
                    self.store.delete(store_key)?;
                    deletes += 1;
                }
            }
        }
        debug!(
            "flushed {} entries ({} puts, {} deletes), store now {} records in {} segments",
            dirty.len(),
            puts,
            deletes,
            self.store.len(),
            self.store.segment_count()
        );
        Ok(dirty.len())
    }

    fn next_seq(&mut self) -> u32 {
        if !self.config.retain_duplicates {
            return 0;
        }
        self.seq = self.seq.wrapping_add(1) & SEQNUM_MASK;
        self.seq
    }
}

pub(crate) fn check_key(key: &[u8]) -> Result<()> {
    anyhow::ensure!(!key.is_empty(), "key must not be empty");
    anyhow::ensure!(
        key.len() <= MAX_KEY_SIZE,
        "key too large: {} bytes (max {})",
        key.len(),
        MAX_KEY_SIZE
    );
    Ok(())
}

fn check_window_start(window_start: i64) -> Result<()> {
    anyhow::ensure!(
        window_start >= 0,
        "window start must not be negative: {}",
        window_start
    );
    Ok(())
}

/// Read path: `fetch_one()` and the range fetches.
///
/// Point lookups check the cache first (a tombstone there means "deleted"),
/// then the segmented store. Range fetches snapshot both sides for the same
/// [`WindowQuery`] and merge them.
use anyhow::Result;
use cursor::DelegatingPeekingIterator;
use log::{debug, warn};
use merge::MergedWindowIterator;
use windowkey::WindowQuery;

use crate::write::check_key;
use crate::{CachingWindowStore, WindowStoreIterator};

impl CachingWindowStore {
    /// Looks up the value of `key` in the window starting at `window_start`.
    ///
    /// With `retain_duplicates` this reads the sequence-0 record only, which
    /// puts never produce; use [`fetch`](Self::fetch) instead.
    pub fn fetch_one(&self, key: &[u8], window_start: i64) -> Result<Option<Vec<u8>>> {
        check_key(key)?;
        if window_start < 0 {
            return Ok(None);
        }
        let store_key = self.config.schema.encode(key, window_start, 0);
        let cache_key = self.function.cache_key(&store_key)?;
        if let Some(entry) = self.cache.get(&cache_key) {
            return Ok(entry.value.clone());
        }
        Ok(self.store.get(&store_key)?.map(<[u8]>::to_vec))
    }

    /// Every window of `key` starting in `[time_from, time_to]`, oldest first.
    pub fn fetch(&self, key: &[u8], time_from: i64, time_to: i64) -> Result<WindowStoreIterator> {
        check_key(key)?;
        self.merged(WindowQuery::single_key(key, time_from, time_to), true)
    }

    /// Like [`fetch`](Self::fetch), newest first.
    pub fn backward_fetch(
        &self,
        key: &[u8],
        time_from: i64,
        time_to: i64,
    ) -> Result<WindowStoreIterator> {
        check_key(key)?;
        self.merged(WindowQuery::single_key(key, time_from, time_to), false)
    }

    /// Windows of every key in `[key_from, key_to]` starting in
    /// `[time_from, time_to]`. A `None` key bound is open.
    pub fn fetch_range(
        &self,
        key_from: Option<&[u8]>,
        key_to: Option<&[u8]>,
        time_from: i64,
        time_to: i64,
    ) -> Result<WindowStoreIterator> {
        self.merged(range_query(key_from, key_to, time_from, time_to), true)
    }

    pub fn backward_fetch_range(
        &self,
        key_from: Option<&[u8]>,
        key_to: Option<&[u8]>,
        time_from: i64,
        time_to: i64,
    ) -> Result<WindowStoreIterator> {
        self.merged(range_query(key_from, key_to, time_from, time_to), false)
    }

    /// Windows of every key starting in `[time_from, time_to]`.
    pub fn fetch_all(&self, time_from: i64, time_to: i64) -> Result<WindowStoreIterator> {
        self.merged(WindowQuery::time_range(time_from, time_to), true)
    }

    pub fn backward_fetch_all(&self, time_from: i64, time_to: i64) -> Result<WindowStoreIterator> {
        self.merged(WindowQuery::time_range(time_from, time_to), false)
    }

    /// Every record in the store.
    pub fn all(&self) -> Result<WindowStoreIterator> {
        self.merged(WindowQuery::all(), true)
    }

    pub fn backward_all(&self) -> Result<WindowStoreIterator> {
        self.merged(WindowQuery::all(), false)
    }

    fn merged(&self, query: WindowQuery, forward: bool) -> Result<WindowStoreIterator> {
        if query.time_from() > query.time_to() {
            warn!(
                "returning empty iterator for fetch with invalid time range: from ({}) > to ({})",
                query.time_from(),
                query.time_to()
            );
        }
        if let (Some(from), Some(to)) = (query.key_from(), query.key_to()) {
            if from > to {
                warn!(
                    "returning empty iterator for fetch with invalid key range: from > to \
                     ({} bytes > {} bytes)",
                    from.len(),
                    to.len()
                );
            }
        }

        let cache = self.cache.fetch(&query, &self.function, forward)?;
        let store = self.store.fetch(&query, self.config.window_size, forward)?;
        debug!(
            "merging {} cached and {} stored entries (forward={})",
            cache.remaining(),
            store.remaining(),
            forward
        );
        Ok(MergedWindowIterator::new(
            DelegatingPeekingIterator::new("cache", cache),
            DelegatingPeekingIterator::new("store", store),
            self.config.schema,
            self.config.window_size,
            self.function,
            forward,
        ))
    }
}

fn range_query(
    key_from: Option<&[u8]>,
    key_to: Option<&[u8]>,
    time_from: i64,
    time_to: i64,
) -> WindowQuery {
    WindowQuery::key_range(
        key_from.map(<[u8]>::to_vec),
        key_to.map(<[u8]>::to_vec),
        time_from,
        time_to,
    )
}

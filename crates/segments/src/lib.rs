//! # Segments - time-partitioned window store
//!
//! The underlying store behind the window cache. Records are partitioned
//! into *segments* by window start; each segment is an ordered map from
//! encoded store key to value.
//!
//! ```text
//! segment_id = window_start / segment_interval
//!
//! ┌────────────┐   ┌─────────────────────────────────┐
//! │ segment 0  │ → │ store key → value (sorted)      │
//! ├────────────┤   ├─────────────────────────────────┤
//! │ segment 1  │ → │ store key → value (sorted)      │
//! ├────────────┤   ├─────────────────────────────────┤
//! │ ...        │   │                                 │
//! └────────────┘   └─────────────────────────────────┘
//! ```
//!
//! A scan walks the segments a query touches (ascending for a forward scan,
//! descending for a backward one) and yields each segment's matches before
//! moving on. Within a segment, order is store-key byte order. This is the
//! same segment-major order the cache produces, which is what lets the merge
//! compare the two sides by `(segment id, store key)`.
//!
//! Deletes are physical: the store holds no tombstones.

use cursor::MemoryIterator;
use log::debug;
use std::collections::BTreeMap;
use windowkey::{range_is_empty, KeySchema, Result, SequencedKey, WindowQuery};

/// Segment-partitioned ordered store of encoded window keys.
#[derive(Debug)]
pub struct SegmentedStore {
    schema: KeySchema,
    segment_interval: i64,
    segments: BTreeMap<i64, BTreeMap<Vec<u8>, Vec<u8>>>,
    len: usize,
    approx_size: usize,
}

impl SegmentedStore {
    /// Creates an empty store.
    ///
    /// # Panics
    ///
    /// Panics if `segment_interval` is not positive.
    pub fn new(schema: KeySchema, segment_interval: i64) -> Self {
        assert!(segment_interval > 0, "segment_interval must be > 0");
        Self {
            schema,
            segment_interval,
            segments: BTreeMap::new(),
            len: 0,
            approx_size: 0,
        }
    }

    #[must_use]
    pub fn schema(&self) -> KeySchema {
        self.schema
    }

    #[must_use]
    pub fn segment_interval(&self) -> i64 {
        self.segment_interval
    }

    /// Segment holding windows that start at `ts`. Negative timestamps clamp
    /// to segment 0.
    #[must_use]
    pub fn segment_id_for_timestamp(&self, ts: i64) -> i64 {
        ts.max(0) / self.segment_interval
    }

    fn segment_id(&self, store_key: &[u8]) -> Result<i64> {
        Ok(self.segment_id_for_timestamp(self.schema.extract_start(store_key)?))
    }

    /// Inserts or overwrites a record.
    ///
    /// # Errors
    ///
    /// Returns [`windowkey::Error::CorruptKey`] if `store_key` does not
    /// decode under the store's schema.
    pub fn put(&mut self, store_key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let segment_id = self.segment_id(&store_key)?;
        let key_len = store_key.len();
        let added = value.len();
        let segment = self.segments.entry(segment_id).or_default();
        match segment.insert(store_key, value) {
            Some(old) => {
                self.approx_size = self.approx_size.saturating_sub(old.len());
            }
            None => {
                self.len += 1;
                self.approx_size += key_len;
            }
        }
        self.approx_size += added;
        Ok(())
    }

    /// Removes a record. Returns `true` if it existed. A segment left empty
    /// is dropped.
    pub fn delete(&mut self, store_key: &[u8]) -> Result<bool> {
        let segment_id = self.segment_id(store_key)?;
        let Some(segment) = self.segments.get_mut(&segment_id) else {
            return Ok(false);
        };
        let Some(old) = segment.remove(store_key) else {
            return Ok(false);
        };
        if segment.is_empty() {
            self.segments.remove(&segment_id);
        }
        self.len -= 1;
        self.approx_size = self
            .approx_size
            .saturating_sub(store_key.len() + old.len());
        Ok(true)
    }

    /// Exact lookup of one encoded key.
    pub fn get(&self, store_key: &[u8]) -> Result<Option<&[u8]>> {
        let segment_id = self.segment_id(store_key)?;
        Ok(self
            .segments
            .get(&segment_id)
            .and_then(|segment| segment.get(store_key))
            .map(Vec::as_slice))
    }

    /// Number of live (non-empty) segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Ids of the live segments, ascending.
    pub fn segment_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.segments.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Approximate bytes held (keys plus values).
    #[must_use]
    pub fn approx_size(&self) -> usize {
        self.approx_size
    }

    /// Snapshot of every record matching `query`, segment-major. Each record
    /// comes back with the window `[start, start + window_size)`.
    ///
    /// # Errors
    ///
    /// Returns [`windowkey::Error::CorruptKey`] if a stored key in range does
    /// not decode under the store's schema.
    pub fn fetch(
        &self,
        query: &WindowQuery,
        window_size: i64,
        forward: bool,
    ) -> Result<MemoryIterator<SequencedKey, Vec<u8>>> {
        if query.is_empty() {
            return Ok(MemoryIterator::empty());
        }
        let bounds = self.schema.scan_bounds(query);
        if range_is_empty(&bounds) {
            return Ok(MemoryIterator::empty());
        }

        let seg_from = self.segment_id_for_timestamp(query.time_from());
        let seg_to = self.segment_id_for_timestamp(query.time_to());
        let touched = self.segments.range(seg_from..=seg_to);
        let touched: Vec<_> = if forward {
            touched.collect()
        } else {
            touched.rev().collect()
        };

        let mut entries = Vec::new();
        for (_, segment) in &touched {
            let range = segment.range::<Vec<u8>, _>(bounds.clone());
            if forward {
                for (k, v) in range {
                    if query.matches(self.schema, k)? {
                        entries.push((self.schema.decode_sequenced(k, window_size)?, v.clone()));
                    }
                }
            } else {
                for (k, v) in range.rev() {
                    if query.matches(self.schema, k)? {
                        entries.push((self.schema.decode_sequenced(k, window_size)?, v.clone()));
                    }
                }
            }
        }
        debug!(
            "store fetch scanned {} segments, matched {} entries (forward={})",
            touched.len(),
            entries.len(),
            forward
        );
        Ok(MemoryIterator::new(entries))
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.len = 0;
        self.approx_size = 0;
    }
}

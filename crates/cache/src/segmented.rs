//! Mapping between store keys and segment-scoped cache keys.

use byteorder::{BigEndian, ByteOrder};
use std::cmp::Ordering;
use std::ops::Bound;
use windowkey::{Error, KeySchema, Result, WindowQuery};

/// Bytes of the segment id prefixed to every cache key.
pub const SEGMENT_ID_BYTES: usize = 8;

/// Maps store keys to the cache keyspace of the segment they belong to.
///
/// ```text
/// cache key = segment_id (i64 BE) | store key
/// ```
///
/// Prefixing the segment id keeps every key of one segment contiguous in
/// the cache, and within a segment cache keys sort exactly like the store
/// keys they wrap. A scan can therefore walk the cache segment by segment,
/// in the same order the segmented store walks its segments.
///
/// The function is a pure mapping and holds no cache or store state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentedCacheFunction {
    schema: KeySchema,
    /// `None` puts every key in segment 0.
    segment_interval: Option<i64>,
}

impl SegmentedCacheFunction {
    /// Segments of `segment_interval` milliseconds of window start.
    ///
    /// # Panics
    ///
    /// Panics if `segment_interval` is not positive.
    pub fn new(schema: KeySchema, segment_interval: i64) -> Self {
        assert!(segment_interval > 0, "segment_interval must be > 0");
        Self {
            schema,
            segment_interval: Some(segment_interval),
        }
    }

    /// A function that places every key in segment 0.
    pub fn single_segment(schema: KeySchema) -> Self {
        Self {
            schema,
            segment_interval: None,
        }
    }

    #[must_use]
    pub fn schema(&self) -> KeySchema {
        self.schema
    }

    #[must_use]
    pub fn segment_interval(&self) -> Option<i64> {
        self.segment_interval
    }

    /// Segment holding windows that start at `ts`. Negative timestamps
    /// clamp to segment 0.
    #[must_use]
    pub fn segment_id_for_timestamp(&self, ts: i64) -> i64 {
        match self.segment_interval {
            Some(interval) => ts.max(0) / interval,
            None => 0,
        }
    }

    /// Segment of an encoded store key.
    pub fn segment_id(&self, store_key: &[u8]) -> Result<i64> {
        let start = self.schema.extract_start(store_key)?;
        Ok(self.segment_id_for_timestamp(start))
    }

    /// Wraps `store_key` into the cache key of its segment.
    pub fn cache_key(&self, store_key: &[u8]) -> Result<Vec<u8>> {
        let segment_id = self.segment_id(store_key)?;
        Ok(self.cache_key_in_segment(store_key, segment_id))
    }

    /// Wraps `store_key` with an explicit segment id. Also used for scan
    /// bounds, which are not themselves valid store keys.
    pub fn cache_key_in_segment(&self, store_key: &[u8], segment_id: i64) -> Vec<u8> {
        let mut buf = segment_prefix(segment_id);
        buf.extend_from_slice(store_key);
        buf
    }

    /// Strips the segment prefix, returning the wrapped store key.
    pub fn key<'a>(&self, cache_key: &'a [u8]) -> Result<&'a [u8]> {
        if cache_key.len() < SEGMENT_ID_BYTES {
            return Err(Error::CorruptKey(format!(
                "cache key too short: {} bytes",
                cache_key.len()
            )));
        }
        Ok(&cache_key[SEGMENT_ID_BYTES..])
    }

    /// Reads the segment id of a cache key.
    pub fn segment_of(&self, cache_key: &[u8]) -> Result<i64> {
        self.key(cache_key)?;
        Ok(BigEndian::read_i64(&cache_key[..SEGMENT_ID_BYTES]))
    }

    /// Orders a cache key against a store key: by segment first, then by
    /// the raw store-key bytes.
    ///
    /// This is the merge comparator. Both sides of a scan walk segments in
    /// the same order, so comparing segment ids first keeps the comparison
    /// consistent across segment boundaries.
    pub fn compare_segmented_keys(&self, cache_key: &[u8], store_key: &[u8]) -> Result<Ordering> {
        let cache_segment = self.segment_of(cache_key)?;
        let store_segment = self.segment_id(store_key)?;
        Ok(cache_segment
            .cmp(&store_segment)
            .then_with(|| cache_key[SEGMENT_ID_BYTES..].cmp(store_key)))
    }

    /// Cache-key bounds covering every segment a query can touch.
    ///
    /// Callers must not ask for the bounds of an empty query.
    pub fn cache_range(&self, query: &WindowQuery) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
        let (lower, upper) = self.schema.scan_bounds(query);
        let seg_from = self.segment_id_for_timestamp(query.time_from());
        let seg_to = self.segment_id_for_timestamp(query.time_to());

        let lower = match lower {
            Bound::Included(k) => Bound::Included(self.cache_key_in_segment(&k, seg_from)),
            Bound::Excluded(k) => Bound::Excluded(self.cache_key_in_segment(&k, seg_from)),
            Bound::Unbounded => Bound::Included(segment_prefix(seg_from)),
        };
        let upper = match upper {
            Bound::Included(k) => Bound::Included(self.cache_key_in_segment(&k, seg_to)),
            Bound::Excluded(k) => Bound::Excluded(self.cache_key_in_segment(&k, seg_to)),
            Bound::Unbounded => match seg_to.checked_add(1) {
                Some(next) => Bound::Excluded(segment_prefix(next)),
                None => Bound::Unbounded,
            },
        };
        (lower, upper)
    }
}

fn segment_prefix(segment_id: i64) -> Vec<u8> {
    let mut buf = vec![0u8; SEGMENT_ID_BYTES];
    BigEndian::write_i64(&mut buf, segment_id);
    buf
}

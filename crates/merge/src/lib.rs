//! # Merge - cache-over-store window iterator
//!
//! Combines a cache cursor and a store cursor over the same window query into
//! one sorted stream of `(WindowedKey, value)` pairs.
//!
//! ```text
//!  cache  (segment | store key → CacheEntry) ──┐
//!                                              ├─► MergedWindowIterator ─► (WindowedKey, value)
//!  store  (SequencedKey → value)  ─────────────┘
//! ```
//!
//! ## Rules
//!
//! | Situation                         | Result                                   |
//! |-----------------------------------|------------------------------------------|
//! | only one side has entries         | that side's head                         |
//! | cache head sorts first            | cache head                               |
//! | store head sorts first            | store head                               |
//! | both heads name the same key      | cache value; both sides advance          |
//! | winning cache head is a tombstone | skipped, along with a tied store record  |
//!
//! Heads are compared with
//! [`SegmentedCacheFunction::compare_segmented_keys`]: segment id first, then
//! raw store-key bytes. Store heads are re-encoded for the comparison only.
//! A backward scan reverses the comparison, so the merge emits in descending
//! order as long as both inputs descend too.
//!
//! Store records keep the window the store returned. Cache keys carry only a
//! window start, so their windows end at `start + window_size`.
//!
//! The cache is always at least as fresh as the store, which is why it wins
//! ties, and why a cached tombstone hides the store record it shadows.

use cache::{CacheEntry, SegmentedCacheFunction};
use cursor::PeekingKeyValueIterator;
use log::{trace, warn};
use std::cmp::Ordering;
use windowkey::{Error, KeySchema, Result, SequencedKey, WindowedKey};

/// Which side supplies the next merged entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Head {
    Cache,
    Store,
    /// Both heads name the same store key.
    Both,
}

/// Sorted merge of a cache cursor and a store cursor.
///
/// Both inputs must already be ordered segment-major in the scan direction.
/// The iterator owns both cursors; [`close`](Self::close) releases them, and
/// dropping the iterator closes whatever is still open.
pub struct MergedWindowIterator<C, S>
where
    C: PeekingKeyValueIterator<Key = Vec<u8>, Value = CacheEntry>,
    S: PeekingKeyValueIterator<Key = SequencedKey, Value = Vec<u8>>,
{
    cache: C,
    store: S,
    schema: KeySchema,
    window_size: i64,
    function: SegmentedCacheFunction,
    forward: bool,
    /// Set once `Iterator::next` has yielded an error.
    failed: bool,
}

impl<C, S> MergedWindowIterator<C, S>
where
    C: PeekingKeyValueIterator<Key = Vec<u8>, Value = CacheEntry>,
    S: PeekingKeyValueIterator<Key = SequencedKey, Value = Vec<u8>>,
{
    /// Builds a merge over two cursors produced by the same query.
    ///
    /// `schema` decodes cache keys and encodes store keys for comparison;
    /// `window_size` rebuilds the end of each cached window from its start;
    /// `function` strips and compares segment prefixes.
    pub fn new(
        cache: C,
        store: S,
        schema: KeySchema,
        window_size: i64,
        function: SegmentedCacheFunction,
        forward: bool,
    ) -> Self {
        debug_assert_eq!(schema, function.schema());
        Self {
            cache,
            store,
            schema,
            window_size,
            function,
            forward,
            failed: false,
        }
    }

    #[must_use]
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// Returns `true` if another live entry remains.
    ///
    /// Tombstones at the head are consumed first, so a `true` answer is
    /// always backed by an entry `next()` will return.
    pub fn has_next(&mut self) -> Result<bool> {
        Ok(self.skip_tombstones()?.is_some())
    }

    /// Decodes the next key without advancing either side.
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchElement`] when exhausted, [`Error::CorruptKey`] if the
    /// head key does not decode.
    pub fn peek_next_key(&mut self) -> Result<WindowedKey> {
        match self.skip_tombstones()? {
            None => Err(Error::NoSuchElement),
            Some(Head::Cache | Head::Both) => {
                let cache_key = self.cache.peek_next_key()?;
                let store_key = self.function.key(cache_key)?;
                self.schema.decode_windowed(store_key, self.window_size)
            }
            Some(Head::Store) => Ok(self.store.peek_next_key()?.windowed().clone()),
        }
    }

    /// Consumes and returns the next live entry.
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchElement`] when exhausted. Decode and cursor failures
    /// are returned unchanged.
    pub fn next(&mut self) -> Result<(WindowedKey, Vec<u8>)> {
        self.advance()?.ok_or(Error::NoSuchElement)
    }

    /// Closes the cache cursor, then the store cursor, and reports the first
    /// failure. The store is closed even if the cache fails to close.
    pub fn close(&mut self) -> Result<()> {
        let cache = self.cache.close();
        let store = self.store.close();
        if let (Err(_), Err(e)) = (&cache, &store) {
            warn!("store cursor also failed to close: {}", e);
        }
        cache.and(store)
    }

    fn advance(&mut self) -> Result<Option<(WindowedKey, Vec<u8>)>> {
        loop {
            let head = match self.next_head()? {
                Some(head) => head,
                None => return Ok(None),
            };
            if head == Head::Store {
                let (store_key, value) = self.store.next()?;
                return Ok(Some((store_key.into_windowed(), value)));
            }

            let (cache_key, entry) = self.cache.next()?;
            if head == Head::Both {
                self.store.next()?;
            }
            match entry.value {
                Some(value) => {
                    let store_key = self.function.key(&cache_key)?;
                    let key = self.schema.decode_windowed(store_key, self.window_size)?;
                    return Ok(Some((key, value)));
                }
                None => {
                    trace!(
                        "skipping cached tombstone ({} bytes, shadows store: {})",
                        cache_key.len(),
                        head == Head::Both
                    );
                }
            }
        }
    }

    /// Drops tombstones that win the head comparison, together with any
    /// store record they tie with, and returns the side holding the next
    /// live entry.
    fn skip_tombstones(&mut self) -> Result<Option<Head>> {
        loop {
            let head = match self.next_head()? {
                Some(head) => head,
                None => return Ok(None),
            };
            if head == Head::Store || !self.cache.peek_next()?.1.is_tombstone() {
                return Ok(Some(head));
            }
            let (cache_key, _) = self.cache.next()?;
            trace!(
                "skipping cached tombstone ({} bytes, shadows store: {})",
                cache_key.len(),
                head == Head::Both
            );
            if head == Head::Both {
                self.store.next()?;
            }
        }
    }

    fn next_head(&mut self) -> Result<Option<Head>> {
        let cache_has = self.cache.has_next()?;
        let store_has = self.store.has_next()?;
        let head = match (cache_has, store_has) {
            (false, false) => return Ok(None),
            (true, false) => Head::Cache,
            (false, true) => Head::Store,
            (true, true) => {
                let store_key = self.schema.encode_sequenced(self.store.peek_next_key()?);
                let cache_key = self.cache.peek_next_key()?;
                let ord = self.function.compare_segmented_keys(cache_key, &store_key)?;
                let ord = if self.forward { ord } else { ord.reverse() };
                match ord {
                    Ordering::Less => Head::Cache,
                    Ordering::Greater => Head::Store,
                    Ordering::Equal => Head::Both,
                }
            }
        };
        Ok(Some(head))
    }
}

/// Yields merged entries until exhaustion or the first error. After an
/// error the iterator is fused.
impl<C, S> Iterator for MergedWindowIterator<C, S>
where
    C: PeekingKeyValueIterator<Key = Vec<u8>, Value = CacheEntry>,
    S: PeekingKeyValueIterator<Key = SequencedKey, Value = Vec<u8>>,
{
    type Item = Result<(WindowedKey, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.advance() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl<C, S> std::fmt::Debug for MergedWindowIterator<C, S>
where
    C: PeekingKeyValueIterator<Key = Vec<u8>, Value = CacheEntry>,
    S: PeekingKeyValueIterator<Key = SequencedKey, Value = Vec<u8>>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedWindowIterator")
            .field("schema", &self.schema)
            .field("window_size", &self.window_size)
            .field("function", &self.function)
            .field("forward", &self.forward)
            .field("failed", &self.failed)
            .finish()
    }
}

#[cfg(test)]
mod tests;

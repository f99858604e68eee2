
use crate::MergedWindowIterator;
use cache::{CacheEntry, SegmentedCacheFunction};
use cursor::{DelegatingPeekingIterator, KeyValueIterator, MemoryIterator};
use std::cell::Cell;
use std::rc::Rc;
use windowkey::{Error, KeySchema, Result, SequencedKey, Window, WindowedKey};

pub(crate) const WINDOW_SIZE: i64 = 10;

pub(crate) type CacheCursor = DelegatingPeekingIterator<MemoryIterator<Vec<u8>, CacheEntry>>;
pub(crate) type StoreCursor = DelegatingPeekingIterator<MemoryIterator<SequencedKey, Vec<u8>>>;

/// A merge over two in-memory snapshots, already in scan order.
pub(crate) fn merge_of(
    function: SegmentedCacheFunction,
    cache: Vec<(Vec<u8>, CacheEntry)>,
    store: Vec<(SequencedKey, Vec<u8>)>,
    forward: bool,
) -> MergedWindowIterator<CacheCursor, StoreCursor> {
    MergedWindowIterator::new(
        DelegatingPeekingIterator::new("cache", MemoryIterator::new(cache)),
        DelegatingPeekingIterator::new("store", MemoryIterator::new(store)),
        function.schema(),
        WINDOW_SIZE,
        function,
        forward,
    )
}

/// `(key, window start, window end, value)` of every remaining entry.
pub(crate) fn drain<C, S>(
    merge: &mut MergedWindowIterator<C, S>,
) -> anyhow::Result<Vec<(String, i64, i64, String)>>
where
    C: cursor::PeekingKeyValueIterator<Key = Vec<u8>, Value = CacheEntry>,
    S: cursor::PeekingKeyValueIterator<Key = SequencedKey, Value = Vec<u8>>,
{
    let mut out = Vec::new();
    while merge.has_next()? {
        let (key, value) = merge.next()?;
        out.push((
            String::from_utf8(key.key().to_vec())?,
            key.window().start(),
            key.window().end(),
            String::from_utf8(value)?,
        ));
    }
    Ok(out)
}

/// A cursor that counts closes and can be told to fail.
pub(crate) struct FlakySource<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
    fail_on_poll: Option<usize>,
    polls: usize,
    fail_close: bool,
    closes: Rc<Cell<usize>>,
}

impl<K, V> FlakySource<K, V> {
    pub(crate) fn new(entries: Vec<(K, V)>, closes: Rc<Cell<usize>>) -> Self {
        Self {
            entries: entries.into_iter(),
            fail_on_poll: None,
            polls: 0,
            fail_close: false,
            closes,
        }
    }

    /// Fail the `n`th poll (0-based).
    pub(crate) fn failing_on_poll(mut self, n: usize) -> Self {
        self.fail_on_poll = Some(n);
        self
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

impl<K, V> KeyValueIterator for FlakySource<K, V> {
    type Key = K;
    type Value = V;

    fn next_entry(&mut self) -> Result<Option<(K, V)>> {
        let poll = self.polls;
        self.polls += 1;
        if self.fail_on_poll == Some(poll) {
            return Err(Error::source(
                "flaky",
                std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
            ));
        }
        Ok(self.entries.next())
    }

    fn close(&mut self) -> Result<()> {
        self.closes.set(self.closes.get() + 1);
        if self.fail_close {
            return Err(Error::source(
                "flaky",
                std::io::Error::new(std::io::ErrorKind::Other, "close failed"),
            ));
        }
        Ok(())
    }
}

pub(crate) fn single(schema: KeySchema) -> SegmentedCacheFunction {
    SegmentedCacheFunction::single_segment(schema)
}

/// A store record for `key` in `[start, end)`, sequence 0.
pub(crate) fn store_record(key: &[u8], start: i64, end: i64) -> SequencedKey {
    SequencedKey::new(WindowedKey::new(key.to_vec(), Window::new(start, end).unwrap()), 0)
}

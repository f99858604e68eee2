//! # Engine - EddyKV caching window store
//!
//! Ties the [`cache`], [`segments`], and [`merge`] crates together into a
//! window store with a write-through cache in front of a segmented store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────────┐
//! │               CACHING WINDOW STORE                │
//! │                                                   │
//! │ write.rs → encode store key → WindowCache (dirty) │
//! │              |                                    │
//! │              |  flush()                           │
//! │              v                                    │
//! │           SegmentedStore (put / delete)           │
//! │                                                   │
//! │ read.rs → WindowQuery                             │
//! │            ├─► cache.fetch ─┐                     │
//! │            └─► store.fetch ─┴─► MergedWindowIterator
//! │                (cache wins ties, tombstones hide) │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                  |
//! |--------------|----------------------------------------------------------|
//! | [`lib.rs`]   | `CachingWindowStore` struct, constructor, accessors, `Debug` |
//! | [`write`]    | `put()`, `delete()`, `flush()`                           |
//! | [`read`]     | `fetch_one()`, `fetch*()`, `backward_fetch*()`, `all()`  |
//!
//! ## Freshness
//!
//! ```text
//! ┌────────────────────────────┐  ← freshest, wins on equal keys
//! │ WINDOW CACHE (+tombstones) │
//! ├────────────────────────────┤
//! │ SEGMENTED STORE            │
//! └────────────────────────────┘
//! ```
//!
//! Reads return snapshot iterators: a write made after a fetch is not seen
//! by that fetch's iterator.

mod read;
mod write;

use anyhow::Result;
use cache::{CacheEntry, SegmentedCacheFunction, WindowCache};
use config::StoreConfig;
use cursor::{DelegatingPeekingIterator, MemoryIterator};
use merge::MergedWindowIterator;
use segments::SegmentedStore;
use windowkey::{KeySchema, SequencedKey};

/// Maximum allowed key size in bytes (64 KiB).
pub const MAX_KEY_SIZE: usize = 64 * 1024;
/// Maximum allowed value size in bytes (10 MiB).
pub const MAX_VALUE_SIZE: usize = 10 * 1024 * 1024;

/// Sequence numbers used with `retain_duplicates` wrap within 31 bits.
pub const SEQNUM_MASK: u32 = 0x7FFF_FFFF;

pub type CacheCursor = DelegatingPeekingIterator<MemoryIterator<Vec<u8>, CacheEntry>>;
pub type StoreCursor = DelegatingPeekingIterator<MemoryIterator<SequencedKey, Vec<u8>>>;

/// Iterator returned by every range read of [`CachingWindowStore`].
pub type WindowStoreIterator = MergedWindowIterator<CacheCursor, StoreCursor>;

/// A window store whose writes land in a cache and reach the segmented store
/// on [`flush`](CachingWindowStore::flush).
///
/// # Write Path
///
/// 1. Validate key and value sizes.
/// 2. Encode `(key, window start, seq)` under the configured schema.
/// 3. Insert into the cache under the segment-prefixed cache key, dirty.
///
/// # Read Path
///
/// 1. Build one [`windowkey::WindowQuery`].
/// 2. Snapshot the matching cache entries (tombstones included) and store
///    records, both segment-major in the scan direction.
/// 3. Merge them; the cache wins ties and its tombstones hide store records.
pub struct CachingWindowStore {
    pub(crate) config: StoreConfig,
    pub(crate) function: SegmentedCacheFunction,
    pub(crate) cache: WindowCache,
    pub(crate) store: SegmentedStore,
    /// Last sequence number handed out when duplicates are retained.
    pub(crate) seq: u32,
}

impl std::fmt::Debug for CachingWindowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingWindowStore")
            .field("schema", &self.config.schema)
            .field("window_size", &self.config.window_size)
            .field("segment_interval", &self.config.segment_interval)
            .field("retain_duplicates", &self.config.retain_duplicates)
            .field("seq", &self.seq)
            .field("cache_entries", &self.cache.len())
            .field("cache_dirty", &self.cache.dirty_count())
            .field("cache_size", &self.cache.approx_size())
            .field("store_entries", &self.store.len())
            .field("store_segments", &self.store.segment_count())
            .field("store_size", &self.store.approx_size())
            .finish()
    }
}

impl CachingWindowStore {
    /// Creates an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`StoreConfig::validate`].
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            function: SegmentedCacheFunction::new(config.schema, config.segment_interval),
            cache: WindowCache::new(),
            store: SegmentedStore::new(config.schema, config.segment_interval),
            seq: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn schema(&self) -> KeySchema {
        self.config.schema
    }

    #[must_use]
    pub fn window_size(&self) -> i64 {
        self.config.window_size
    }

    /// Entries held by the cache, tombstones included.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Cache entries not yet flushed to the store.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.cache.dirty_count()
    }

    /// Records held by the segmented store.
    #[must_use]
    pub fn store_len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.store.segment_count()
    }
}

#[cfg(test)]
mod tests;

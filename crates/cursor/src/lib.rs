//! # Cursor - sorted key/value iterators with lookahead
//!
//! The window store reads from two sorted sources, the write-through cache
//! and the segmented store, and merges them. Both sides are consumed through
//! the same two traits:
//!
//! - [`KeyValueIterator`]: a plain sorted cursor as the collaborator hands it
//!   out. It only knows how to produce its next entry and release itself.
//! - [`PeekingKeyValueIterator`]: the same cursor with a non-consuming look at
//!   its head, which is what a two-way merge needs to pick a side.
//!
//! [`DelegatingPeekingIterator`] turns the former into the latter by buffering
//! exactly one entry. [`MemoryIterator`] is a snapshot cursor over an owned
//! `Vec`, used by the in-memory cache and store.
//!
//! ```text
//!  source.next_entry() ──► [ pending head: Option<(K, V)> ] ──► next()
//!                                    │
//!                                    └── peek_next_key() (no advance)
//! ```
//!
//! ## Lifecycle
//!
//! Every cursor must be closed exactly once. `close()` on the adapter is
//! idempotent, and dropping an unclosed adapter closes its source. After
//! `close()` every other call fails with [`Error::Closed`].

mod memory;
mod peeking;

pub use memory::MemoryIterator;
pub use peeking::DelegatingPeekingIterator;
pub use windowkey::{Error, Result};

/// A sorted cursor over `(key, value)` pairs.
pub trait KeyValueIterator {
    type Key;
    type Value;

    /// Returns the next entry, or `None` once the cursor is exhausted.
    ///
    /// # Errors
    ///
    /// Collaborator failures are reported as [`Error::Source`].
    fn next_entry(&mut self) -> Result<Option<(Self::Key, Self::Value)>>;

    /// Releases any resources held by the cursor.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A sorted cursor that can look at its next entry without consuming it.
pub trait PeekingKeyValueIterator {
    type Key;
    type Value;

    /// Returns `true` if another entry is available.
    fn has_next(&mut self) -> Result<bool>;

    /// Borrows the next entry without advancing.
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchElement`] if the cursor is exhausted.
    fn peek_next(&mut self) -> Result<(&Self::Key, &Self::Value)>;

    /// Borrows the next key without advancing.
    fn peek_next_key(&mut self) -> Result<&Self::Key> {
        self.peek_next().map(|(k, _)| k)
    }

    /// Consumes and returns the next entry.
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchElement`] if the cursor is exhausted.
    fn next(&mut self) -> Result<(Self::Key, Self::Value)>;

    fn close(&mut self) -> Result<()>;
}

impl<T: KeyValueIterator + ?Sized> KeyValueIterator for Box<T> {
    type Key = T::Key;
    type Value = T::Value;

    fn next_entry(&mut self) -> Result<Option<(Self::Key, Self::Value)>> {
        (**self).next_entry()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<T: PeekingKeyValueIterator + ?Sized> PeekingKeyValueIterator for Box<T> {
    type Key = T::Key;
    type Value = T::Value;

    fn has_next(&mut self) -> Result<bool> {
        (**self).has_next()
    }

    fn peek_next(&mut self) -> Result<(&Self::Key, &Self::Value)> {
        (**self).peek_next()
    }

    fn next(&mut self) -> Result<(Self::Key, Self::Value)> {
        (**self).next()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

//! Time windows and windowed keys.

use std::fmt;

use crate::{Error, Result};

/// A half-open time interval `[start, end)` in milliseconds.
///
/// Windows order by `start`, then by `end`. A window never has a negative
/// start: store keys encode the start as a big-endian `i64`, which only sorts
/// numerically for non-negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Window {
    start: i64,
    end: i64,
}

impl Window {
    /// Creates the window `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] unless `0 <= start < end`.
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start < 0 || end <= start {
            return Err(Error::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates the window `[start, start + size)`, saturating the end at
    /// `i64::MAX`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] if `start` is negative, `size` is not
    /// positive, or `start == i64::MAX`.
    pub fn from_start(start: i64, size: i64) -> Result<Self> {
        if size <= 0 {
            return Err(Error::InvalidWindow {
                start,
                end: start.saturating_add(size),
            });
        }
        Self::new(start, start.saturating_add(size))
    }

    /// Inclusive start timestamp.
    #[must_use]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Exclusive end timestamp.
    #[must_use]
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Returns `true` if `ts` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts < self.end
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})", self.start, self.end)
    }
}

/// The logical identity of a record in a window store: raw key bytes plus
/// the window the record was aggregated into.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowedKey {
    key: Vec<u8>,
    window: Window,
}

impl WindowedKey {
    pub fn new(key: Vec<u8>, window: Window) -> Self {
        Self { key, window }
    }

    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Consumes the windowed key, returning the raw key bytes and window.
    pub fn into_parts(self) -> (Vec<u8>, Window) {
        (self.key, self.window)
    }
}

impl fmt::Display for WindowedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", String::from_utf8_lossy(&self.key), self.window)
    }
}

/// A windowed key as the store hands it back: the logical key, the window
/// it was written under, and its duplicate sequence number.
///
/// The store owns its windows. A merge re-encodes the key only to compare it
/// against cache keys and passes the window through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequencedKey {
    windowed: WindowedKey,
    seq: u32,
}

impl SequencedKey {
    pub fn new(windowed: WindowedKey, seq: u32) -> Self {
        Self { windowed, seq }
    }

    #[must_use]
    pub fn windowed(&self) -> &WindowedKey {
        &self.windowed
    }

    #[must_use]
    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn into_windowed(self) -> WindowedKey {
        self.windowed
    }
}

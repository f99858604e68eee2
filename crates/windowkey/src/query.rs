//! Key and time ranges of a window-store scan.

use std::ops::Bound;

use crate::{KeySchema, Result};

/// A scan over `[key_from, key_to] x [time_from, time_to]`, both ends
/// inclusive. A missing key bound is open on that side.
///
/// Time bounds select on the window *start*.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowQuery {
    key_from: Option<Vec<u8>>,
    key_to: Option<Vec<u8>>,
    time_from: i64,
    time_to: i64,
}

impl WindowQuery {
    /// All windows of one key starting in `[time_from, time_to]`.
    pub fn single_key(key: impl Into<Vec<u8>>, time_from: i64, time_to: i64) -> Self {
        let key = key.into();
        Self {
            key_from: Some(key.clone()),
            key_to: Some(key),
            time_from,
            time_to,
        }
    }

    pub fn key_range(
        key_from: Option<Vec<u8>>,
        key_to: Option<Vec<u8>>,
        time_from: i64,
        time_to: i64,
    ) -> Self {
        Self {
            key_from,
            key_to,
            time_from,
            time_to,
        }
    }

    /// Every key whose window starts in `[time_from, time_to]`.
    pub fn time_range(time_from: i64, time_to: i64) -> Self {
        Self::key_range(None, None, time_from, time_to)
    }

    /// Every record.
    pub fn all() -> Self {
        Self::time_range(0, i64::MAX)
    }

    #[must_use]
    pub fn key_from(&self) -> Option<&[u8]> {
        self.key_from.as_deref()
    }

    #[must_use]
    pub fn key_to(&self) -> Option<&[u8]> {
        self.key_to.as_deref()
    }

    #[must_use]
    pub fn time_from(&self) -> i64 {
        self.time_from
    }

    #[must_use]
    pub fn time_to(&self) -> i64 {
        self.time_to
    }

    /// The key, if both key bounds name the same one.
    #[must_use]
    pub fn exact_key(&self) -> Option<&[u8]> {
        match (&self.key_from, &self.key_to) {
            (Some(from), Some(to)) if from == to => Some(from),
            _ => None,
        }
    }

    /// `true` if no record can match: an inverted key or time range, or a
    /// time range entirely before zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        if self.time_from > self.time_to || self.time_to < 0 {
            return true;
        }
        matches!((&self.key_from, &self.key_to), (Some(from), Some(to)) if from > to)
    }

    /// Applies the exact predicate to an encoded store key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CorruptKey`] if `store_key` does not decode
    /// under `schema`.
    pub fn matches(&self, schema: KeySchema, store_key: &[u8]) -> Result<bool> {
        let key = schema.extract_key(store_key)?;
        let start = schema.extract_start(store_key)?;

        if start < self.time_from || start > self.time_to {
            return Ok(false);
        }
        if let Some(from) = self.key_from.as_deref() {
            if key < from {
                return Ok(false);
            }
        }
        if let Some(to) = self.key_to.as_deref() {
            if key > to {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// `true` if no byte string lies inside `bounds`.
///
/// `BTreeMap::range` panics on inverted bounds; scans check this first.
#[must_use]
pub fn range_is_empty(bounds: &(Bound<Vec<u8>>, Bound<Vec<u8>>)) -> bool {
    match bounds {
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (Bound::Included(lo), Bound::Excluded(hi))
        | (Bound::Excluded(lo), Bound::Included(hi))
        | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
        _ => false,
    }
}

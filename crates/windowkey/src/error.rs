//! Error type shared by every crate on the window-store read path.

use thiserror::Error;

/// Errors raised while encoding, decoding, or iterating windowed keys.
#[derive(Debug, Error)]
pub enum Error {
    /// Advancing or peeking past the end of an iterator.
    ///
    /// Recoverable: callers should check `has_next()` first.
    #[error("no such element")]
    NoSuchElement,

    /// An operation was attempted on an iterator after `close()`.
    #[error("iterator '{0}' has been closed")]
    Closed(String),

    /// A store or cache key could not be decoded. Fatal to the current scan.
    #[error("corrupt key: {0}")]
    CorruptKey(String),

    /// A window with a negative start or a non-positive length.
    #[error("invalid window [{start}, {end})")]
    InvalidWindow { start: i64, end: i64 },

    /// An underlying cache or store cursor failed.
    #[error("{name} source failed: {source}")]
    Source {
        /// Name of the failing side (`"cache"`, `"store"`, ...).
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Wraps an arbitrary collaborator error as [`Error::Source`].
    pub fn source<E>(name: impl Into<String>, err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Source {
            name: name.into(),
            source: err.into(),
        }
    }

    /// Returns `true` for [`Error::NoSuchElement`].
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::NoSuchElement)
    }
}

/// Result alias used across the read path.
pub type Result<T> = std::result::Result<T, Error>;

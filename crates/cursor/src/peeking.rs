use log::warn;

use crate::{Error, KeyValueIterator, PeekingKeyValueIterator, Result};

/// Adds one-entry lookahead to any [`KeyValueIterator`].
///
/// The head is fetched lazily on the first `has_next`/`peek_*` call and held
/// until `next()` hands it out, so the source is never advanced twice for
/// one entry. Once the source reports exhaustion it is not polled again.
pub struct DelegatingPeekingIterator<I: KeyValueIterator> {
    /// Shown in [`Error::Closed`] and in log lines (`"cache"`, `"store"`).
    name: String,
    inner: I,
    head: Option<(I::Key, I::Value)>,
    exhausted: bool,
    closed: bool,
}

impl<I: KeyValueIterator> DelegatingPeekingIterator<I> {
    pub fn new(name: impl Into<String>, inner: I) -> Self {
        Self {
            name: name.into(),
            inner,
            head: None,
            exhausted: false,
            closed: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed(self.name.clone()));
        }
        Ok(())
    }
}

impl<I: KeyValueIterator> PeekingKeyValueIterator for DelegatingPeekingIterator<I> {
    type Key = I::Key;
    type Value = I::Value;

    fn has_next(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if self.head.is_some() {
            return Ok(true);
        }
        if self.exhausted {
            return Ok(false);
        }
        match self.inner.next_entry()? {
            Some(entry) => {
                self.head = Some(entry);
                Ok(true)
            }
            None => {
                self.exhausted = true;
                Ok(false)
            }
        }
    }

    fn peek_next(&mut self) -> Result<(&Self::Key, &Self::Value)> {
        if !self.has_next()? {
            return Err(Error::NoSuchElement);
        }
        match &self.head {
            Some((k, v)) => Ok((k, v)),
            None => Err(Error::NoSuchElement),
        }
    }

    fn next(&mut self) -> Result<(Self::Key, Self::Value)> {
        if !self.has_next()? {
            return Err(Error::NoSuchElement);
        }
        self.head.take().ok_or(Error::NoSuchElement)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.head = None;
        self.inner.close()
    }
}

impl<I: KeyValueIterator> Drop for DelegatingPeekingIterator<I> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.inner.close() {
                warn!("failed to close {} iterator on drop: {}", self.name, e);
            }
        }
    }
}

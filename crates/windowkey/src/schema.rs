//! The three interchangeable store-key layouts.
//!
//! ```text
//! Window     key ‖ start:i64 BE ‖ seq:u32 BE
//! KeyFirst   0x01 ‖ key ‖ start:i64 BE ‖ seq:u32 BE
//! TimeFirst  0x00 ‖ start:i64 BE ‖ key ‖ seq:u32 BE
//! ```
//!
//! Store keys are always compared as raw bytes, so the field order decides
//! which scans are cheap: the key-major layouts keep every window of one key
//! together, the time-major layout keeps every key of one time range
//! together.

use byteorder::{BigEndian, ByteOrder};
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;
use thiserror::Error;

use crate::{Error, Result, SequencedKey, Window, WindowQuery, WindowedKey};

/// Bytes used by the encoded window start.
pub const TIMESTAMP_SIZE: usize = 8;

/// Bytes used by the encoded sequence number.
pub const SEQNUM_SIZE: usize = 4;

/// Fixed-size trailer of the key-major layouts.
pub const SUFFIX_SIZE: usize = TIMESTAMP_SIZE + SEQNUM_SIZE;

/// Tag byte opening every [`KeySchema::TimeFirst`] key.
pub const TIME_FIRST_PREFIX: u8 = 0x00;

/// Tag byte opening every [`KeySchema::KeyFirst`] key.
pub const KEY_FIRST_PREFIX: u8 = 0x01;

/// Binary layout of a store key.
///
/// Exactly one schema is bound per store; the cache and the store of one
/// scan must agree on it, otherwise the merged ordering is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeySchema {
    /// Untagged key-major layout, optimised for "all windows of key K".
    #[default]
    Window,
    /// Tagged key-major layout sharing a keyspace with [`KeySchema::TimeFirst`].
    KeyFirst,
    /// Tagged time-major layout, optimised for "all keys in `[t1, t2]`".
    TimeFirst,
}

impl KeySchema {
    /// Every schema, in declaration order.
    pub const ALL: [KeySchema; 3] = [KeySchema::Window, KeySchema::KeyFirst, KeySchema::TimeFirst];

    /// The tag byte, if this layout carries one.
    #[must_use]
    pub fn prefix(&self) -> Option<u8> {
        match self {
            KeySchema::Window => None,
            KeySchema::KeyFirst => Some(KEY_FIRST_PREFIX),
            KeySchema::TimeFirst => Some(TIME_FIRST_PREFIX),
        }
    }

    fn header_len(&self) -> usize {
        usize::from(self.prefix().is_some())
    }

    /// Smallest valid encoding (an empty user key).
    #[must_use]
    pub fn min_len(&self) -> usize {
        self.header_len() + SUFFIX_SIZE
    }

    /// Encodes `(key, window_start, seq)` into a store key.
    pub fn encode(&self, key: &[u8], window_start: i64, seq: u32) -> Vec<u8> {
        let mut ts = [0u8; TIMESTAMP_SIZE];
        BigEndian::write_i64(&mut ts, window_start);
        let mut sq = [0u8; SEQNUM_SIZE];
        BigEndian::write_u32(&mut sq, seq);

        let mut buf = Vec::with_capacity(self.min_len() + key.len());
        match self {
            KeySchema::Window => {
                buf.extend_from_slice(key);
                buf.extend_from_slice(&ts);
            }
            KeySchema::KeyFirst => {
                buf.push(KEY_FIRST_PREFIX);
                buf.extend_from_slice(key);
                buf.extend_from_slice(&ts);
            }
            KeySchema::TimeFirst => {
                buf.push(TIME_FIRST_PREFIX);
                buf.extend_from_slice(&ts);
                buf.extend_from_slice(key);
            }
        }
        buf.extend_from_slice(&sq);
        buf
    }

    fn check(&self, bytes: &[u8]) -> Result<()> {
        if bytes.len() < self.min_len() {
            return Err(Error::CorruptKey(format!(
                "{} key too short: {} bytes (min {})",
                self,
                bytes.len(),
                self.min_len()
            )));
        }
        if let Some(tag) = self.prefix() {
            if bytes[0] != tag {
                return Err(Error::CorruptKey(format!(
                    "unexpected tag {:#04x} for {} key (want {:#04x})",
                    bytes[0], self, tag
                )));
            }
        }
        Ok(())
    }

    /// Borrows the user key out of a store key.
    pub fn extract_key<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8]> {
        self.check(bytes)?;
        let len = bytes.len();
        Ok(match self {
            KeySchema::Window => &bytes[..len - SUFFIX_SIZE],
            KeySchema::KeyFirst => &bytes[1..len - SUFFIX_SIZE],
            KeySchema::TimeFirst => &bytes[1 + TIMESTAMP_SIZE..len - SEQNUM_SIZE],
        })
    }

    /// Reads the window start. Segment assignment is derived from it.
    pub fn extract_start(&self, bytes: &[u8]) -> Result<i64> {
        self.check(bytes)?;
        let len = bytes.len();
        let ts = match self {
            KeySchema::Window | KeySchema::KeyFirst => &bytes[len - SUFFIX_SIZE..len - SEQNUM_SIZE],
            KeySchema::TimeFirst => &bytes[1..1 + TIMESTAMP_SIZE],
        };
        Ok(BigEndian::read_i64(ts))
    }

    /// Reads the trailing sequence number.
    pub fn extract_seq(&self, bytes: &[u8]) -> Result<u32> {
        self.check(bytes)?;
        Ok(BigEndian::read_u32(&bytes[bytes.len() - SEQNUM_SIZE..]))
    }

    /// Decodes a store key into `(key, window_start, seq)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptKey`] if the bytes are too short or carry the
    /// wrong tag.
    pub fn decode(&self, bytes: &[u8]) -> Result<(Vec<u8>, i64, u32)> {
        let key = self.extract_key(bytes)?.to_vec();
        let start = self.extract_start(bytes)?;
        let seq = self.extract_seq(bytes)?;
        Ok((key, start, seq))
    }

    /// Decodes a store key into a [`WindowedKey`] whose window is
    /// `[start, start + window_size)`.
    pub fn decode_windowed(&self, bytes: &[u8], window_size: i64) -> Result<WindowedKey> {
        let key = self.extract_key(bytes)?;
        let start = self.extract_start(bytes)?;
        if start < 0 {
            return Err(Error::CorruptKey(format!("negative window start {start}")));
        }
        let window = Window::from_start(start, window_size)?;
        Ok(WindowedKey::new(key.to_vec(), window))
    }

    /// Like [`decode_windowed`](Self::decode_windowed), keeping the
    /// sequence number.
    pub fn decode_sequenced(&self, bytes: &[u8], window_size: i64) -> Result<SequencedKey> {
        let windowed = self.decode_windowed(bytes, window_size)?;
        Ok(SequencedKey::new(windowed, self.extract_seq(bytes)?))
    }

    /// Store-key bytes of `key`. Only the window start is encoded; the end
    /// does not take part in ordering.
    pub fn encode_sequenced(&self, key: &SequencedKey) -> Vec<u8> {
        let windowed = key.windowed();
        self.encode(windowed.key(), windowed.window().start(), key.seq())
    }

    /// Byte bounds enclosing every store key that can satisfy `query`.
    ///
    /// The bounds are conservative: keys inside them still have to pass
    /// [`WindowQuery::matches`]. Callers must not ask for the bounds of an
    /// empty query.
    pub fn scan_bounds(&self, query: &WindowQuery) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
        let time_from = query.time_from().max(0);
        let time_to = query.time_to();

        match self {
            KeySchema::Window | KeySchema::KeyFirst => {
                if let Some(key) = query.exact_key() {
                    return (
                        Bound::Included(self.encode(key, time_from, 0)),
                        Bound::Included(self.encode(key, time_to, u32::MAX)),
                    );
                }

                let header: Vec<u8> = self.prefix().into_iter().collect();
                let lower = match query.key_from() {
                    Some(from) => Bound::Included([header.as_slice(), from].concat()),
                    None if header.is_empty() => Bound::Unbounded,
                    None => Bound::Included(header.clone()),
                };
                // Every key in [key_from, key_to] starts with their common
                // prefix, whatever suffix the layout appends to it.
                let common = common_prefix(query.key_from(), query.key_to());
                let upper = match successor(&[header.as_slice(), common].concat()) {
                    Some(s) => Bound::Excluded(s),
                    None => Bound::Unbounded,
                };
                (lower, upper)
            }
            KeySchema::TimeFirst => {
                let lower = Bound::Included(time_prefix(time_from));
                let upper = match time_to.checked_add(1) {
                    Some(next) => Bound::Excluded(time_prefix(next)),
                    None => Bound::Excluded(vec![TIME_FIRST_PREFIX + 1]),
                };
                (lower, upper)
            }
        }
    }
}

fn time_prefix(ts: i64) -> Vec<u8> {
    let mut buf = vec![TIME_FIRST_PREFIX; 1 + TIMESTAMP_SIZE];
    BigEndian::write_i64(&mut buf[1..], ts);
    buf
}

fn common_prefix<'a>(a: Option<&'a [u8]>, b: Option<&[u8]>) -> &'a [u8] {
    match (a, b) {
        (Some(a), Some(b)) => {
            let n = a.iter().zip(b).take_while(|(x, y)| x == y).count();
            &a[..n]
        }
        _ => &[],
    }
}

/// Smallest byte string greater than every string starting with `prefix`,
/// or `None` if no such string exists (empty or all `0xFF`).
pub fn successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut out = prefix.to_vec();
    while let Some(last) = out.pop() {
        if last < u8::MAX {
            out.push(last + 1);
            return Some(out);
        }
    }
    None
}

impl fmt::Display for KeySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeySchema::Window => "window",
            KeySchema::KeyFirst => "key-first",
            KeySchema::TimeFirst => "time-first",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown schema name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key schema '{0}' (expected window, key-first or time-first)")]
pub struct ParseSchemaError(pub String);

impl FromStr for KeySchema {
    type Err = ParseSchemaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "window" | "default" => Ok(KeySchema::Window),
            "key-first" | "key_first" | "keyfirst" => Ok(KeySchema::KeyFirst),
            "time-first" | "time_first" | "timefirst" => Ok(KeySchema::TimeFirst),
            other => Err(ParseSchemaError(other.to_string())),
        }
    }
}

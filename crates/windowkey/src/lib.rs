//! # Windowkey - windowed store keys
//!
//! Value types and binary key layouts for the EddyKV window store.
//!
//! A record in a window store is identified by a [`WindowedKey`]: the raw
//! user key plus the time [`Window`] it was aggregated into. On disk and in
//! the cache the pair is flattened, together with a sequence number that
//! separates duplicates of the same key and window, into a single byte
//! string whose lexicographic order is the store's sort order.
//!
//! ## Layouts
//!
//! ```text
//! ┌────────────┬──────────────────────────────────────────────┐
//! │ Window     │ key | start (i64 BE) | seq (u32 BE)          │
//! ├────────────┼──────────────────────────────────────────────┤
//! │ KeyFirst   │ 0x01 | key | start (i64 BE) | seq (u32 BE)   │
//! ├────────────┼──────────────────────────────────────────────┤
//! │ TimeFirst  │ 0x00 | start (i64 BE) | key | seq (u32 BE)   │
//! └────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Only the window *start* is stored. Decoding rebuilds the window from the
//! store's fixed window size.
//!
//! | Schema      | Cheap scan                               |
//! |-------------|------------------------------------------|
//! | `Window`    | all windows of one key                   |
//! | `KeyFirst`  | all windows of one key (tagged keyspace) |
//! | `TimeFirst` | all keys whose window starts in a range  |
//!
//! ## Example
//!
//! ```rust
//! use windowkey::KeySchema;
//!
//! let schema = KeySchema::TimeFirst;
//! let bytes = schema.encode(b"user-1", 60_000, 0);
//! let (key, start, seq) = schema.decode(&bytes).unwrap();
//! assert_eq!((key.as_slice(), start, seq), (&b"user-1"[..], 60_000, 0));
//! ```

mod error;
mod query;
mod schema;
mod window;

pub use error::{Error, Result};
pub use query::{range_is_empty, WindowQuery};
pub use schema::{
    successor, KeySchema, ParseSchemaError, KEY_FIRST_PREFIX, SEQNUM_SIZE, SUFFIX_SIZE,
    TIMESTAMP_SIZE, TIME_FIRST_PREFIX,
};
pub use window::{SequencedKey, Window, WindowedKey};

#[cfg(test)]
mod tests;

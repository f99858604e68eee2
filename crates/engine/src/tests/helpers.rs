use crate::{CachingWindowStore, WindowStoreIterator};
use config::StoreConfig;
use windowkey::KeySchema;

pub const WINDOW_SIZE: i64 = 10;
pub const SEGMENT_INTERVAL: i64 = 100;

pub fn store_with(schema: KeySchema, retain_duplicates: bool) -> CachingWindowStore {
    CachingWindowStore::new(StoreConfig {
        window_size: WINDOW_SIZE,
        segment_interval: SEGMENT_INTERVAL,
        schema,
        retain_duplicates,
    })
    .unwrap()
}

pub fn store(schema: KeySchema) -> CachingWindowStore {
    store_with(schema, false)
}

/// `(key, window start, window end, value)` of every entry.
pub fn collect(iter: WindowStoreIterator) -> anyhow::Result<Vec<(String, i64, i64, String)>> {
    let mut out = Vec::new();
    for item in iter {
        let (key, value) = item?;
        out.push((
            String::from_utf8(key.key().to_vec())?,
            key.window().start(),
            key.window().end(),
            String::from_utf8(value)?,
        ));
    }
    Ok(out)
}

/// A row whose window spans `WINDOW_SIZE`.
pub fn row(key: &str, start: i64, value: &str) -> (String, i64, i64, String) {
    (key.to_string(), start, start + WINDOW_SIZE, value.to_string())
}

use cache::{CacheEntry, SegmentedCacheFunction};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use cursor::{DelegatingPeekingIterator, MemoryIterator};
use merge::MergedWindowIterator;
use windowkey::{KeySchema, SequencedKey, Window, WindowedKey};

const N_KEYS: usize = 10_000;
const VALUE_SIZE: usize = 100;
const WINDOW_SIZE: i64 = 60_000;
const SEGMENT_INTERVAL: i64 = 3_600_000;

type Inputs = (Vec<(Vec<u8>, CacheEntry)>, Vec<(SequencedKey, Vec<u8>)>);

/// Store holds every key; the cache overwrites every 4th and deletes every 16th.
fn build_inputs(schema: KeySchema, function: &SegmentedCacheFunction) -> Inputs {
    let mut store = Vec::with_capacity(N_KEYS);
    let mut cache = Vec::new();
    for i in 0..N_KEYS {
        let key = format!("key{:06}", i).into_bytes();
        let start = (i as i64 % 120) * WINDOW_SIZE;
        let store_key = schema.encode(&key, start, 0);
        if i % 16 == 0 {
            cache.push((function.cache_key(&store_key).unwrap(), CacheEntry::tombstone()));
        } else if i % 4 == 0 {
            cache.push((
                function.cache_key(&store_key).unwrap(),
                CacheEntry::clean(vec![b'c'; VALUE_SIZE]),
            ));
        }
        let window = Window::from_start(start, WINDOW_SIZE).unwrap();
        let record = SequencedKey::new(WindowedKey::new(key, window), 0);
        store.push(((function.segment_id(&store_key).unwrap(), store_key), record));
    }
    store.sort_by(|a, b| a.0.cmp(&b.0));
    let store = store
        .into_iter()
        .map(|(_, record)| (record, vec![b's'; VALUE_SIZE]))
        .collect();
    cache.sort_by(|a, b| a.0.cmp(&b.0));
    (cache, store)
}

fn merge_benchmark(c: &mut Criterion) {
    for schema in KeySchema::ALL {
        let function = SegmentedCacheFunction::new(schema, SEGMENT_INTERVAL);
        let inputs = build_inputs(schema, &function);
        c.bench_function(&format!("merge_forward_10k_{schema}"), |b| {
            b.iter_batched(
                || inputs.clone(),
                |(cache, store)| {
                    let merge = MergedWindowIterator::new(
                        DelegatingPeekingIterator::new("cache", MemoryIterator::new(cache)),
                        DelegatingPeekingIterator::new("store", MemoryIterator::new(store)),
                        schema,
                        WINDOW_SIZE,
                        function,
                        true,
                    );
                    let n = merge.map(|r| r.unwrap()).count();
                    assert_eq!(n, N_KEYS - N_KEYS.div_ceil(16));
                },
                BatchSize::LargeInput,
            );
        });
    }
}

criterion_group!(benches, merge_benchmark);
criterion_main!(benches);

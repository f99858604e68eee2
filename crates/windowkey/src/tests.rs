use super::*;
use std::ops::Bound;

// -------------------- Window --------------------

#[test]
fn window_rejects_negative_start() {
    assert!(matches!(
        Window::new(-1, 10),
        Err(Error::InvalidWindow { start: -1, end: 10 })
    ));
}

#[test]
fn window_rejects_empty_interval() {
    assert!(Window::new(5, 5).is_err());
    assert!(Window::new(5, 4).is_err());
}

#[test]
fn window_from_start_saturates_end() {
    let w = Window::from_start(i64::MAX - 5, 100).unwrap();
    assert_eq!(w.start(), i64::MAX - 5);
    assert_eq!(w.end(), i64::MAX);
}

#[test]
fn window_orders_by_start_then_end() {
    let a = Window::new(0, 10).unwrap();
    let b = Window::new(0, 20).unwrap();
    let c = Window::new(5, 6).unwrap();
    assert!(a < b);
    assert!(b < c);
    assert!(a.contains(0));
    assert!(!a.contains(10));
}

#[test]
fn windowed_key_display() {
    let k = WindowedKey::new(b"user".to_vec(), Window::new(10, 20).unwrap());
    assert_eq!(k.to_string(), "user@[10,20)");
}

// -------------------- Round trip --------------------

#[test]
fn every_schema_round_trips() {
    let cases: &[(&[u8], i64, u32)] = &[
        (b"", 0, 0),
        (b"a", 0, 1),
        (b"key-with-bytes\x00\xff", 1_700_000_000_000, u32::MAX),
        (b"k", i64::MAX, 7),
    ];
    for schema in KeySchema::ALL {
        for &(key, start, seq) in cases {
            let bytes = schema.encode(key, start, seq);
            assert_eq!(bytes.len(), schema.min_len() + key.len());
            let (k, s, q) = schema.decode(&bytes).unwrap();
            assert_eq!((k.as_slice(), s, q), (key, start, seq), "schema {schema}");
        }
    }
}

#[test]
fn decode_windowed_uses_window_size() {
    for schema in KeySchema::ALL {
        let bytes = schema.encode(b"b", 10, 0);
        let wk = schema.decode_windowed(&bytes, 10).unwrap();
        assert_eq!(wk.key(), b"b");
        assert_eq!(wk.window(), Window::new(10, 20).unwrap());
    }
}

#[test]
fn sequenced_keys_keep_seq_and_encode_by_start() {
    for schema in KeySchema::ALL {
        let bytes = schema.encode(b"k", 40, 7);
        let sk = schema.decode_sequenced(&bytes, 10).unwrap();
        assert_eq!(sk.seq(), 7);
        assert_eq!(sk.windowed().window(), Window::new(40, 50).unwrap());
        assert_eq!(schema.encode_sequenced(&sk), bytes);

        // The window end plays no part in the encoding.
        let narrow = SequencedKey::new(
            WindowedKey::new(b"k".to_vec(), Window::new(40, 41).unwrap()),
            7,
        );
        assert_eq!(schema.encode_sequenced(&narrow), bytes);
    }
}

#[test]
fn layouts_place_fields_as_documented() {
    let window = KeySchema::Window.encode(b"ab", 1, 2);
    assert_eq!(&window[..2], b"ab");
    assert_eq!(&window[2..10], &1i64.to_be_bytes());
    assert_eq!(&window[10..], &2u32.to_be_bytes());

    let key_first = KeySchema::KeyFirst.encode(b"ab", 1, 2);
    assert_eq!(key_first[0], KEY_FIRST_PREFIX);
    assert_eq!(&key_first[1..3], b"ab");

    let time_first = KeySchema::TimeFirst.encode(b"ab", 1, 2);
    assert_eq!(time_first[0], TIME_FIRST_PREFIX);
    assert_eq!(&time_first[1..9], &1i64.to_be_bytes());
    assert_eq!(&time_first[9..11], b"ab");
    assert_eq!(&time_first[11..], &2u32.to_be_bytes());
}

// -------------------- Corruption --------------------

#[test]
fn short_keys_are_corrupt() {
    for schema in KeySchema::ALL {
        let short = vec![schema.prefix().unwrap_or(0); schema.min_len() - 1];
        assert!(matches!(schema.decode(&short), Err(Error::CorruptKey(_))));
    }
}

#[test]
fn wrong_tag_is_corrupt() {
    let time_first = KeySchema::TimeFirst.encode(b"k", 5, 0);
    assert!(matches!(
        KeySchema::KeyFirst.decode(&time_first),
        Err(Error::CorruptKey(_))
    ));
    let key_first = KeySchema::KeyFirst.encode(b"k", 5, 0);
    assert!(matches!(
        KeySchema::TimeFirst.decode(&key_first),
        Err(Error::CorruptKey(_))
    ));
}

#[test]
fn negative_start_does_not_decode_to_window() {
    let bytes = KeySchema::Window.encode(b"k", -5, 0);
    assert!(matches!(
        KeySchema::Window.decode_windowed(&bytes, 10),
        Err(Error::CorruptKey(_))
    ));
}

// -------------------- Ordering --------------------

#[test]
fn key_major_layouts_group_windows_of_one_key() {
    for schema in [KeySchema::Window, KeySchema::KeyFirst] {
        let a0 = schema.encode(b"a", 0, 0);
        let a9 = schema.encode(b"a", 900, 0);
        let b0 = schema.encode(b"b", 0, 0);
        assert!(a0 < a9 && a9 < b0, "schema {schema}");
    }
}

#[test]
fn time_first_groups_keys_of_one_time() {
    let schema = KeySchema::TimeFirst;
    let b0 = schema.encode(b"b", 0, 0);
    let a9 = schema.encode(b"a", 900, 0);
    let z9 = schema.encode(b"z", 900, 0);
    assert!(b0 < a9 && a9 < z9);
}

#[test]
fn sequence_breaks_ties() {
    for schema in KeySchema::ALL {
        assert!(schema.encode(b"k", 1, 0) < schema.encode(b"k", 1, 1));
    }
}

// -------------------- Queries & bounds --------------------

fn in_bounds(bounds: &(Bound<Vec<u8>>, Bound<Vec<u8>>), key: &[u8]) -> bool {
    let lower = match &bounds.0 {
        Bound::Included(b) => key >= b.as_slice(),
        Bound::Excluded(b) => key > b.as_slice(),
        Bound::Unbounded => true,
    };
    let upper = match &bounds.1 {
        Bound::Included(b) => key <= b.as_slice(),
        Bound::Excluded(b) => key < b.as_slice(),
        Bound::Unbounded => true,
    };
    lower && upper
}

#[test]
fn matching_keys_always_fall_inside_bounds() {
    let keys: &[&[u8]] = &[b"", b"a", b"aa", b"ab", b"b", b"b\x00", b"ba", b"c", b"\xff\xff"];
    let times = [0i64, 5, 10, 99, 1_000];
    let queries = [
        WindowQuery::single_key(b"a".to_vec(), 0, 10),
        WindowQuery::single_key(b"".to_vec(), 0, 1_000),
        WindowQuery::key_range(Some(b"a".to_vec()), Some(b"b".to_vec()), 5, 99),
        WindowQuery::key_range(Some(b"aa".to_vec()), Some(b"ab".to_vec()), 0, 1_000),
        WindowQuery::key_range(None, Some(b"b".to_vec()), 0, 10),
        WindowQuery::key_range(Some(b"b".to_vec()), None, 0, 10),
        WindowQuery::time_range(5, 10),
        WindowQuery::all(),
    ];

    for schema in KeySchema::ALL {
        for query in &queries {
            let bounds = schema.scan_bounds(query);
            for &key in keys {
                for &ts in &times {
                    let encoded = schema.encode(key, ts, 3);
                    if query.matches(schema, &encoded).unwrap() {
                        assert!(
                            in_bounds(&bounds, &encoded),
                            "{schema}: {query:?} lost key {key:?}@{ts}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn query_matches_inclusive_bounds() {
    let schema = KeySchema::Window;
    let q = WindowQuery::key_range(Some(b"b".to_vec()), Some(b"d".to_vec()), 10, 20);
    assert!(q.matches(schema, &schema.encode(b"b", 10, 0)).unwrap());
    assert!(q.matches(schema, &schema.encode(b"d", 20, 0)).unwrap());
    assert!(!q.matches(schema, &schema.encode(b"a", 15, 0)).unwrap());
    assert!(!q.matches(schema, &schema.encode(b"c", 21, 0)).unwrap());
    assert!(!q.matches(schema, &schema.encode(b"e", 15, 0)).unwrap());
}

#[test]
fn inverted_queries_are_empty() {
    assert!(WindowQuery::time_range(10, 5).is_empty());
    assert!(WindowQuery::time_range(-10, -5).is_empty());
    assert!(WindowQuery::key_range(Some(b"z".to_vec()), Some(b"a".to_vec()), 0, 5).is_empty());
    assert!(!WindowQuery::all().is_empty());
}

#[test]
fn successor_skips_trailing_ff() {
    assert_eq!(successor(b"ab"), Some(b"ac".to_vec()));
    assert_eq!(successor(b"a\xff"), Some(b"b".to_vec()));
    assert_eq!(successor(b"\xff\xff"), None);
    assert_eq!(successor(b""), None);
}

#[test]
fn schema_names_parse() {
    for schema in KeySchema::ALL {
        assert_eq!(schema.to_string().parse::<KeySchema>().unwrap(), schema);
    }
    assert_eq!("TIME_FIRST".parse::<KeySchema>().unwrap(), KeySchema::TimeFirst);
    assert!("sideways".parse::<KeySchema>().is_err());
}

#[test]
fn inverted_byte_ranges_are_empty() {
    use Bound::*;
    assert!(range_is_empty(&(Included(b"b".to_vec()), Included(b"a".to_vec()))));
    assert!(range_is_empty(&(Included(b"a".to_vec()), Excluded(b"a".to_vec()))));
    assert!(!range_is_empty(&(Included(b"a".to_vec()), Included(b"a".to_vec()))));
    assert!(!range_is_empty(&(Unbounded, Excluded(b"a".to_vec()))));
}

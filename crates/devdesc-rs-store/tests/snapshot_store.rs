// crates/devdesc-rs-store/tests/snapshot_store.rs

use chrono::{Duration, Utc};
use devdesc_rs::document::DocumentFormat;
use devdesc_rs::entity::{DeviceSnapshot, DiffCounts, QualityScore, SourceDocument};
use devdesc_rs::{MappingMeta, ParseOptions, content_checksum, map_document};
use devdesc_rs_eds::parse_eds;
use devdesc_rs_store::{BusyPolicy, MemoryStore, SnapshotStore, SqliteStore};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

/// Helper function to load a test file from the `tests/data/` directory.
fn load_test_file(name: &str) -> Vec<u8> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path.push(name);

    fs::read(&path).unwrap_or_else(|e| panic!("Failed to read test file {:?}: {}", path, e))
}

const SAMPLE: &str = "Acme-FC300_V3.1.eds";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sample() -> (DeviceSnapshot, SourceDocument) {
    let bytes = load_test_file(SAMPLE);
    let parsed = parse_eds(&bytes, SAMPLE, ParseOptions::default()).expect("parse failed");
    let meta = MappingMeta {
        source_file: SAMPLE.to_string(),
        checksum: content_checksum(&bytes),
        parser_version: devdesc_rs::PARSER_VERSION.to_string(),
        ingested_at: Utc::now(),
    };
    let snapshot = map_document(&parsed.document, &meta).expect("mapping failed");
    let source = SourceDocument {
        file_name: SAMPLE.to_string(),
        format: DocumentFormat::Eds,
        bytes,
    };
    (snapshot, source)
}

fn score(device_key: &str, value: f64, minutes: i64) -> QualityScore {
    QualityScore {
        device_key: device_key.to_string(),
        score: value,
        counts: DiffCounts {
            missing_element: 2,
            extra_element: 0,
            value_changed: 1,
            order_changed: 3,
        },
        parser_version: devdesc_rs::PARSER_VERSION.to_string(),
        timestamp: Utc::now() + Duration::minutes(minutes),
        incomplete: false,
    }
}

/// The behaviour every backend must share.
fn exercise_store(store: &dyn SnapshotStore) {
    let (snapshot, source) = sample();
    let key = snapshot.key().to_string();
    assert!(store.load_device(&key).unwrap().is_none());

    store.replace_device(&snapshot, Some(&source)).unwrap();
    assert_eq!(store.load_device(&key).unwrap(), Some(snapshot.clone()));
    assert_eq!(store.load_source(&key).unwrap(), Some(source.clone()));
    assert_eq!(store.list_devices().unwrap(), vec![key.clone()]);

    // Re-ingestion replaces the whole graph, nothing of the old one survives.
    let mut smaller = snapshot.clone();
    smaller.parameters.truncate(1);
    smaller.assembly_members.clear();
    store.replace_device(&smaller, Some(&source)).unwrap();
    let stored = store.load_device(&key).unwrap().unwrap();
    assert_eq!(stored, smaller);
    assert_eq!(stored.parameters.len(), 1);

    store.append_score(&score(&key, 92.5, 0)).unwrap();
    store.append_score(&score(&key, 97.0, 1)).unwrap();
    store.append_score(&score("eds:1:1:1.0", 10.0, 0)).unwrap();

    assert!(store.delete_device(&key).unwrap());
    assert!(!store.delete_device(&key).unwrap());
    assert!(store.load_device(&key).unwrap().is_none());
    assert!(store.load_source(&key).unwrap().is_none());
    assert!(store.list_devices().unwrap().is_empty());

    // History is append-only and outlives the snapshot.
    let history = store.score_history(&key).unwrap();
    let values: Vec<f64> = history.iter().map(|s| s.score).collect();
    assert_eq!(values, vec![92.5, 97.0]);
    assert_eq!(history[0].counts.order_changed, 3);
    assert!(history[0].timestamp < history[1].timestamp);
}

#[test]
fn test_sqlite_store_contract() {
    init_logger();
    let store = SqliteStore::open_in_memory(BusyPolicy::Block).unwrap();
    exercise_store(&store);
}

#[test]
fn test_memory_store_contract() {
    init_logger();
    let store = MemoryStore::new(BusyPolicy::Block);
    exercise_store(&store);
}

#[test]
fn test_sqlite_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devices.db");
    let (snapshot, source) = sample();
    {
        let store = SqliteStore::open(&path, BusyPolicy::Block).unwrap();
        store.replace_device(&snapshot, Some(&source)).unwrap();
    }
    let reopened = SqliteStore::open(&path, BusyPolicy::Block).unwrap();
    assert_eq!(reopened.load_device(snapshot.key()).unwrap(), Some(snapshot.clone()));
    assert_eq!(reopened.load_source(snapshot.key()).unwrap().map(|s| s.bytes), Some(source.bytes));
}

#[test]
fn test_concurrent_replacements_never_mix() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path().join("devices.db"), BusyPolicy::Block).unwrap());
    let (full, _) = sample();
    let mut reduced = full.clone();
    reduced.parameters.clear();
    reduced.datatypes.clear();
    reduced.datatype_values.clear();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            let snapshot = if i % 2 == 0 { full.clone() } else { reduced.clone() };
            thread::spawn(move || store.replace_device(&snapshot, None))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let stored = store.load_device(full.key()).unwrap().unwrap();
    assert!(stored == full || stored == reduced);
    assert!(!store.locks().is_locked(full.key()));
}

// crates/devdesc-rs-iodd/tests/round_trip.rs

use chrono::Utc;
use devdesc_rs::document::EntryVariant;
use devdesc_rs::entity::DeviceSnapshot;
use devdesc_rs::{MappingMeta, ParseOptions, content_checksum, map_document};
use devdesc_rs_iodd::{build_iodd, parse_iodd, read_tree};
use std::fs;
use std::path::PathBuf;

fn load_test_file(name: &str) -> Vec<u8> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path.push(name);

    fs::read(&path).unwrap_or_else(|e| panic!("Failed to read test file {:?}: {}", path, e))
}

const SAMPLE: &str = "Acme-TS200-20240115-IODD1.1.xml";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses and maps `bytes` with fixed bookkeeping columns, so snapshots built
/// from different bytes stay comparable.
fn snapshot_of(bytes: &[u8], meta: &MappingMeta) -> DeviceSnapshot {
    let parsed = parse_iodd(bytes, SAMPLE, ParseOptions::default()).expect("parse failed");
    map_document(&parsed.document, meta).expect("mapping failed")
}

fn meta_for(bytes: &[u8]) -> MappingMeta {
    MappingMeta {
        source_file: SAMPLE.to_string(),
        checksum: content_checksum(bytes),
        parser_version: devdesc_rs::PARSER_VERSION.to_string(),
        ingested_at: Utc::now(),
    }
}

/// parse → persist rows → rebuild → parse again must land on the same rows.
#[test]
fn test_round_trip_is_idempotent() {
    init_logger();
    let original = load_test_file(SAMPLE);
    let meta = meta_for(&original);
    let first = snapshot_of(&original, &meta);

    let rebuilt = build_iodd(&first).expect("rebuild failed");
    assert!(
        rebuilt.is_complete(),
        "incomplete sections: {:?} ({:?})",
        rebuilt.incomplete_sections,
        rebuilt.errors
    );

    let second = snapshot_of(&rebuilt.bytes, &meta);
    assert!(first.eq_ignoring_timestamps(&second));
}

#[test]
fn test_rebuilt_document_keeps_event_order_and_std_refs() {
    let original = load_test_file(SAMPLE);
    let snapshot = snapshot_of(&original, &meta_for(&original));
    let rebuilt = build_iodd(&snapshot).unwrap();
    let xml = rebuilt.as_str().unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    let overtemp = xml.find(r#"code="16912""#).unwrap();
    let std_ref = xml.find(r#"<StdEventRef code="20480""#).unwrap();
    let calibrated = xml.find(r#"code="6144""#).unwrap();
    let short = xml.find(r#"code="16928""#).unwrap();
    assert!(overtemp < std_ref && std_ref < calibrated && calibrated < short);

    assert!(xml.contains(r#"<StdVariableRef id="V_DirectParameters_1""#));
    let std_rows = snapshot
        .parameters
        .iter()
        .filter(|p| p.variant == EntryVariant::StdRef)
        .count();
    assert_eq!(std_rows, 3);

    // The synthesized event name never reaches the output.
    assert!(!xml.contains("Event 0x1800"));
}

#[test]
fn test_rebuilt_tree_matches_original_structure() {
    let original = load_test_file(SAMPLE);
    let snapshot = snapshot_of(&original, &meta_for(&original));
    let rebuilt = build_iodd(&snapshot).unwrap();

    let before = read_tree(&original, SAMPLE).unwrap();
    let after = read_tree(&rebuilt.bytes, "rebuilt.xml").unwrap();
    assert_eq!(before.name, after.name);
    assert_eq!(before.node_count(), after.node_count());

    let path = "ProfileBody/DeviceFunction/VariableCollection";
    let vars_before = before.find_path(path).unwrap();
    let vars_after = after.find_path(path).unwrap();
    let ids = |n: &devdesc_rs::DocNode| -> Vec<String> {
        n.children
            .iter()
            .filter_map(|c| c.attr("id").map(str::to_string))
            .collect()
    };
    assert_eq!(ids(vars_before), ids(vars_after));
}

#[test]
fn test_broken_override_row_degrades_only_its_section() {
    let original = load_test_file(SAMPLE);
    let mut snapshot = snapshot_of(&original, &meta_for(&original));
    // A RecordItemInfo row without its subindex cannot be emitted.
    snapshot
        .parameter_overrides
        .iter_mut()
        .filter(|o| o.parameter_id == "V_Config")
        .for_each(|o| o.attributes.retain(|a| a.name != "subindex"));

    let rebuilt = build_iodd(&snapshot).unwrap();
    assert_eq!(rebuilt.incomplete_sections, vec!["VariableCollection".to_string()]);
    assert_eq!(rebuilt.errors.len(), 1);
    assert_eq!(
        rebuilt.errors[0].context().device_id.as_deref(),
        Some("iodd:888:4711:V1.3")
    );
    let xml = rebuilt.as_str().unwrap();
    assert!(!xml.contains(r#"id="V_Config""#));
    assert!(xml.contains(r#"id="V_Setpoint""#));
    assert!(xml.contains("<EventCollection>"));
}

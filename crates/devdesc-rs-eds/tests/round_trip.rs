// crates/devdesc-rs-eds/tests/round_trip.rs

use chrono::Utc;
use devdesc_rs::entity::DeviceSnapshot;
use devdesc_rs::{MappingMeta, ParseOptions, content_checksum, map_document};
use devdesc_rs_eds::{build_eds, parse_eds, read_tree};
use std::fs;
use std::path::PathBuf;

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

fn snapshot_of(bytes: &[u8], meta: &MappingMeta) -> DeviceSnapshot {
    let parsed = parse_eds(bytes, SAMPLE, ParseOptions::default()).expect("parse failed");
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

#[test]
fn test_round_trip_is_idempotent() {
    init_logger();
    let original = load_test_file(SAMPLE);
    let meta = meta_for(&original);
    let first = snapshot_of(&original, &meta);

    let rebuilt = build_eds(&first).expect("rebuild failed");
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
fn test_rebuilt_text_layout() {
    let original = load_test_file(SAMPLE);
    let snapshot = snapshot_of(&original, &meta_for(&original));
    let rebuilt = build_eds(&snapshot).unwrap();
    let text = rebuilt.as_str().unwrap();

    assert!(text.starts_with("$ eds:888:4711:3.1\n"));
    assert!(text.contains("\tParam2 = 0,,,0x0010,0xC6,1,\"Valve state\",\"\",\"Current valve position\",0,2,0,,,,,,,,,0;\n"));
    assert!(text.contains("\tEnum2 = 0,\"Closed\",1,\"Open\",2,\"Fault\";\n"));
    assert!(text.contains("\tAssem151 = \"Config\";\n"));
    assert!(text.contains("\"Flow setpoint; $ not a comment\""));

    // Properties of an entity section come before its entities; every
    // enumeration follows its parameter.
    let max_inst = text.find("MaxInst = 3;").unwrap();
    let param2 = text.find("Param2 =").unwrap();
    let enum2 = text.find("Enum2 =").unwrap();
    let param3 = text.find("Param3 =").unwrap();
    assert!(max_inst < param2 && param2 < enum2 && enum2 < param3);
}

#[test]
fn test_rebuilt_tree_matches_original_structure() {
    let original = load_test_file(SAMPLE);
    let snapshot = snapshot_of(&original, &meta_for(&original));
    let rebuilt = build_eds(&snapshot).unwrap();

    let before = read_tree(&original, SAMPLE).unwrap();
    let after = read_tree(&rebuilt.bytes, "rebuilt.eds").unwrap();
    assert_eq!(before.node_count(), after.node_count());

    let names = |n: &devdesc_rs::DocNode| -> Vec<String> {
        n.children
            .iter()
            .filter_map(|c| c.attr("name").map(str::to_string))
            .collect()
    };
    assert_eq!(names(&before), names(&after));

    let entry = |tree: &devdesc_rs::DocNode, section: &str, key: &str| -> Option<String> {
        tree.children
            .iter()
            .find(|s| s.attr("name") == Some(section))?
            .children
            .iter()
            .find(|e| e.attr("key") == Some(key))?
            .text
            .clone()
    };
    for (section, key) in [
        ("Params", "Param1"),
        ("Params", "Param3"),
        ("Assembly", "Assem100"),
        ("Assembly", "Assem150"),
        ("Connection Manager", "Connection1"),
        ("Port", "Port1"),
    ] {
        assert_eq!(
            entry(&before, section, key),
            entry(&after, section, key),
            "{} {}",
            section,
            key
        );
    }
}

#[test]
fn test_broken_param_row_degrades_only_params() {
    let original = load_test_file(SAMPLE);
    let mut snapshot = snapshot_of(&original, &meta_for(&original));
    snapshot
        .parameters
        .iter_mut()
        .filter(|p| p.id == "Param2")
        .for_each(|p| p.attributes.retain(|a| a.name != "data_type"));

    let rebuilt = build_eds(&snapshot).unwrap();
    assert_eq!(rebuilt.incomplete_sections, vec!["Params".to_string()]);
    assert_eq!(rebuilt.errors.len(), 1);
    assert_eq!(
        rebuilt.errors[0].context().device_id.as_deref(),
        Some("eds:888:4711:3.1")
    );

    let text = rebuilt.as_str().unwrap();
    assert!(!text.contains("Param2 ="));
    // The enumeration goes with its parameter.
    assert!(!text.contains("Enum2 ="));
    assert!(text.contains("Param1 ="));
    assert!(text.contains("Assem100 ="));
}

#[test]
fn test_iodd_snapshot_is_rejected() {
    let original = load_test_file(SAMPLE);
    let mut snapshot = snapshot_of(&original, &meta_for(&original));
    snapshot.device.format = devdesc_rs::DocumentFormat::Iodd;
    assert!(build_eds(&snapshot).is_err());
}

// crates/devdesc-rs-eds/tests/parsing.rs

use devdesc_rs::ParseOptions;
use devdesc_rs::document::{ConnectionDirection, ParameterEntry, find_attribute};
use devdesc_rs::error::{DevDescError, ParseErrorKind};
use devdesc_rs_eds::{EdsCandidate, parse_eds, parse_eds_str, select_canonical};
use std::fs;
use std::path::PathBuf;

/// Helper function to load a test file from the `tests/data/` directory.
fn load_test_file(name: &str) -> Vec<u8> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path.push(name);

    fs::read(&path).unwrap_or_else(|e| panic!("Failed to read test file {:?}: {}", path, e))
}

const SAMPLE: &str = "Acme-FC300_V3.1.eds";
const OLDER: &str = "Acme-FC300_V1.0.eds";

fn full(entry: &ParameterEntry) -> &devdesc_rs::document::ParameterDef {
    match entry {
        ParameterEntry::Full(p) => p,
        other => panic!("expected a full parameter, got {:?}", other),
    }
}

#[test]
fn test_identity_and_sections() {
    let bytes = load_test_file(SAMPLE);
    let parsed = parse_eds(&bytes, SAMPLE, ParseOptions::default()).expect("parse failed");
    let doc = &parsed.document;

    assert_eq!(doc.key().as_str(), "eds:888:4711:3.1");
    assert_eq!(doc.identity.vendor_name, "Acme Sensors");
    assert_eq!(doc.identity.product_name, "FC300 Flow Controller");
    assert_eq!(
        doc.sections,
        vec![
            "File",
            "Device",
            "Device Classification",
            "Params",
            "Assembly",
            "Connection Manager",
            "Port",
        ]
    );
    // Trailing comments are gone, quotes are kept.
    assert_eq!(doc.property("File", "Revision"), Some("3.1"));
    assert_eq!(doc.property("Device", "Icon"), Some("\"fc300.ico\""));
    assert_eq!(doc.property("Params", "MaxInst"), Some("3"));
    assert_eq!(doc.property("Assembly", "Object_Name"), Some("\"Assembly Object\""));
    assert_eq!(
        doc.property("Port", "Port1"),
        Some("TCP,\"EtherNet/IP Port\",\"20 F5 24 01\",1")
    );
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
}

#[test]
fn test_params_keep_raw_fields_and_texts() {
    let bytes = load_test_file(SAMPLE);
    let doc = parse_eds(&bytes, SAMPLE, ParseOptions::default())
        .unwrap()
        .document;

    let ids: Vec<&str> = doc.parameters.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["Param1", "Param2", "Param3"]);

    let setpoint = full(&doc.parameters[0]);
    assert_eq!(setpoint.index, Some(1));
    assert_eq!(setpoint.access.as_deref(), Some("rw"));
    assert_eq!(setpoint.min.as_deref(), Some("0"));
    assert_eq!(setpoint.max.as_deref(), Some("1000"));
    assert_eq!(setpoint.default_value.as_deref(), Some("250"));
    assert_eq!(find_attribute(&setpoint.attributes, "data_type"), Some("0xC7"));
    assert_eq!(
        find_attribute(&setpoint.attributes, "link_path"),
        Some("\"20 04 24 01 30 03\"")
    );
    assert_eq!(find_attribute(&setpoint.attributes, "decimal_places"), Some("1"));
    let help = setpoint.description.as_ref().unwrap();
    assert_eq!(
        doc.texts.resolve(help.as_str(), None),
        Some("Flow setpoint; $ not a comment")
    );

    let valve = full(&doc.parameters[1]);
    assert_eq!(valve.access.as_deref(), Some("ro"));
    assert_eq!(valve.datatype.as_deref(), Some("Enum2"));
    assert_eq!(find_attribute(&valve.attributes, "link_path"), Some(""));
    let units = valve.unit.as_ref().unwrap();
    assert_eq!(doc.texts.resolve(units.as_str(), None), Some(""));

    let totalizer = full(&doc.parameters[2]);
    assert_eq!(totalizer.max.as_deref(), Some("4294967295"));
    assert_eq!(find_attribute(&totalizer.attributes, "field21"), Some("0x55"));
    assert_eq!(find_attribute(&totalizer.attributes, "field22"), Some("7"));
}

#[test]
fn test_enum_becomes_datatype_of_its_param() {
    let bytes = load_test_file(SAMPLE);
    let doc = parse_eds(&bytes, SAMPLE, ParseOptions::default())
        .unwrap()
        .document;

    assert_eq!(doc.datatypes.len(), 1);
    let dt = doc.datatype("Enum2").unwrap();
    assert_eq!(dt.kind, "Enum");
    assert_eq!(dt.owner.as_deref(), Some("Param2"));
    let values: Vec<&str> = dt.values.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(values, vec!["0", "1", "2"]);
    assert_eq!(doc.texts.resolve("Enum2.2", None), Some("Fault"));
}

#[test]
fn test_assembly_members_get_running_offsets() {
    let bytes = load_test_file(SAMPLE);
    let doc = parse_eds(&bytes, SAMPLE, ParseOptions::default())
        .unwrap()
        .document;

    let ids: Vec<&str> = doc.assemblies.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["Assem100", "Assem150", "Assem151"]);

    let input = &doc.assemblies[0];
    assert_eq!(input.size.as_deref(), Some("7"));
    assert_eq!(input.reserved, vec![String::new(), String::new()]);
    let offsets: Vec<u32> = input.members.iter().map(|m| m.bit_offset).collect();
    assert_eq!(offsets, vec![0, 16, 24]);
    assert_eq!(input.members[2].reference, "Param3");

    let config = &doc.assemblies[2];
    assert!(config.path.is_none());
    assert!(config.members.is_empty());
    assert!(config.reserved.is_empty());
}

#[test]
fn test_connection_direction_from_sizes() {
    let bytes = load_test_file(SAMPLE);
    let doc = parse_eds(&bytes, SAMPLE, ParseOptions::default())
        .unwrap()
        .document;

    assert_eq!(doc.connections.len(), 2);
    let owner = &doc.connections[0];
    assert_eq!(owner.direction, ConnectionDirection::Bidirectional);
    assert_eq!((owner.ot_size, owner.to_size), (Some(2), Some(7)));
    assert_eq!(owner.rpi.as_deref(), Some("Param4"));
    assert_eq!(owner.fields.len(), 15);
    assert_eq!(
        doc.texts.resolve(owner.name.as_ref().unwrap().as_str(), None),
        Some("Exclusive Owner")
    );

    let listen = &doc.connections[1];
    assert_eq!(listen.direction, ConnectionDirection::Input);
    assert_eq!(listen.path.as_deref(), Some("\"20 04 24 97 2C 98 2C 64\""));
}

#[test]
fn test_bad_numeric_field_names_the_entry() {
    let text = "[Device]\n VendCode = 1;\n ProdCode = 2;\n\
                [Params]\n Param1 = 0,,,0x0000,0xC7,two,\"X\",\"\",\"\",0,1,0;\n";
    let err = parse_eds_str(text, "bad.eds", ParseOptions::default()).unwrap_err();
    match &err {
        DevDescError::Parse {
            kind: ParseErrorKind::NumericCoercion { field, value },
            context,
        } => {
            assert_eq!(field, "Param1.data_size");
            assert_eq!(value, "two");
            assert!(context.path.ends_with("Param1"), "{}", context.path);
            assert_eq!(context.device_id.as_deref(), Some("eds:1:2:0"));
        }
        other => panic!("expected a numeric coercion error, got {:?}", other),
    }
}

#[test]
fn test_short_param_is_malformed() {
    let text = "[Device]\n VendCode = 1;\n ProdCode = 2;\n[Params]\n Param1 = 0,,,0x0000;\n";
    let err = parse_eds_str(text, "short.eds", ParseOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DevDescError::Parse {
            kind: ParseErrorKind::Malformed(_),
            ..
        }
    ));
}

#[test]
fn test_dangling_member_reference_warns() {
    let text = "[Device]\n VendCode = 1;\n ProdCode = 2;\n\
                [Assembly]\n Assem1 = \"In\",,2,,,,16,Param9;\n";
    let parsed = parse_eds_str(text, "dangling.eds", ParseOptions::default()).unwrap();
    assert_eq!(parsed.document.assemblies[0].members.len(), 1);
    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.warnings[0].contains("Param9"));
}

#[test]
fn test_newest_revision_is_canonical() {
    let newer = load_test_file(SAMPLE);
    let older = load_test_file(OLDER);
    let newer_doc = parse_eds(&newer, SAMPLE, ParseOptions::default()).unwrap().document;
    let older_doc = parse_eds(&older, OLDER, ParseOptions::default()).unwrap().document;
    assert_eq!(older_doc.key().as_str(), "eds:888:4711:1.0");

    let candidates = [
        EdsCandidate { file_name: SAMPLE, document: &newer_doc },
        EdsCandidate { file_name: OLDER, document: &older_doc },
    ];
    assert_eq!(select_canonical(&candidates), Some(0));
}

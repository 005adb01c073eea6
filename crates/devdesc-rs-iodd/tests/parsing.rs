// crates/devdesc-rs-iodd/tests/parsing.rs

use devdesc_rs::document::{EventEntry, MenuItemKind, ParameterEntry, Role};
use devdesc_rs::error::{DevDescError, ParseErrorKind};
use devdesc_rs::ParseOptions;
use devdesc_rs_iodd::parse_iodd;
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

const SAMPLE: &str = "Acme-TS200-20240115-IODD1.1.xml";

#[test]
fn test_identity_and_texts_are_resolved() {
    let bytes = load_test_file(SAMPLE);
    let parsed = parse_iodd(&bytes, SAMPLE, ParseOptions::default()).expect("parse failed");
    let doc = &parsed.document;

    assert_eq!(doc.identity.vendor_id, 888);
    assert_eq!(doc.identity.device_id, 4711);
    assert_eq!(doc.identity.vendor_name, "Acme Sensors");
    assert_eq!(doc.identity.product_name, "TS200");
    assert_eq!(doc.identity.revision, "V1.3");
    assert_eq!(doc.key().as_str(), "iodd:888:4711:V1.3");
    assert_eq!(doc.identity.variants.len(), 2);

    assert_eq!(doc.texts.primary_code(), Some("en"));
    assert_eq!(doc.texts.resolve("TN_V_Setpoint", Some("de")), Some("Schaltpunkt"));
    // Falls back to the primary language.
    assert_eq!(doc.texts.resolve("TN_V_Unit", Some("de")), Some("Display unit"));
    assert_eq!(
        doc.texts.resolve("TD_V_Setpoint", None),
        Some("Switching setpoint in 0.1 & units")
    );
    assert_eq!(doc.property("PhysicalLayer", "bitrate"), Some("COM2"));
    assert_eq!(doc.property("Stamp", "crc"), Some("1234567890"));
}

#[test]
fn test_variables_keep_their_kind_and_order() {
    let bytes = load_test_file(SAMPLE);
    let doc = parse_iodd(&bytes, SAMPLE, ParseOptions::default())
        .unwrap()
        .document;

    let ids: Vec<&str> = doc.parameters.iter().map(|p| p.id()).collect();
    assert_eq!(
        ids,
        vec![
            "V_DirectParameters_1",
            "V_SystemCommand",
            "V_ApplicationSpecificTag",
            "V_Setpoint",
            "V_Unit",
            "V_Config",
            "V_Temperature",
        ]
    );

    match &doc.parameters[1] {
        ParameterEntry::StdRef(r) => {
            assert_eq!(r.overrides.len(), 2);
            assert_eq!(r.overrides[0].element, "StdSingleValueRef");
        }
        other => panic!("expected a standard reference, got {:?}", other),
    }
    match &doc.parameters[3] {
        ParameterEntry::Full(p) => {
            assert_eq!(p.index, Some(64));
            assert_eq!(p.datatype.as_deref(), Some("V_Setpoint#dt"));
            assert_eq!(p.default_value.as_deref(), Some("250"));
        }
        other => panic!("expected a full variable, got {:?}", other),
    }

    let config = doc.datatype("V_Config#dt").expect("inline record datatype");
    assert_eq!(config.owner.as_deref(), Some("V_Config"));
    assert_eq!(config.record_items.len(), 2);
    let array = doc.datatype("V_Temperature#dt").expect("inline array datatype");
    assert_eq!(array.count, Some(4));
    assert_eq!(array.element.as_ref().map(|e| e.kind.as_str()), Some("IntegerT"));
}

#[test]
fn test_record_items_are_flattened_with_nested_values() {
    let bytes = load_test_file(SAMPLE);
    let doc = parse_iodd(&bytes, SAMPLE, ParseOptions::default())
        .unwrap()
        .document;

    let record = doc.datatype("DT_PDIn").unwrap();
    let subindices: Vec<u32> = record.record_items.iter().map(|i| i.subindex).collect();
    assert_eq!(subindices, vec![1, 2, 3]);
    assert_eq!(record.record_items[1].datatype_ref.as_deref(), Some("DT_Unit"));
    let switch = record.record_items[2].simple.as_ref().unwrap();
    assert_eq!(switch.values.len(), 2);
}

#[test]
fn test_events_preserve_document_order_and_variants() {
    let bytes = load_test_file(SAMPLE);
    let parsed = parse_iodd(&bytes, SAMPLE, ParseOptions::default()).unwrap();
    let doc = &parsed.document;

    let codes: Vec<&str> = doc.events.iter().map(|e| e.code()).collect();
    assert_eq!(codes, vec!["16912", "20480", "6144", "16928"]);
    assert!(matches!(doc.events[1], EventEntry::StdRef(_)));

    // An event without a name stays a full definition with a synthesized name.
    match &doc.events[2] {
        EventEntry::Full(e) => {
            assert!(e.name_synthesized);
            assert!(e.name.is_none());
            assert_eq!(doc.event_display_name(&doc.events[2]), "Event 0x1800");
        }
        other => panic!("expected a full event, got {:?}", other),
    }
    assert!(parsed.warnings.iter().any(|w| w.contains("Event 0x1800")));
}

#[test]
fn test_menus_and_role_sets() {
    let bytes = load_test_file(SAMPLE);
    let doc = parse_iodd(&bytes, SAMPLE, ParseOptions::default())
        .unwrap()
        .document;

    assert_eq!(doc.menus.len(), 4);
    let parameter_menu = &doc.menus[1];
    assert_eq!(parameter_menu.items.len(), 5);
    assert_eq!(parameter_menu.items[2].kind, MenuItemKind::RecordItemRef);
    assert_eq!(parameter_menu.items[2].subindex, Some(1));
    assert_eq!(parameter_menu.items[4].kind, MenuItemKind::MenuRef);

    let commands = &doc.menus[2];
    assert_eq!(
        commands.items[1].button.as_ref().map(|b| b.value.as_str()),
        Some("130")
    );
    assert!(doc.menus[3].name.is_none());

    let roles: Vec<Role> = doc.role_menus.iter().map(|s| s.role).collect();
    assert_eq!(roles, Role::ALL.to_vec());
    assert_eq!(doc.role_menus[0].entries[1].slot, "ObservationMenu");
}

#[test]
fn test_process_data_items_share_their_group() {
    let bytes = load_test_file(SAMPLE);
    let doc = parse_iodd(&bytes, SAMPLE, ParseOptions::default())
        .unwrap()
        .document;

    assert_eq!(doc.process_data.len(), 2);
    assert!(doc.process_data.iter().all(|p| p.group_id == "P_ProcessData"));
    assert_eq!(doc.process_data[0].datatype.as_deref(), Some("DT_PDIn"));
    assert_eq!(doc.process_data[1].datatype.as_deref(), Some("PD_Out#dt"));
}

#[test]
fn test_strict_mode_rejects_dangling_text_reference() {
    let text = String::from_utf8(load_test_file(SAMPLE)).unwrap();
    let broken = text.replace(
        r#"<Name textId="TN_V_Unit"/>"#,
        r#"<Name textId="TN_DoesNotExist"/>"#,
    );

    let err = parse_iodd(broken.as_bytes(), SAMPLE, ParseOptions::default()).unwrap_err();
    match err {
        DevDescError::Parse { context, kind } => {
            assert_eq!(kind, ParseErrorKind::UnresolvedText("TN_DoesNotExist".into()));
            assert!(context.path.ends_with("VariableCollection/Variable[V_Unit]"));
            assert_eq!(context.device_id.as_deref(), Some("iodd:888:4711:V1.3"));
            assert_eq!(context.source_file.as_deref(), Some(SAMPLE));
        }
        other => panic!("unexpected error {:?}", other),
    }

    // Lenient mode keeps the reference and warns.
    let lenient = ParseOptions {
        strict_references: false,
    };
    let parsed = parse_iodd(broken.as_bytes(), SAMPLE, lenient).unwrap();
    assert!(parsed.warnings.iter().any(|w| w.contains("TN_DoesNotExist")));
}

#[test]
fn test_unknown_datatype_reference_is_rejected() {
    let text = String::from_utf8(load_test_file(SAMPLE)).unwrap();
    let broken = text.replace(
        r#"<DatatypeRef datatypeId="DT_Unit"/>
          <Name textId="TN_V_Unit"/>"#,
        r#"<DatatypeRef datatypeId="DT_Missing"/>
          <Name textId="TN_V_Unit"/>"#,
    );
    let err = parse_iodd(broken.as_bytes(), SAMPLE, ParseOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DevDescError::Parse {
            kind: ParseErrorKind::UnresolvedDatatype(_),
            ..
        }
    ));
}

#[test]
fn test_invalid_event_code_is_a_numeric_coercion_error() {
    let text = String::from_utf8(load_test_file(SAMPLE)).unwrap();
    let broken = text.replace(r#"code="16928""#, r#"code="0xZZ""#);
    let err = parse_iodd(broken.as_bytes(), SAMPLE, ParseOptions::default()).unwrap_err();
    match err {
        DevDescError::Parse {
            kind: ParseErrorKind::NumericCoercion { field, value },
            ..
        } => {
            assert_eq!(field, "code");
            assert_eq!(value, "0xZZ");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

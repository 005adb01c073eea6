// crates/devdesc-rs-quality/tests/pipeline.rs

use chrono::Utc;
use devdesc_rs::error::{DevDescError, DiffErrorKind};
use devdesc_rs::{DiffCategory, MappingMeta, ParseOptions, content_checksum, map_document};
use devdesc_rs_quality::{
    CancellationToken, CollectingSink, DiffConfig, LifecyclePhase, Orchestrator, PipelineConfig,
    Severity, diff_trees,
};
use devdesc_rs_store::{BusyPolicy, MemoryStore, SnapshotStore, SqliteStore};
use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Helper function to load a test file from the `tests/data/` directory.
fn load_test_file(name: &str) -> Vec<u8> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path.push(name);

    fs::read(&path).unwrap_or_else(|e| panic!("Failed to read test file {:?}: {}", path, e))
}

const EDS_V1: &str = "Acme-FC300_V1.0.eds";
const EDS_V3: &str = "Acme-FC300_V3.1.eds";
const IODD: &str = "Acme-TS200-20240115-IODD1.1.xml";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn orchestrator<S: SnapshotStore + 'static>(store: S) -> (Orchestrator<S>, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let orchestrator = Orchestrator::new(Arc::new(store), PipelineConfig::default(), sink.clone());
    (orchestrator, sink)
}

fn package(files: &[&str]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for name in files {
        writer.start_file(format!("vendor/{}", name), options).unwrap();
        writer.write_all(&load_test_file(name)).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn test_eds_document_rebuilds_with_full_fidelity() {
    init_logger();
    let (orchestrator, sink) = orchestrator(MemoryStore::new(BusyPolicy::Block));
    let report = orchestrator
        .run_batch(&load_test_file(EDS_V3), EDS_V3, &CancellationToken::new())
        .unwrap();

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.outcomes.len(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.device_key, "eds:888:4711:3.1");
    assert!((outcome.report.score - 100.0).abs() < 1e-9);
    assert_eq!(outcome.report.diff_counts_by_category[&DiffCategory::MissingElement], 0);
    assert!(!outcome.report.incomplete);
    assert_eq!(outcome.phase, Some(LifecyclePhase::NewlyImported));
    assert!(outcome.signal.is_none());
    assert!(sink.signals().is_empty());

    let history = orchestrator.store().score_history("eds:888:4711:3.1").unwrap();
    assert_eq!(history.len(), 1);
}

#[test]
fn test_iodd_document_is_scored_within_bounds() {
    init_logger();
    let (orchestrator, _) = orchestrator(MemoryStore::new(BusyPolicy::Block));
    let report = orchestrator
        .run_batch(&load_test_file(IODD), IODD, &CancellationToken::new())
        .unwrap();

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.device_key, "iodd:888:4711:V1.3");
    assert!((0.0..=100.0).contains(&outcome.report.score));
    assert!(!outcome.report.incomplete);
    assert_eq!(outcome.report.parser_version, devdesc_rs::PARSER_VERSION);
}

#[test]
fn test_package_selects_newest_revision() {
    init_logger();
    let store = SqliteStore::open_in_memory(BusyPolicy::Block).unwrap();
    let (orchestrator, _) = orchestrator(store);
    let zip = package(&[EDS_V1, IODD, EDS_V3]);
    let report = orchestrator
        .run_batch(&zip, "acme.zip", &CancellationToken::new())
        .unwrap();

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    let keys: Vec<&str> = report.outcomes.iter().map(|o| o.device_key.as_str()).collect();
    assert_eq!(keys, vec!["eds:888:4711:3.1", "iodd:888:4711:V1.3"]);
    assert_eq!(report.superseded.len(), 1);
    assert_eq!(report.superseded[0].file_name, "acme.zip/vendor/Acme-FC300_V1.0.eds");
    assert_eq!(report.superseded[0].superseded_by, "acme.zip/vendor/Acme-FC300_V3.1.eds");

    let stored = orchestrator.store().list_devices().unwrap();
    assert_eq!(stored.len(), 2);
    assert!(!stored.iter().any(|k| k == "eds:888:4711:1.0"));
}

#[test]
fn test_rescoring_builds_history_and_lifecycle() {
    init_logger();
    let (orchestrator, _) = orchestrator(MemoryStore::new(BusyPolicy::Block));
    let token = CancellationToken::new();
    orchestrator
        .run_batch(&load_test_file(EDS_V3), EDS_V3, &token)
        .unwrap();

    let second = orchestrator.rescore_all(&token).unwrap();
    assert_eq!(second.outcomes[0].phase, Some(LifecyclePhase::NewlyImported));
    let third = orchestrator.rescore_all(&token).unwrap();
    assert_eq!(third.outcomes[0].phase, Some(LifecyclePhase::Stable));

    let history = orchestrator.store().score_history("eds:888:4711:3.1").unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_cancelled_batch_leaves_nothing_half_written() {
    init_logger();
    let (orchestrator, _) = orchestrator(MemoryStore::new(BusyPolicy::Block));
    let token = CancellationToken::new();
    token.cancel();
    let report = orchestrator
        .run_batch(&package(&[EDS_V3, IODD]), "acme.zip", &token)
        .unwrap();

    assert!(report.outcomes.is_empty());
    assert_eq!(report.cancelled, vec!["eds:888:4711:3.1", "iodd:888:4711:V1.3"]);
    assert!(orchestrator.store().list_devices().unwrap().is_empty());
    assert!(orchestrator.store().score_history("eds:888:4711:3.1").unwrap().is_empty());
}

#[test]
fn test_lost_connection_raises_high_signal() {
    init_logger();
    let bytes = load_test_file(EDS_V3);
    let parsed = devdesc_rs_eds::parse_eds(&bytes, EDS_V3, ParseOptions::default()).unwrap();
    let meta = MappingMeta {
        source_file: EDS_V3.to_string(),
        checksum: content_checksum(&bytes),
        parser_version: devdesc_rs::PARSER_VERSION.to_string(),
        ingested_at: Utc::now(),
    };
    let mut snapshot = map_document(&parsed.document, &meta).unwrap();
    snapshot.connections.retain(|c| c.id != "Connection2");
    let source = devdesc_rs::SourceDocument {
        file_name: EDS_V3.to_string(),
        format: devdesc_rs::DocumentFormat::Eds,
        bytes,
    };

    let (orchestrator, sink) = orchestrator(MemoryStore::new(BusyPolicy::Block));
    orchestrator.store().replace_device(&snapshot, Some(&source)).unwrap();
    let outcome = orchestrator.score_device(snapshot.key()).unwrap();

    let missing: Vec<&str> = outcome
        .report
        .diffs
        .iter()
        .filter(|d| d.category == DiffCategory::MissingElement)
        .map(|d| d.path.as_str())
        .collect();
    assert_eq!(
        missing,
        vec!["/EDS/Section[name=Connection Manager]/Entry[key=Connection2]"]
    );
    assert!(outcome.report.score < 100.0);
    let signals = sink.signals();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].severity, Severity::High);
    assert_eq!(signals[0].device_id, "eds:888:4711:3.1");
}

#[test]
fn test_device_without_source_cannot_be_scored() {
    init_logger();
    let bytes = load_test_file(EDS_V3);
    let parsed = devdesc_rs_eds::parse_eds(&bytes, EDS_V3, ParseOptions::default()).unwrap();
    let meta = MappingMeta {
        source_file: EDS_V3.to_string(),
        checksum: content_checksum(&bytes),
        parser_version: devdesc_rs::PARSER_VERSION.to_string(),
        ingested_at: Utc::now(),
    };
    let snapshot = map_document(&parsed.document, &meta).unwrap();

    let (orchestrator, _) = orchestrator(MemoryStore::new(BusyPolicy::Block));
    orchestrator.store().replace_device(&snapshot, None).unwrap();
    let err = orchestrator.score_device(snapshot.key()).unwrap_err();
    assert!(matches!(
        err,
        DevDescError::Diff {
            kind: DiffErrorKind::Unreadable(_),
            ..
        }
    ));
    assert_eq!(err.context().device_id.as_deref(), Some("eds:888:4711:3.1"));

    let report = orchestrator.rescore_all(&CancellationToken::new()).unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(report.failures.len(), 1);
}

#[test]
fn test_unreadable_rebuild_degrades_to_incomplete_report() {
    init_logger();
    let bytes = load_test_file(EDS_V3);
    let parsed = devdesc_rs_eds::parse_eds(&bytes, EDS_V3, ParseOptions::default()).unwrap();
    let meta = MappingMeta {
        source_file: EDS_V3.to_string(),
        checksum: content_checksum(&bytes),
        parser_version: devdesc_rs::PARSER_VERSION.to_string(),
        ingested_at: Utc::now(),
    };
    let mut snapshot = map_document(&parsed.document, &meta).unwrap();
    snapshot.properties[0].value = "\"unterminated".to_string();
    let source = devdesc_rs::SourceDocument {
        file_name: EDS_V3.to_string(),
        format: devdesc_rs::DocumentFormat::Eds,
        bytes,
    };

    let (orchestrator, sink) = orchestrator(SqliteStore::open_in_memory(BusyPolicy::Block).unwrap());
    orchestrator.store().replace_device(&snapshot, Some(&source)).unwrap();
    let outcome = orchestrator.score_device(snapshot.key()).unwrap();

    assert!(outcome.report.incomplete);
    assert_eq!(outcome.report.failed_stage.as_deref(), Some("reconstruction read-back"));
    assert_eq!(outcome.report.score, 0.0);
    assert!(outcome.report.diffs.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("unterminated string"));
    assert!(outcome.warnings[0].contains("<reconstruction>"));

    let signals = sink.signals();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].severity, Severity::Critical);
    assert!(signals[0].summary.contains("reconstruction read-back failed"));

    let history = orchestrator.store().score_history(snapshot.key()).unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].incomplete);

    let json: serde_json::Value = serde_json::from_str(&outcome.report.to_json().unwrap()).unwrap();
    assert_eq!(json["incomplete"], true);
    assert_eq!(json["failed_stage"], "reconstruction read-back");
}

#[test]
fn test_removed_parameter_is_one_missing_element() {
    let bytes = load_test_file(IODD);
    let original = devdesc_rs_iodd::read_tree(&bytes, IODD).unwrap();
    let mut rebuilt = original.clone();
    let variables = rebuilt
        .children
        .iter_mut()
        .find(|c| c.name == "ProfileBody")
        .and_then(|b| b.children.iter_mut().find(|c| c.name == "DeviceFunction"))
        .and_then(|f| f.children.iter_mut().find(|c| c.name == "VariableCollection"))
        .unwrap();
    variables.children.retain(|v| v.attr("id") != Some("V_Setpoint"));

    let diff = diff_trees(&original, &rebuilt, &DiffConfig::default()).unwrap();
    assert_eq!(diff.records.len(), 1);
    assert_eq!(diff.records[0].category, DiffCategory::MissingElement);
    assert!(diff.records[0].path.ends_with("/VariableCollection/Variable[id=V_Setpoint]"));
    assert!(diff.score() < 100.0);
}

#[test]
fn test_extra_connection_is_one_extra_element() {
    let bytes = load_test_file(EDS_V3);
    let text = String::from_utf8(bytes.clone()).unwrap();
    let modified = text.replacen(
        "[Connection Manager]\n",
        "[Connection Manager]\n\tConnection0 = \"E0\";\n",
        1,
    );
    assert_ne!(text, modified);

    let original = devdesc_rs_eds::read_tree(&bytes, EDS_V3).unwrap();
    let rebuilt = devdesc_rs_eds::read_tree(modified.as_bytes(), "modified.eds").unwrap();
    let diff = diff_trees(&original, &rebuilt, &DiffConfig::default()).unwrap();
    assert_eq!(diff.records.len(), 1);
    assert_eq!(diff.records[0].category, DiffCategory::ExtraElement);
    assert_eq!(
        diff.records[0].path,
        "/EDS/Section[name=Connection Manager]/Entry[key=Connection0]"
    );
}

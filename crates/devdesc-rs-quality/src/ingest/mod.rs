// crates/devdesc-rs-quality/src/ingest/mod.rs

//! The ingestion controller.
//!
//! Turns raw input bytes (a ZIP container or a single document) into an
//! [`IngestionPlan`]: one parsed document per device, chosen among the
//! revisions found, plus a record of everything that was not chosen.
//! Bounds are enforced before the first document is parsed.

mod archive;
mod select;
mod sniff;

pub use archive::{Deadline, ExtractedFile, extract, is_zip};
pub use select::{Candidate, Selection, SelectionPolicy, TieBreak, iodd_revision_key, select_canonical};
pub use sniff::sniff_format;

use crate::reconstruct::parse_document;
use archive::archive_error;
use devdesc_rs::error::{ArchiveErrorKind, DevDescError, Result};
use devdesc_rs::log::LogContext;
use devdesc_rs::{DeviceDocument, DocumentFormat, ParseOptions, content_checksum, dd_debug, dd_info, dd_warn};
use serde::Deserialize;
use std::collections::HashMap;

/// Size, count and time bounds of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngestionLimits {
    /// Largest accepted input, container or single document.
    pub max_input_bytes: u64,
    /// Largest uncompressed size of one container entry.
    pub max_entry_bytes: u64,
    /// Largest uncompressed size of all entries together.
    pub max_total_bytes: u64,
    pub max_entries: usize,
    /// Uncompressed / compressed size of one entry.
    pub max_compression_ratio: u64,
    pub time_budget_ms: u64,
}

impl Default for IngestionLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 64 * 1024 * 1024,
            max_entry_bytes: 16 * 1024 * 1024,
            max_total_bytes: 256 * 1024 * 1024,
            max_entries: 1000,
            max_compression_ratio: 100,
            time_budget_ms: 30_000,
        }
    }
}

/// A document chosen to represent its device.
#[derive(Debug, Clone)]
pub struct SelectedDocument {
    pub file_name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
    pub checksum: String,
    pub document: DeviceDocument,
    /// Non-fatal parser findings.
    pub warnings: Vec<String>,
}

impl SelectedDocument {
    pub fn device_key(&self) -> String {
        self.document.key().0
    }
}

/// An older (or tie-losing) revision of a selected device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupersededDocument {
    pub file_name: String,
    pub device_key: String,
    /// File name of the selected revision.
    pub superseded_by: String,
}

/// A file whose bytes were already seen under another name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateDocument {
    pub file_name: String,
    pub duplicate_of: String,
    pub checksum: String,
}

#[derive(Debug, Default)]
pub struct IngestionPlan {
    pub selected: Vec<SelectedDocument>,
    pub superseded: Vec<SupersededDocument>,
    pub duplicates: Vec<DuplicateDocument>,
    /// Entries that are not device descriptions.
    pub skipped: Vec<String>,
    /// Per-file failures; none of them stopped the ingestion.
    pub failures: Vec<DevDescError>,
}

struct ParsedFile {
    file: ExtractedFile,
    format: DocumentFormat,
    checksum: String,
    document: DeviceDocument,
    warnings: Vec<String>,
}

/// Unpacks, sniffs, deduplicates, parses and selects.
///
/// # Errors
/// An `ArchiveError` when the input as a whole is rejected: too large, a
/// corrupt or oversized container, an exhausted time budget, or a single
/// document of unknown format. Everything else lands in the plan.
pub fn plan_ingestion(
    bytes: &[u8],
    file_name: &str,
    limits: &IngestionLimits,
    policy: &SelectionPolicy,
    options: ParseOptions,
) -> Result<IngestionPlan> {
    let log = LogContext::new("ingest");
    let size = bytes.len() as u64;
    if size > limits.max_input_bytes {
        return Err(archive_error(
            file_name,
            ArchiveErrorKind::Oversized {
                limit: limits.max_input_bytes,
                actual: size,
            },
        ));
    }

    let deadline = Deadline::start(limits.time_budget_ms);
    let mut plan = IngestionPlan::default();
    let files = if is_zip(bytes) {
        let extraction = extract(bytes, file_name, limits, &deadline)?;
        plan.failures.extend(extraction.failures);
        extraction.files
    } else {
        if sniff_format(file_name, bytes).is_none() {
            return Err(archive_error(
                file_name,
                ArchiveErrorKind::UnsupportedFormat(file_name.to_string()),
            ));
        }
        vec![ExtractedFile {
            name: file_name.to_string(),
            bytes: bytes.to_vec(),
            order: 0,
        }]
    };

    let mut seen: HashMap<String, String> = HashMap::new();
    let mut parsed: Vec<ParsedFile> = Vec::new();
    for file in files {
        deadline.check(file_name)?;
        let Some(format) = sniff_format(&file.name, &file.bytes) else {
            dd_debug!(log, "Skipping {}", file.name);
            plan.skipped.push(file.name);
            continue;
        };
        let checksum = content_checksum(&file.bytes);
        if let Some(first) = seen.get(&checksum) {
            plan.duplicates.push(DuplicateDocument {
                file_name: file.name,
                duplicate_of: first.clone(),
                checksum,
            });
            continue;
        }
        seen.insert(checksum.clone(), file.name.clone());

        match parse_document(format, &file.bytes, &file.name, options) {
            Ok(doc) => parsed.push(ParsedFile {
                file,
                format,
                checksum,
                document: doc.document,
                warnings: doc.warnings,
            }),
            Err(err) => {
                dd_warn!(log, "Failed to parse {}: {}", file.name, err);
                plan.failures.push(err.with_source(&file.name));
            }
        }
    }

    let selections = {
        let candidates: Vec<Candidate<'_>> = parsed
            .iter()
            .map(|p| Candidate {
                file_name: &p.file.name,
                order: p.file.order,
                document: &p.document,
            })
            .collect();
        select_canonical(&candidates, policy)
    };

    let mut slots: Vec<Option<ParsedFile>> = parsed.into_iter().map(Some).collect();
    for selection in selections {
        let Some(winner) = slots[selection.winner].take() else {
            continue;
        };
        for index in selection.superseded {
            if let Some(loser) = slots[index].take() {
                plan.superseded.push(SupersededDocument {
                    file_name: loser.file.name,
                    device_key: loser.document.key().0,
                    superseded_by: winner.file.name.clone(),
                });
            }
        }
        plan.selected.push(SelectedDocument {
            file_name: winner.file.name,
            format: winner.format,
            bytes: winner.file.bytes,
            checksum: winner.checksum,
            document: winner.document,
            warnings: winner.warnings,
        });
    }

    dd_info!(
        log,
        "Planned {}: {} selected, {} superseded, {} duplicates, {} skipped, {} failed",
        file_name,
        plan.selected.len(),
        plan.superseded.len(),
        plan.duplicates.len(),
        plan.skipped.len(),
        plan.failures.len()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive::tests::zip_of;
    use zip::CompressionMethod;

    const EDS_V1: &str = "[File]\nRevision = 1.0;\n[Device]\nVendCode = 7;\nProdCode = 9;\nMajRev = 1;\nMinRev = 0;\nProdName = \"Probe\";\n";
    const EDS_V3: &str = "[File]\nRevision = 3.0;\n[Device]\nVendCode = 7;\nProdCode = 9;\nMajRev = 3;\nMinRev = 0;\nProdName = \"Probe\";\n";

    fn plan_default(bytes: &[u8], name: &str) -> Result<IngestionPlan> {
        plan_ingestion(
            bytes,
            name,
            &IngestionLimits::default(),
            &SelectionPolicy::default(),
            ParseOptions::default(),
        )
    }

    #[test]
    fn test_newest_revision_is_selected_from_archive() {
        let zip = zip_of(
            &[
                ("probe_v1.eds", EDS_V1.as_bytes()),
                ("readme.txt", b"notes".as_slice()),
                ("copy_of_v1.eds", EDS_V1.as_bytes()),
                ("probe_v3.eds", EDS_V3.as_bytes()),
            ],
            CompressionMethod::Deflated,
        );
        let plan = plan_default(&zip, "pkg.zip").unwrap();
        assert_eq!(plan.selected.len(), 1);
        assert_eq!(plan.selected[0].file_name, "pkg.zip/probe_v3.eds");
        assert_eq!(plan.selected[0].device_key(), "eds:7:9:3.0");
        assert_eq!(
            plan.superseded,
            vec![SupersededDocument {
                file_name: "pkg.zip/probe_v1.eds".into(),
                device_key: "eds:7:9:1.0".into(),
                superseded_by: "pkg.zip/probe_v3.eds".into(),
            }]
        );
        assert_eq!(plan.duplicates.len(), 1);
        assert_eq!(plan.duplicates[0].duplicate_of, "pkg.zip/probe_v1.eds");
        assert_eq!(plan.skipped, vec!["pkg.zip/readme.txt".to_string()]);
        assert!(plan.failures.is_empty());
    }

    #[test]
    fn test_broken_file_does_not_stop_the_batch() {
        let zip = zip_of(
            &[
                ("broken.eds", b"[Device]\nVendCode = seven;\n".as_slice()),
                ("probe.eds", EDS_V1.as_bytes()),
            ],
            CompressionMethod::Stored,
        );
        let plan = plan_default(&zip, "pkg.zip").unwrap();
        assert_eq!(plan.selected.len(), 1);
        assert_eq!(plan.failures.len(), 1);
        assert_eq!(
            plan.failures[0].context().source_file.as_deref(),
            Some("pkg.zip/broken.eds")
        );
    }

    #[test]
    fn test_single_document_and_input_bounds() {
        let plan = plan_default(EDS_V3.as_bytes(), "probe.eds").unwrap();
        assert_eq!(plan.selected.len(), 1);

        let err = plan_default(b"just text", "notes.txt").unwrap_err();
        assert!(matches!(
            err,
            DevDescError::Archive {
                kind: ArchiveErrorKind::UnsupportedFormat(_),
                ..
            }
        ));

        let tiny = IngestionLimits {
            max_input_bytes: 8,
            ..IngestionLimits::default()
        };
        let err = plan_ingestion(
            EDS_V3.as_bytes(),
            "probe.eds",
            &tiny,
            &SelectionPolicy::default(),
            ParseOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DevDescError::Archive {
                kind: ArchiveErrorKind::Oversized { limit: 8, .. },
                ..
            }
        ));
    }
}

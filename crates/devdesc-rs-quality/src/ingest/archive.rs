// crates/devdesc-rs-quality/src/ingest/archive.rs

//! ZIP unpacking under size, count, ratio and time bounds.
//!
//! Declared sizes are checked from the central directory before any entry
//! is decompressed. Reads are capped as well, so an entry that lies about
//! its size is still cut off at the limit.

use super::IngestionLimits;
use devdesc_rs::error::{ArchiveErrorKind, DevDescError, ErrorContext, Result};
use std::io::{Cursor, Read};
use std::time::{Duration, Instant};
use zip::ZipArchive;

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Containers are recognised by their signature, never by extension.
pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_SIGNATURE)
}

/// One file taken out of the input.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path inside the input, nested containers joined with `/`.
    pub name: String,
    pub bytes: Vec<u8>,
    /// Position in extraction order, across all containers.
    pub order: usize,
}

/// Wall clock budget of one ingestion.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn start(budget_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            budget: Duration::from_millis(budget_ms),
        }
    }

    pub fn check(&self, source: &str) -> Result<()> {
        if self.start.elapsed() >= self.budget {
            return Err(archive_error(
                source,
                ArchiveErrorKind::TimeBudgetExceeded {
                    budget_ms: self.budget.as_millis() as u64,
                },
            ));
        }
        Ok(())
    }
}

pub(crate) fn archive_error(source: &str, kind: ArchiveErrorKind) -> DevDescError {
    DevDescError::archive(ErrorContext::new("archive").with_source(source), kind)
}

fn corrupt(source: &str, err: impl std::fmt::Display) -> DevDescError {
    archive_error(source, ArchiveErrorKind::Corrupt(err.to_string()))
}

/// Files of a container plus the per-entry failures that did not stop it.
#[derive(Debug, Default)]
pub struct Extraction {
    pub files: Vec<ExtractedFile>,
    pub failures: Vec<DevDescError>,
}

/// Unpacks `bytes` and one level of nested containers.
///
/// # Errors
/// An `ArchiveError` for the outer container when it is corrupt, exceeds a
/// bound or runs out of time. Problems confined to one nested container are
/// reported in `Extraction::failures` instead.
pub fn extract(
    bytes: &[u8],
    source: &str,
    limits: &IngestionLimits,
    deadline: &Deadline,
) -> Result<Extraction> {
    let mut extraction = Extraction::default();
    let mut total: u64 = 0;
    extract_level(bytes, source, limits, deadline, 0, &mut total, &mut extraction)?;
    Ok(extraction)
}

fn extract_level(
    bytes: &[u8],
    source: &str,
    limits: &IngestionLimits,
    deadline: &Deadline,
    depth: usize,
    total: &mut u64,
    out: &mut Extraction,
) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(source, e))?;
    if archive.len() > limits.max_entries {
        return Err(archive_error(
            source,
            ArchiveErrorKind::TooManyEntries {
                limit: limits.max_entries,
                actual: archive.len(),
            },
        ));
    }

    // Central directory pass: nothing is decompressed yet.
    let mut declared_total = *total;
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i).map_err(|e| corrupt(source, e))?;
        let size = entry.size();
        let entry_source = format!("{}/{}", source, entry.name());
        if size > limits.max_entry_bytes {
            return Err(archive_error(
                &entry_source,
                ArchiveErrorKind::Oversized {
                    limit: limits.max_entry_bytes,
                    actual: size,
                },
            ));
        }
        let compressed = entry.compressed_size().max(1);
        if size / compressed > limits.max_compression_ratio {
            return Err(archive_error(
                &entry_source,
                ArchiveErrorKind::Oversized {
                    limit: limits.max_compression_ratio,
                    actual: size / compressed,
                },
            ));
        }
        declared_total = declared_total.saturating_add(size);
    }
    if declared_total > limits.max_total_bytes {
        return Err(archive_error(
            source,
            ArchiveErrorKind::Oversized {
                limit: limits.max_total_bytes,
                actual: declared_total,
            },
        ));
    }

    for i in 0..archive.len() {
        deadline.check(source)?;
        let mut entry = archive.by_index(i).map_err(|e| corrupt(source, e))?;
        if entry.is_dir() {
            continue;
        }
        let name = format!("{}/{}", source, entry.name());
        let mut data = Vec::new();
        (&mut entry)
            .take(limits.max_entry_bytes + 1)
            .read_to_end(&mut data)
            .map_err(|e| corrupt(&name, e))?;
        drop(entry);

        let read = data.len() as u64;
        *total = total.saturating_add(read);
        if read > limits.max_entry_bytes || *total > limits.max_total_bytes {
            return Err(archive_error(
                &name,
                ArchiveErrorKind::Oversized {
                    limit: limits.max_entry_bytes.min(limits.max_total_bytes),
                    actual: read.max(*total),
                },
            ));
        }

        if is_zip(&data) {
            if depth > 0 {
                out.failures
                    .push(archive_error(&name, ArchiveErrorKind::UnsupportedNesting));
                continue;
            }
            let mut nested = Extraction::default();
            let mut nested_total = *total;
            match extract_level(&data, &name, limits, deadline, depth + 1, &mut nested_total, &mut nested) {
                Ok(()) => {
                    *total = nested_total;
                    for mut file in nested.files {
                        file.order = out.files.len();
                        out.files.push(file);
                    }
                    out.failures.extend(nested.failures);
                }
                // Running out of time ends the whole ingestion.
                Err(err @ DevDescError::Archive {
                    kind: ArchiveErrorKind::TimeBudgetExceeded { .. },
                    ..
                }) => return Err(err),
                Err(err) => out.failures.push(err),
            }
            continue;
        }

        let order = out.files.len();
        out.files.push(ExtractedFile {
            name,
            bytes: data,
            order,
        });
    }
    Ok(())
}

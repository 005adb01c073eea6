// crates/devdesc-rs-eds/src/builder/mod.rs

//! Rebuilds EDS text from a stored [`DeviceSnapshot`].
//!
//! Sections are written in their stored order. `[Params]`, `[Assembly]` and
//! `[Connection Manager]` get their properties first and then one entry per
//! entity row; every other section is written from its properties alone.
//! Comments and the original line layout are not reproduced.

use crate::layout::{ASSEMBLY, CONNECTION_MANAGER, DEVICE, PARAMS};
use devdesc_rs::document::DocumentFormat;
use devdesc_rs::entity::DeviceSnapshot;
use devdesc_rs::error::{DevDescError, ErrorContext, Result};
use devdesc_rs::log::LogContext;
use devdesc_rs::{Reconstruction, SectionLog, SnapshotView, dd_debug};

mod assembly;
mod params;

/// One `key = value;` line.
pub(crate) struct EdsEntry {
    pub key: String,
    pub value: String,
}

impl EdsEntry {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Builds an EDS file from a device snapshot.
///
/// Sections whose rows are inconsistent are left out and listed in
/// `Reconstruction::incomplete_sections`.
///
/// # Errors
/// Only when the snapshot is not an EDS snapshot at all.
pub fn build_eds(snapshot: &DeviceSnapshot) -> Result<Reconstruction> {
    if snapshot.device.format != DocumentFormat::Eds {
        return Err(DevDescError::reconstruction(
            ErrorContext::new("EDS").with_device(snapshot.key()),
            "EDS",
            format!("snapshot is a {} document", snapshot.device.format),
        ));
    }

    let view = SnapshotView::new(snapshot);
    let mut log = SectionLog::new(snapshot.key());
    let mut out = String::new();
    out.push_str(&format!("$ {}\n", snapshot.key()));

    for section in view.sections() {
        let name = section.name.as_str();
        let mut entries: Vec<EdsEntry> = view
            .properties_of(name)
            .map(|p| EdsEntry::new(p.key.as_str(), p.value.as_str()))
            .collect();
        match name {
            PARAMS => entries.extend(params::build_params(&view, &mut log)),
            ASSEMBLY => entries.extend(assembly::build_assemblies(&view, &mut log)),
            CONNECTION_MANAGER => entries.extend(assembly::build_connections(&view, &mut log)),
            _ => {}
        }
        write_section(&mut out, name, &entries);
    }

    check_sections(&view, &mut log);

    let log_ctx = LogContext::device("eds", snapshot.key());
    dd_debug!(log_ctx, "rebuilt {} sections", view.sections().len());
    Ok(log.finish(out.into_bytes()))
}

fn write_section(out: &mut String, name: &str, entries: &[EdsEntry]) {
    out.push('\n');
    out.push_str(&format!("[{}]\n", name));
    for entry in entries {
        out.push_str(&format!("\t{} = {};\n", entry.key, entry.value));
    }
}

/// Entity rows can only be written inside their own section; rows without
/// one, and a missing identity section, mark the snapshot incomplete.
fn check_sections(view: &SnapshotView<'_>, log: &mut SectionLog) {
    let has = |name: &str| view.sections().iter().any(|s| s.name == name);
    let required = [
        (DEVICE, true),
        (PARAMS, !view.parameters().is_empty()),
        (ASSEMBLY, !view.assemblies().is_empty()),
        (CONNECTION_MANAGER, !view.connections().is_empty()),
    ];
    for (name, needed) in required {
        if needed && !has(name) {
            let err = log.missing(name, format!("no [{}] section row is stored", name));
            log.section::<()>(name, Err(err));
        }
    }
}

/// A display text as a quoted field; an absent text is an empty field.
pub(crate) fn quoted_text(
    view: &SnapshotView<'_>,
    text_id: Option<&String>,
    section: &str,
    log: &SectionLog,
) -> Result<String> {
    match text_id {
        None => Ok(String::new()),
        Some(id) => view
            .text(id)
            .map(|value| format!("\"{}\"", value))
            .ok_or_else(|| log.missing(section, format!("text '{}' has no row", id))),
    }
}

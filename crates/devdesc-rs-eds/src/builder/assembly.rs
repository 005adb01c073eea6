// crates/devdesc-rs-eds/src/builder/assembly.rs

//! `AssemN` and `ConnectionN` entries.

use super::{EdsEntry, quoted_text};
use crate::layout::*;
use devdesc_rs::entity::{AssemblyRow, ConnectionRow};
use devdesc_rs::error::Result;
use devdesc_rs::{SectionLog, SnapshotView};

pub(super) fn build_assemblies(view: &SnapshotView<'_>, log: &mut SectionLog) -> Vec<EdsEntry> {
    let results: Vec<Result<EdsEntry>> = view
        .assemblies()
        .iter()
        .map(|a| build_assembly(view, a, log))
        .collect();
    log.items(ASSEMBLY, results)
}

fn build_assembly(view: &SnapshotView<'_>, a: &AssemblyRow, log: &SectionLog) -> Result<EdsEntry> {
    let mut fields = vec![
        quoted_text(view, a.name_text.as_ref(), ASSEMBLY, log)?,
        a.path.clone().unwrap_or_default(),
        a.size.clone().unwrap_or_default(),
        a.descriptor.clone().unwrap_or_default(),
    ];
    fields.extend(a.reserved.iter().cloned());

    let members = view.members_of(&a.id);
    if !members.is_empty() {
        // Members always start at the same position.
        fields.resize(ASSEM_MEMBERS, String::new());
    } else if a.reserved.is_empty() {
        // A short header entry (`AssemN = "name";`) stays short.
        while fields.len() > 1 && fields.last().is_some_and(String::is_empty) {
            fields.pop();
        }
    }
    let mut offset: u32 = 0;
    for m in members {
        if m.bit_offset != offset {
            return Err(log.missing(
                ASSEMBLY,
                format!(
                    "{} member {} sits at bit {} but the preceding sizes add up to {}",
                    a.id, m.ordinal, m.bit_offset, offset
                ),
            ));
        }
        offset = offset.saturating_add(m.bit_size.unwrap_or(0));
        fields.push(m.bit_size.map(|s| s.to_string()).unwrap_or_default());
        fields.push(m.reference.clone());
    }
    Ok(EdsEntry::new(a.id.as_str(), fields.join(",")))
}

pub(super) fn build_connections(view: &SnapshotView<'_>, log: &mut SectionLog) -> Vec<EdsEntry> {
    let results: Vec<Result<EdsEntry>> = view
        .connections()
        .iter()
        .map(|c| build_connection(view, c, log))
        .collect();
    log.items(CONNECTION_MANAGER, results)
}

/// The stored raw fields, with the display strings taken from the text pool.
fn build_connection(
    view: &SnapshotView<'_>,
    c: &ConnectionRow,
    log: &SectionLog,
) -> Result<EdsEntry> {
    if c.fields.is_empty() {
        return Err(log.missing(
            CONNECTION_MANAGER,
            format!("{} has no stored fields", c.id),
        ));
    }
    let mut fields = c.fields.clone();
    for (position, text) in [(CONN_NAME, &c.name_text), (CONN_HELP, &c.help_text)] {
        if text.is_some() && position < fields.len() {
            fields[position] = quoted_text(view, text.as_ref(), CONNECTION_MANAGER, log)?;
        }
    }
    Ok(EdsEntry::new(c.id.as_str(), fields.join(",")))
}

// crates/devdesc-rs-eds/src/builder/params.rs

use super::{EdsEntry, quoted_text};
use crate::layout::*;
use devdesc_rs::document::{EntryVariant, find_attribute};
use devdesc_rs::entity::{DatatypeRow, ParameterRow};
use devdesc_rs::error::Result;
use devdesc_rs::{SectionLog, SnapshotView};
use std::collections::BTreeSet;

/// `ParamN` entries, each followed by its `EnumN`, then any enumeration
/// whose parameter is gone.
pub(super) fn build_params(view: &SnapshotView<'_>, log: &mut SectionLog) -> Vec<EdsEntry> {
    let enums: Vec<&DatatypeRow> = view
        .datatypes()
        .iter()
        .copied()
        .filter(|d| d.kind == ENUM_KIND)
        .collect();
    let mut written: BTreeSet<&str> = BTreeSet::new();
    let mut entries = Vec::new();

    for param in view.parameters() {
        let owned: Vec<&DatatypeRow> = enums
            .iter()
            .copied()
            .filter(|d| d.owner.as_deref() == Some(param.id.as_str()))
            .collect();
        // A dropped parameter takes its enumeration with it.
        written.extend(owned.iter().map(|&d| d.id.as_str()));

        let built = build_param(view, param, log);
        let Some(entry) = log.section(PARAMS, built) else {
            continue;
        };
        entries.push(entry);
        for dt in owned {
            let built = build_enum(view, dt, log);
            if let Some(entry) = log.section(PARAMS, built) {
                entries.push(entry);
            }
        }
    }
    for dt in enums.iter().filter(|d| !written.contains(d.id.as_str())) {
        let built = build_enum(view, dt, log);
        if let Some(entry) = log.section(PARAMS, built) {
            entries.push(entry);
        }
    }
    entries
}

fn field_position(attribute: &str) -> Option<usize> {
    PARAM_RAW_FIELDS
        .iter()
        .find(|(_, name)| *name == attribute)
        .map(|(position, _)| *position)
        .or_else(|| param_extra_index(attribute))
}

fn build_param(view: &SnapshotView<'_>, p: &ParameterRow, log: &SectionLog) -> Result<EdsEntry> {
    if p.variant != EntryVariant::Full {
        return Err(log.missing(
            PARAMS,
            format!("{} is a standard reference, which EDS cannot express", p.id),
        ));
    }
    for (_, name) in &PARAM_RAW_FIELDS[..6] {
        if find_attribute(&p.attributes, name).is_none() {
            return Err(log.missing(PARAMS, format!("{} has no '{}' field", p.id, name)));
        }
    }

    let mut positioned = Vec::with_capacity(p.attributes.len());
    for attribute in &p.attributes {
        let position = field_position(&attribute.name).ok_or_else(|| {
            log.missing(
                PARAMS,
                format!("{} has an unplaceable field '{}'", p.id, attribute.name),
            )
        })?;
        positioned.push((position, attribute.value.as_str()));
    }
    let count = positioned
        .iter()
        .map(|(position, _)| position + 1)
        .max()
        .unwrap_or(0)
        .max(PARAM_MIN_FIELDS);

    let mut fields = vec![String::new(); count];
    for (position, value) in positioned {
        fields[position] = value.to_string();
    }
    fields[PARAM_NAME] = quoted_text(view, p.name_text.as_ref(), PARAMS, log)?;
    fields[PARAM_UNITS] = quoted_text(view, p.unit_text.as_ref(), PARAMS, log)?;
    fields[PARAM_HELP] = quoted_text(view, p.description_text.as_ref(), PARAMS, log)?;
    fields[PARAM_MIN] = p.min.clone().unwrap_or_default();
    fields[PARAM_MAX] = p.max.clone().unwrap_or_default();
    fields[PARAM_DEFAULT] = p.default_value.clone().unwrap_or_default();

    Ok(EdsEntry::new(p.id.as_str(), fields.join(",")))
}

fn build_enum(view: &SnapshotView<'_>, dt: &DatatypeRow, log: &SectionLog) -> Result<EdsEntry> {
    let mut fields = Vec::new();
    for value in view.values_of(&dt.id, None) {
        fields.push(value.value.clone());
        fields.push(quoted_text(view, value.name_text.as_ref(), PARAMS, log)?);
    }
    Ok(EdsEntry::new(dt.id.as_str(), fields.join(",")))
}

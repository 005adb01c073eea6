// crates/devdesc-rs-iodd/src/builder/variables.rs

//! Parameter rows back into `<VariableCollection>`.
//!
//! Whether a row becomes a `StdVariableRef` or a full `Variable` is read from
//! its stored variant tag.

use super::datatypes::build_inline;
use super::num;
use crate::model::TextId;
use crate::model::common::DatatypeRef;
use crate::model::device_function::{
    RecordItemInfo, StdRecordItemRef, StdSingleValueRef, StdVariableRef, StdVariableRefItem,
    Variable, VariableCollection, VariableItem,
};
use crate::resolver::header::blocks;
use devdesc_rs::document::{Attribute, EntryVariant, find_attribute};
use devdesc_rs::entity::{ParameterOverrideRow, ParameterRow};
use devdesc_rs::error::Result;
use devdesc_rs::{SectionLog, SnapshotView};

const SECTION: &str = blocks::VARIABLE_COLLECTION;

pub(super) fn build_variable_collection(
    view: &SnapshotView<'_>,
    log: &mut SectionLog,
) -> VariableCollection {
    let results: Vec<Result<VariableItem>> = view
        .parameters()
        .iter()
        .map(|p| match p.variant {
            EntryVariant::Full => build_variable(view, p, log).map(VariableItem::Variable),
            EntryVariant::StdRef => build_std_ref(view, p, log).map(VariableItem::StdVariableRef),
        })
        .collect();
    VariableCollection {
        items: log.items(SECTION, results),
    }
}

fn attr(attributes: &[Attribute], name: &str) -> Option<String> {
    find_attribute(attributes, name).map(str::to_string)
}

fn required(
    row: &ParameterOverrideRow,
    name: &str,
    log: &SectionLog,
) -> Result<String> {
    attr(&row.attributes, name).ok_or_else(|| {
        log.missing(
            SECTION,
            format!(
                "{} override of '{}' has no '{}'",
                row.element, row.parameter_id, name
            ),
        )
    })
}

fn build_variable(view: &SnapshotView<'_>, p: &ParameterRow, log: &SectionLog) -> Result<Variable> {
    let (datatype, datatype_ref) = match &p.datatype_id {
        Some(id) => match view.datatype(id) {
            Some(row) if row.inline => (Some(build_inline(view, id, SECTION, log)?), None),
            _ => (
                None,
                Some(DatatypeRef {
                    datatype_id: id.clone(),
                }),
            ),
        },
        None => (None, None),
    };

    let mut record_item_info = Vec::new();
    for o in view.overrides_of(&p.id) {
        if o.element != "RecordItemInfo" {
            return Err(log.missing(
                SECTION,
                format!("unexpected override '{}' on variable '{}'", o.element, p.id),
            ));
        }
        record_item_info.push(RecordItemInfo {
            subindex: required(o, "subindex", log)?,
            default_value: attr(&o.attributes, "defaultValue"),
            excluded_from_data_storage: attr(&o.attributes, "excludedFromDataStorage"),
            modifies_other_variables: attr(&o.attributes, "modifiesOtherVariables"),
        });
    }

    Ok(Variable {
        id: p.id.clone(),
        index: num(p.index),
        access_rights: p.access.clone(),
        default_value: p.default_value.clone(),
        dynamic: attr(&p.attributes, "dynamic"),
        modifies_other_variables: attr(&p.attributes, "modifiesOtherVariables"),
        excluded_from_data_storage: attr(&p.attributes, "excludedFromDataStorage"),
        datatype,
        datatype_ref,
        record_item_info,
        name: p.name_text.as_deref().map(TextId::new),
        description: p.description_text.as_deref().map(TextId::new),
    })
}

fn build_std_ref(
    view: &SnapshotView<'_>,
    p: &ParameterRow,
    log: &SectionLog,
) -> Result<StdVariableRef> {
    let mut items = Vec::new();
    for o in view.overrides_of(&p.id) {
        let item = match o.element.as_str() {
            "StdSingleValueRef" => StdVariableRefItem::StdSingleValueRef(StdSingleValueRef {
                value: required(o, "value", log)?,
            }),
            "StdRecordItemRef" => StdVariableRefItem::StdRecordItemRef(StdRecordItemRef {
                subindex: required(o, "subindex", log)?,
                default_value: attr(&o.attributes, "defaultValue"),
            }),
            other => {
                return Err(log.missing(
                    SECTION,
                    format!("unexpected override '{}' on '{}'", other, p.id),
                ));
            }
        };
        items.push(item);
    }
    Ok(StdVariableRef {
        id: p.id.clone(),
        default_value: p.default_value.clone(),
        fixed_length_restriction: attr(&p.attributes, "fixedLengthRestriction"),
        excluded_from_data_storage: attr(&p.attributes, "excludedFromDataStorage"),
        items,
    })
}

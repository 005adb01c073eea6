// crates/devdesc-rs-iodd/src/resolver/variables.rs

//! Pass 4: `<VariableCollection>` into parameter entries.

use super::datatypes::register_inline;
use super::utils::{collect_attributes, parse_u32_opt};
use crate::model::device_function::{
    StdVariableRef, StdVariableRefItem, Variable, VariableCollection, VariableItem,
};
use devdesc_rs::IngestionContext;
use devdesc_rs::document::{ElementOverride, ParameterDef, ParameterEntry, StdParameterRef};
use devdesc_rs::error::Result;

pub(super) fn resolve_variables(
    collection: Option<&VariableCollection>,
    ctx: &mut IngestionContext,
) -> Result<Vec<ParameterEntry>> {
    let Some(collection) = collection else {
        return Ok(Vec::new());
    };
    ctx.within("VariableCollection", |ctx| {
        let mut entries = Vec::with_capacity(collection.items.len());
        for item in &collection.items {
            let entry = match item {
                VariableItem::Variable(v) => ctx.within(format!("Variable[{}]", v.id), |ctx| {
                    resolve_variable(v, ctx).map(ParameterEntry::Full)
                })?,
                VariableItem::StdVariableRef(r) => {
                    ParameterEntry::StdRef(resolve_std_ref(r))
                }
            };
            entries.push(entry);
        }
        Ok(entries)
    })
}

fn resolve_variable(v: &Variable, ctx: &mut IngestionContext) -> Result<ParameterDef> {
    let datatype = match (&v.datatype, &v.datatype_ref) {
        (Some(inline), _) => Some(register_inline(inline, &v.id, ctx)?),
        (None, Some(r)) => Some(ctx.resolve_datatype(&r.datatype_id)?),
        (None, None) => None,
    };
    let overrides = v
        .record_item_info
        .iter()
        .map(|info| ElementOverride {
            element: "RecordItemInfo".to_string(),
            attributes: collect_attributes(&[
                ("subindex", Some(&info.subindex)),
                ("defaultValue", info.default_value.as_ref()),
                ("excludedFromDataStorage", info.excluded_from_data_storage.as_ref()),
                ("modifiesOtherVariables", info.modifies_other_variables.as_ref()),
            ]),
        })
        .collect();

    Ok(ParameterDef {
        id: v.id.clone(),
        index: parse_u32_opt(ctx, "index", v.index.as_ref())?,
        subindex: None,
        access: v.access_rights.clone(),
        datatype,
        default_value: v.default_value.clone(),
        min: None,
        max: None,
        name: ctx.resolve_text_opt(v.name.as_ref().map(|n| n.text_id.as_str()))?,
        description: ctx.resolve_text_opt(v.description.as_ref().map(|n| n.text_id.as_str()))?,
        unit: None,
        attributes: collect_attributes(&[
            ("dynamic", v.dynamic.as_ref()),
            ("modifiesOtherVariables", v.modifies_other_variables.as_ref()),
            ("excludedFromDataStorage", v.excluded_from_data_storage.as_ref()),
        ]),
        overrides,
    })
}

/// Standard references point at library definitions outside the document,
/// so there is nothing to resolve locally.
fn resolve_std_ref(r: &StdVariableRef) -> StdParameterRef {
    let overrides = r
        .items
        .iter()
        .map(|item| match item {
            StdVariableRefItem::StdSingleValueRef(v) => ElementOverride {
                element: "StdSingleValueRef".to_string(),
                attributes: collect_attributes(&[("value", Some(&v.value))]),
            },
            StdVariableRefItem::StdRecordItemRef(ri) => ElementOverride {
                element: "StdRecordItemRef".to_string(),
                attributes: collect_attributes(&[
                    ("subindex", Some(&ri.subindex)),
                    ("defaultValue", ri.default_value.as_ref()),
                ]),
            },
        })
        .collect();
    StdParameterRef {
        id: r.id.clone(),
        default_value: r.default_value.clone(),
        attributes: collect_attributes(&[
            ("fixedLengthRestriction", r.fixed_length_restriction.as_ref()),
            ("excludedFromDataStorage", r.excluded_from_data_storage.as_ref()),
        ]),
        overrides,
    }
}

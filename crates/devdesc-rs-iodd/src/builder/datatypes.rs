// crates/devdesc-rs-iodd/src/builder/datatypes.rs

//! Datatype rows back into `<Datatype>` elements, both for the collection
//! and for the inline declarations of variables and process data.

use super::num;
use crate::model::TextId;
use crate::model::common::DatatypeRef;
use crate::model::datatype::{
    Datatype, DatatypeCollection, DatatypeItem, RecordItem, SingleValue, ValueRange,
};
use devdesc_rs::SnapshotView;
use devdesc_rs::document::{ValueKind, find_attribute};
use devdesc_rs::entity::{DatatypeRow, DatatypeValueRow, RecordItemRow};
use devdesc_rs::error::Result;
use devdesc_rs::SectionLog;

pub(super) fn build_datatype_collection(
    view: &SnapshotView<'_>,
    log: &SectionLog,
) -> Result<DatatypeCollection> {
    let datatype = view
        .datatypes()
        .iter()
        .filter(|d| !d.inline)
        .map(|d| build_datatype(view, d, log))
        .collect::<Result<Vec<_>>>()?;
    Ok(DatatypeCollection { datatype })
}

/// The inline datatype element for the row with id `datatype_id`.
pub(super) fn build_inline(
    view: &SnapshotView<'_>,
    datatype_id: &str,
    section: &str,
    log: &SectionLog,
) -> Result<Datatype> {
    let row = view
        .datatype(datatype_id)
        .ok_or_else(|| log.missing(section, format!("no datatype row '{}'", datatype_id)))?;
    build_datatype(view, row, log)
}

fn build_datatype(view: &SnapshotView<'_>, row: &DatatypeRow, log: &SectionLog) -> Result<Datatype> {
    let mut items = Vec::new();
    if let Some(kind) = &row.element_kind {
        items.push(DatatypeItem::SimpleDatatype(Box::new(Datatype {
            xsi_type: kind.clone(),
            bit_length: num(row.element_bit_length),
            fixed_length: num(row.element_fixed_length),
            encoding: row.element_encoding.clone(),
            ..Default::default()
        })));
    }
    items.extend(view.values_of(&row.id, None).iter().map(|v| value_item(v)));
    for item in view.record_children(&row.id, None) {
        items.push(DatatypeItem::RecordItem(build_record_item(view, row, item, log)?));
    }

    Ok(Datatype {
        id: (!row.inline).then(|| row.id.clone()),
        xsi_type: row.kind.clone(),
        bit_length: num(row.bit_length),
        fixed_length: num(row.fixed_length),
        count: num(row.count),
        encoding: row.encoding.clone(),
        subindex_access_supported: find_attribute(&row.attributes, "subindexAccessSupported")
            .map(str::to_string),
        items,
    })
}

fn value_item(v: &DatatypeValueRow) -> DatatypeItem {
    let name = v.name_text.as_deref().map(TextId::new);
    match (v.kind, &v.upper) {
        (ValueKind::Range, Some(upper)) => DatatypeItem::ValueRange(ValueRange {
            lower_value: v.value.clone(),
            upper_value: upper.clone(),
            name,
        }),
        _ => DatatypeItem::SingleValue(SingleValue {
            value: v.value.clone(),
            name,
        }),
    }
}

fn build_record_item(
    view: &SnapshotView<'_>,
    owner: &DatatypeRow,
    row: &RecordItemRow,
    log: &SectionLog,
) -> Result<RecordItem> {
    let simple_datatype = match &row.simple_kind {
        Some(kind) => {
            let mut items: Vec<DatatypeItem> = view
                .values_of(&owner.id, Some(row.item_index))
                .iter()
                .map(|v| value_item(v))
                .collect();
            for child in view.record_children(&owner.id, Some(row.item_index)) {
                items.push(DatatypeItem::RecordItem(build_record_item(view, owner, child, log)?));
            }
            Some(Box::new(Datatype {
                xsi_type: kind.clone(),
                bit_length: num(row.simple_bit_length),
                fixed_length: num(row.simple_fixed_length),
                encoding: row.simple_encoding.clone(),
                items,
                ..Default::default()
            }))
        }
        None if !view.record_children(&owner.id, Some(row.item_index)).is_empty() => {
            return Err(log.missing(
                "DatatypeCollection",
                format!(
                    "record item {} of '{}' has children but no simple type",
                    row.subindex, owner.id
                ),
            ));
        }
        None => None,
    };
    Ok(RecordItem {
        subindex: row.subindex.to_string(),
        bit_offset: row.bit_offset.to_string(),
        access_right_restriction: row.access_restriction.clone(),
        simple_datatype,
        datatype_ref: row.datatype_ref.as_ref().map(|id| DatatypeRef {
            datatype_id: id.clone(),
        }),
        name: row.name_text.as_deref().map(TextId::new),
        description: row.description_text.as_deref().map(TextId::new),
    })
}

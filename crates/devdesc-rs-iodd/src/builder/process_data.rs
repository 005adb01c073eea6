// crates/devdesc-rs-iodd/src/builder/process_data.rs

use super::datatypes::build_inline;
use super::num;
use crate::model::TextId;
use crate::model::common::DatatypeRef;
use crate::model::device_function::{
    Condition, ProcessData, ProcessDataCollection, ProcessDataItem,
};
use crate::resolver::header::blocks;
use devdesc_rs::document::Direction;
use devdesc_rs::entity::ProcessDataRow;
use devdesc_rs::error::Result;
use devdesc_rs::{SectionLog, SnapshotView};

const SECTION: &str = blocks::PROCESS_DATA_COLLECTION;

/// Regroups the in/out rows into their `ProcessData` element. Groups are
/// emitted in the order their first row appears.
pub(super) fn build_process_data_collection(
    view: &SnapshotView<'_>,
    log: &mut SectionLog,
) -> ProcessDataCollection {
    let mut groups: Vec<(&str, Vec<&ProcessDataRow>)> = Vec::new();
    for row in view.process_data().iter().copied() {
        match groups.iter_mut().find(|(id, _)| *id == row.group_id) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((row.group_id.as_str(), vec![row])),
        }
    }

    let results: Vec<Result<ProcessData>> = groups
        .into_iter()
        .map(|(group_id, rows)| build_group(view, group_id, &rows, log))
        .collect();
    ProcessDataCollection {
        process_data: log.items(SECTION, results),
    }
}

fn build_group(
    view: &SnapshotView<'_>,
    group_id: &str,
    rows: &[&ProcessDataRow],
    log: &SectionLog,
) -> Result<ProcessData> {
    let condition = rows.iter().find_map(|r| {
        Some(Condition {
            variable_id: r.condition_variable.clone()?,
            value: r.condition_value.clone().unwrap_or_default(),
        })
    });
    let mut pd = ProcessData {
        id: group_id.to_string(),
        condition,
        ..Default::default()
    };
    for row in rows {
        let slot = match row.direction {
            Direction::In => &mut pd.process_data_in,
            Direction::Out => &mut pd.process_data_out,
        };
        if slot.is_some() {
            return Err(log.missing(
                SECTION,
                format!(
                    "process data '{}' has two {} items",
                    group_id,
                    row.direction.as_str()
                ),
            ));
        }
        *slot = Some(build_item(view, row, log)?);
    }
    Ok(pd)
}

fn build_item(
    view: &SnapshotView<'_>,
    row: &ProcessDataRow,
    log: &SectionLog,
) -> Result<ProcessDataItem> {
    let (datatype, datatype_ref) = match &row.datatype_id {
        Some(id) => match view.datatype(id) {
            Some(dt) if dt.inline => (Some(build_inline(view, id, SECTION, log)?), None),
            _ => (
                None,
                Some(DatatypeRef {
                    datatype_id: id.clone(),
                }),
            ),
        },
        None => (None, None),
    };
    Ok(ProcessDataItem {
        id: row.id.clone(),
        bit_length: num(row.bit_length),
        datatype,
        datatype_ref,
        name: row.name_text.as_deref().map(TextId::new),
    })
}

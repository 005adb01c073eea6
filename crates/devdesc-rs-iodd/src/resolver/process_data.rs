// crates/devdesc-rs-iodd/src/resolver/process_data.rs

//! Pass 5: `<ProcessDataCollection>`.
//!
//! Each `ProcessData` element yields up to two items (in, then out) that
//! share its id as `group_id` and carry a copy of its condition.

use super::datatypes::register_inline;
use super::utils::parse_u32_opt;
use crate::model::device_function::{ProcessDataCollection, ProcessDataItem as ModelItem};
use devdesc_rs::IngestionContext;
use devdesc_rs::document::{Direction, ProcessDataCondition, ProcessDataItem};
use devdesc_rs::error::Result;

pub(super) fn resolve_process_data(
    collection: Option<&ProcessDataCollection>,
    ctx: &mut IngestionContext,
) -> Result<Vec<ProcessDataItem>> {
    let Some(collection) = collection else {
        return Ok(Vec::new());
    };
    ctx.within("ProcessDataCollection", |ctx| {
        let mut items = Vec::new();
        for pd in &collection.process_data {
            ctx.within(format!("ProcessData[{}]", pd.id), |ctx| {
                let condition = pd.condition.as_ref().map(|c| ProcessDataCondition {
                    variable_id: c.variable_id.clone(),
                    value: c.value.clone(),
                });
                let halves = [
                    (Direction::In, "ProcessDataIn", pd.process_data_in.as_ref()),
                    (Direction::Out, "ProcessDataOut", pd.process_data_out.as_ref()),
                ];
                for (direction, element, item) in halves {
                    if let Some(item) = item {
                        let resolved = ctx.within(element, |ctx| {
                            resolve_item(item, &pd.id, direction, condition.clone(), ctx)
                        })?;
                        items.push(resolved);
                    }
                }
                Ok(())
            })?;
        }
        Ok(items)
    })
}

fn resolve_item(
    item: &ModelItem,
    group_id: &str,
    direction: Direction,
    condition: Option<ProcessDataCondition>,
    ctx: &mut IngestionContext,
) -> Result<ProcessDataItem> {
    let datatype = match (&item.datatype, &item.datatype_ref) {
        (Some(inline), _) => Some(register_inline(inline, &item.id, ctx)?),
        (None, Some(r)) => Some(ctx.resolve_datatype(&r.datatype_id)?),
        (None, None) => None,
    };
    Ok(ProcessDataItem {
        id: item.id.clone(),
        group_id: group_id.to_string(),
        direction,
        bit_length: parse_u32_opt(ctx, "bitLength", item.bit_length.as_ref())?,
        datatype,
        name: ctx.resolve_text_opt(item.name.as_ref().map(|n| n.text_id.as_str()))?,
        condition,
    })
}

// crates/devdesc-rs-iodd/src/resolver/datatypes.rs

//! Pass 2: the datatype pool, plus the conversion used for inline datatypes.
//!
//! Record items are flattened in preorder. Each item gets an index unique
//! within its datatype; items nested inside a record item's
//! `SimpleDatatype` point back at it through `parent`.

use super::utils::{collect_attributes, parse_u32, parse_u32_opt};
use crate::model::datatype::{
    Datatype, DatatypeCollection, DatatypeItem, RecordItem as ModelRecordItem, SingleValue,
    ValueRange,
};
use devdesc_rs::IngestionContext;
use devdesc_rs::document::{DatatypeDef, DatatypeValue, RecordItem, SimpleType, ValueKind};
use devdesc_rs::error::{ParseErrorKind, Result};

/// Registers every named datatype. References between record items and
/// named types are checked once the whole collection is known, so forward
/// references are allowed.
pub(super) fn resolve_datatype_collection(
    collection: Option<&DatatypeCollection>,
    ctx: &mut IngestionContext,
) -> Result<()> {
    let Some(collection) = collection else {
        return Ok(());
    };
    ctx.within("DatatypeCollection", |ctx| {
        let mut ids = Vec::with_capacity(collection.datatype.len());
        for dt in &collection.datatype {
            let id = dt
                .id
                .clone()
                .ok_or_else(|| ctx.parse_error(ParseErrorKind::MissingAttribute("id")))?;
            let def = ctx.within(format!("Datatype[{}]", id), |ctx| {
                convert_datatype(dt, id.clone(), None, ctx)
            })?;
            ctx.register_datatype(def)?;
            ids.push(id);
        }
        for id in ids {
            let refs: Vec<String> = ctx
                .datatype(&id)
                .map(|d| {
                    d.record_items
                        .iter()
                        .filter_map(|i| i.datatype_ref.clone())
                        .collect()
                })
                .unwrap_or_default();
            ctx.within(format!("Datatype[{}]", id), |ctx| {
                for r in refs {
                    ctx.resolve_datatype(&r)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    })
}

/// Converts an inline datatype declared by `owner` and registers it as
/// `"<owner>#dt"`. Returns the new id.
pub(super) fn register_inline(
    dt: &Datatype,
    owner: &str,
    ctx: &mut IngestionContext,
) -> Result<String> {
    let id = devdesc_rs::document::inline_datatype_id(owner);
    let def = ctx.within("Datatype", |ctx| {
        let def = convert_datatype(dt, id.clone(), Some(owner), ctx)?;
        for item in &def.record_items {
            if let Some(r) = &item.datatype_ref {
                ctx.resolve_datatype(r)?;
            }
        }
        Ok(def)
    })?;
    ctx.register_datatype(def)?;
    Ok(id)
}

/// Converts a model datatype. Datatype references inside record items are
/// copied, not checked.
pub(super) fn convert_datatype(
    dt: &Datatype,
    id: String,
    owner: Option<&str>,
    ctx: &mut IngestionContext,
) -> Result<DatatypeDef> {
    let mut def = DatatypeDef {
        id,
        kind: dt.xsi_type.clone(),
        bit_length: parse_u32_opt(ctx, "bitLength", dt.bit_length.as_ref())?,
        fixed_length: parse_u32_opt(ctx, "fixedLength", dt.fixed_length.as_ref())?,
        count: parse_u32_opt(ctx, "count", dt.count.as_ref())?,
        encoding: dt.encoding.clone(),
        owner: owner.map(str::to_string),
        attributes: collect_attributes(&[(
            "subindexAccessSupported",
            dt.subindex_access_supported.as_ref(),
        )]),
        ..Default::default()
    };

    let mut next_index = 0u32;
    for item in &dt.items {
        match item {
            DatatypeItem::SingleValue(v) => def.values.push(single_value(v, ctx)?),
            DatatypeItem::ValueRange(r) => def.values.push(value_range(r, ctx)?),
            DatatypeItem::RecordItem(ri) => {
                flatten_record_item(ri, None, &mut def.record_items, &mut next_index, ctx)?
            }
            DatatypeItem::SimpleDatatype(element) => {
                def.element = Some(ctx.within("SimpleDatatype", |ctx| simple_type(element, ctx))?)
            }
        }
    }
    Ok(def)
}

fn simple_type(dt: &Datatype, ctx: &mut IngestionContext) -> Result<SimpleType> {
    let mut simple = SimpleType {
        kind: dt.xsi_type.clone(),
        bit_length: parse_u32_opt(ctx, "bitLength", dt.bit_length.as_ref())?,
        fixed_length: parse_u32_opt(ctx, "fixedLength", dt.fixed_length.as_ref())?,
        encoding: dt.encoding.clone(),
        values: Vec::new(),
    };
    for item in &dt.items {
        match item {
            DatatypeItem::SingleValue(v) => simple.values.push(single_value(v, ctx)?),
            DatatypeItem::ValueRange(r) => simple.values.push(value_range(r, ctx)?),
            // Nested record items are flattened by the caller.
            DatatypeItem::RecordItem(_) | DatatypeItem::SimpleDatatype(_) => {}
        }
    }
    Ok(simple)
}

fn single_value(v: &SingleValue, ctx: &mut IngestionContext) -> Result<DatatypeValue> {
    Ok(DatatypeValue {
        kind: ValueKind::Single,
        value: v.value.clone(),
        upper: None,
        name: ctx.resolve_text_opt(v.name.as_ref().map(|n| n.text_id.as_str()))?,
    })
}

fn value_range(r: &ValueRange, ctx: &mut IngestionContext) -> Result<DatatypeValue> {
    Ok(DatatypeValue {
        kind: ValueKind::Range,
        value: r.lower_value.clone(),
        upper: Some(r.upper_value.clone()),
        name: ctx.resolve_text_opt(r.name.as_ref().map(|n| n.text_id.as_str()))?,
    })
}

fn flatten_record_item(
    ri: &ModelRecordItem,
    parent: Option<u32>,
    out: &mut Vec<RecordItem>,
    next_index: &mut u32,
    ctx: &mut IngestionContext,
) -> Result<()> {
    let index = *next_index;
    *next_index += 1;
    ctx.within(format!("RecordItem[{}]", ri.subindex), |ctx| {
        let bit_offset = if ri.bit_offset.trim().is_empty() {
            0
        } else {
            parse_u32(ctx, "bitOffset", &ri.bit_offset)?
        };
        let simple = match &ri.simple_datatype {
            Some(s) => Some(ctx.within("SimpleDatatype", |ctx| simple_type(s, ctx))?),
            None => None,
        };
        out.push(RecordItem {
            index,
            parent,
            subindex: parse_u32(ctx, "subindex", &ri.subindex)?,
            bit_offset,
            simple,
            datatype_ref: ri.datatype_ref.as_ref().map(|r| r.datatype_id.clone()),
            name: ctx.resolve_text_opt(ri.name.as_ref().map(|n| n.text_id.as_str()))?,
            description: ctx
                .resolve_text_opt(ri.description.as_ref().map(|n| n.text_id.as_str()))?,
            access_restriction: ri.access_right_restriction.clone(),
        });
        if let Some(nested) = &ri.simple_datatype {
            for item in &nested.items {
                if let DatatypeItem::RecordItem(child) = item {
                    flatten_record_item(child, Some(index), out, next_index, ctx)?;
                }
            }
        }
        Ok(())
    })
}

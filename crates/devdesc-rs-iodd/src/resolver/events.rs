// crates/devdesc-rs-iodd/src/resolver/events.rs

//! Pass 6: `<EventCollection>`, in document order.

use super::utils::parse_u32;
use crate::model::device_function::{Event, EventCollection, EventItem};
use devdesc_rs::IngestionContext;
use devdesc_rs::document::{EventDef, EventEntry, StdEventRef};
use devdesc_rs::error::Result;

pub(super) fn resolve_events(
    collection: Option<&EventCollection>,
    ctx: &mut IngestionContext,
) -> Result<Vec<EventEntry>> {
    let Some(collection) = collection else {
        return Ok(Vec::new());
    };
    ctx.within("EventCollection", |ctx| {
        let mut events = Vec::with_capacity(collection.items.len());
        for item in &collection.items {
            let entry = match item {
                EventItem::Event(e) => ctx.within(format!("Event[{}]", e.code), |ctx| {
                    resolve_event(e, ctx).map(EventEntry::Full)
                })?,
                EventItem::StdEventRef(r) => {
                    ctx.within(format!("StdEventRef[{}]", r.code), |ctx| {
                        Ok(EventEntry::StdRef(StdEventRef {
                            code: r.code.clone(),
                            code_value: parse_u32(ctx, "code", &r.code)?,
                            attributes: Vec::new(),
                        }))
                    })?
                }
            };
            events.push(entry);
        }
        Ok(events)
    })
}

/// An event without a `Name` keeps its full definition; only the display
/// name is synthesized from the code.
fn resolve_event(e: &Event, ctx: &mut IngestionContext) -> Result<EventDef> {
    let code_value = parse_u32(ctx, "code", &e.code)?;
    let name = ctx.resolve_text_opt(e.name.as_ref().map(|n| n.text_id.as_str()))?;
    if name.is_none() {
        ctx.warn(format!(
            "event has no name, using '{}'",
            EventDef::synthesized_name(code_value)
        ));
    }
    Ok(EventDef {
        code: e.code.clone(),
        code_value,
        event_type: e.event_type.clone(),
        mode: e.mode.clone(),
        name_synthesized: name.is_none(),
        name,
        description: ctx.resolve_text_opt(e.description.as_ref().map(|n| n.text_id.as_str()))?,
    })
}

// crates/devdesc-rs-iodd/src/builder/events.rs

use crate::model::TextId;
use crate::model::device_function::{Event, EventCollection, EventItem, StdEventRef};
use devdesc_rs::SnapshotView;
use devdesc_rs::document::EntryVariant;

/// Events in their original document order. A synthesized name was never
/// part of the document and is not emitted.
pub(super) fn build_event_collection(view: &SnapshotView<'_>) -> EventCollection {
    let items = view
        .events()
        .iter()
        .map(|e| match e.variant {
            EntryVariant::StdRef => EventItem::StdEventRef(StdEventRef {
                code: e.code.clone(),
            }),
            EntryVariant::Full => EventItem::Event(Event {
                code: e.code.clone(),
                event_type: e.event_type.clone(),
                mode: e.mode.clone(),
                name: if e.name_synthesized {
                    None
                } else {
                    e.name_text.as_deref().map(TextId::new)
                },
                description: e.description_text.as_deref().map(TextId::new),
            }),
        })
        .collect();
    EventCollection { items }
}

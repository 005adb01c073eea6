// crates/devdesc-rs-iodd/src/builder/mod.rs

//! Rebuilds an IODD document from a stored [`DeviceSnapshot`].
//!
//! This module converts relational rows back into the internal `model`
//! structs and lets `quick-xml` serialize them. Each sub-builder owns one
//! structural section; a section whose rows are inconsistent is dropped and
//! reported instead of aborting the whole document.

mod datatypes;
mod events;
mod header;
mod identity;
mod menus;
mod process_data;
mod texts;
mod variables;

use crate::model::{DeviceFunction, IoDevice, ProfileBody};
use crate::resolver::header::blocks;
use devdesc_rs::entity::DeviceSnapshot;
use devdesc_rs::error::{DevDescError, ErrorContext};
use devdesc_rs::log::LogContext;
use devdesc_rs::{Reconstruction, Result, SectionLog, SnapshotView, dd_debug};
use serde::Serialize;
use std::fmt::Write;

/// Serializes a snapshot back into an IODD XML document.
///
/// # Errors
/// Only a serializer failure is fatal; missing rows degrade their section
/// and are listed in [`Reconstruction::incomplete_sections`].
pub fn build_iodd(snapshot: &DeviceSnapshot) -> Result<Reconstruction> {
    let view = SnapshotView::new(snapshot);
    let mut log = SectionLog::new(snapshot.key());

    // 1. Header blocks and identity
    let mut device = header::build_root(&view);
    let device_identity = identity::build_device_identity(&view);

    // 2. Device function
    let device_function = if has_block(&view, blocks::DEVICE_FUNCTION) {
        let datatype_collection = if has_block(&view, blocks::DATATYPE_COLLECTION) {
            log.section(
                blocks::DATATYPE_COLLECTION,
                datatypes::build_datatype_collection(&view, &log),
            )
        } else {
            None
        };
        Some(DeviceFunction {
            features: header::build_features(&view),
            datatype_collection,
            variable_collection: has_block(&view, blocks::VARIABLE_COLLECTION)
                .then(|| variables::build_variable_collection(&view, &mut log)),
            process_data_collection: has_block(&view, blocks::PROCESS_DATA_COLLECTION)
                .then(|| process_data::build_process_data_collection(&view, &mut log)),
            event_collection: has_block(&view, blocks::EVENT_COLLECTION)
                .then(|| events::build_event_collection(&view)),
            user_interface: has_block(&view, blocks::USER_INTERFACE)
                .then(|| menus::build_user_interface(&view, &mut log)),
        })
    } else {
        None
    };

    device.profile_body = Some(ProfileBody {
        device_identity: Some(device_identity),
        device_function,
    });
    device.comm_network_profile = header::build_comm_network_profile(&view);
    if has_block(&view, blocks::EXTERNAL_TEXT_COLLECTION) {
        device.external_text_collection = log.section(
            blocks::EXTERNAL_TEXT_COLLECTION,
            texts::build_text_collection(&view, &log),
        );
    }
    device.stamp = header::build_stamp(&view);

    // 3. Serialize
    let xml = serialize(&device, snapshot.key())?;
    let log_ctx = LogContext::device("iodd-builder", snapshot.key());
    dd_debug!(log_ctx, "Rebuilt {} bytes", xml.len());
    Ok(log.finish(xml.into_bytes()))
}

/// `true` when the original document contained the named block.
pub(crate) fn has_block(view: &SnapshotView<'_>, name: &str) -> bool {
    view.sections().iter().any(|s| s.name == name)
}

fn serialize(device: &IoDevice, device_key: &str) -> Result<String> {
    let fail = |detail: String| {
        DevDescError::reconstruction(
            ErrorContext::new(blocks::ROOT).with_device(device_key),
            blocks::ROOT,
            detail,
        )
    };
    let mut buffer = String::new();
    writeln!(&mut buffer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")
        .map_err(|e| fail(e.to_string()))?;

    let mut serializer = quick_xml::se::Serializer::new(&mut buffer);
    serializer.indent(' ', 2);
    device
        .serialize(serializer)
        .map_err(|e| fail(e.to_string()))?;
    Ok(buffer)
}

/// Formats an optional number column back into an attribute value.
pub(crate) fn num(value: Option<u32>) -> Option<String> {
    value.map(|v| v.to_string())
}

// crates/devdesc-rs-iodd/src/resolver/mod.rs

//! Turns the deserialized IODD model into a [`DeviceDocument`].
//!
//! Resolution runs in passes so that every lookup pool is complete before
//! anything references it: texts first, then datatypes, then the entities
//! that point into both.

use crate::model::IoDevice;
use devdesc_rs::document::{DeviceDocument, DocumentFormat, ParsedDocument};
use devdesc_rs::error::{ParseErrorKind, Result};
use devdesc_rs::log::LogContext;
use devdesc_rs::{IngestionContext, dd_debug};

// --- Sub-modules ---

mod datatypes;
mod events;
pub(crate) mod header;
mod menus;
mod process_data;
mod texts;
mod utils;
mod variables;

/// Resolves a whole document. The context is consumed; its pools end up in
/// the returned document.
pub(crate) fn resolve_document(
    device: &IoDevice,
    mut ctx: IngestionContext,
) -> Result<ParsedDocument> {
    let mut doc = DeviceDocument::new(DocumentFormat::Iodd);
    ctx.enter("IODevice");

    let body = device
        .profile_body
        .as_ref()
        .ok_or_else(|| ctx.parse_error(ParseErrorKind::MissingElement("ProfileBody")))?;
    let identity = body
        .device_identity
        .as_ref()
        .ok_or_else(|| ctx.parse_error(ParseErrorKind::MissingElement("DeviceIdentity")))?;
    let function = body.device_function.as_ref();

    doc.sections = header::collect_sections(device);

    // --- Pass 1: texts ---
    texts::resolve_texts(device.external_text_collection.as_ref(), &mut ctx)?;

    // --- Pass 2: datatypes ---
    ctx.within("ProfileBody/DeviceFunction", |ctx| {
        datatypes::resolve_datatype_collection(
            function.and_then(|f| f.datatype_collection.as_ref()),
            ctx,
        )
    })?;

    // --- Pass 3: identity and header properties ---
    header::resolve_header(device, &mut doc.properties);
    let revision = header::document_revision(device);
    ctx.within("ProfileBody", |ctx| {
        header::resolve_identity(identity, revision, &mut doc, ctx)
    })?;
    header::resolve_features(function.and_then(|f| f.features.as_ref()), &mut doc.properties);

    // --- Passes 4-7: device function ---
    ctx.within("ProfileBody/DeviceFunction", |ctx| {
        doc.parameters =
            variables::resolve_variables(function.and_then(|f| f.variable_collection.as_ref()), ctx)?;
        doc.process_data = process_data::resolve_process_data(
            function.and_then(|f| f.process_data_collection.as_ref()),
            ctx,
        )?;
        doc.events =
            events::resolve_events(function.and_then(|f| f.event_collection.as_ref()), ctx)?;
        let (menus, role_menus) = menus::resolve_user_interface(
            function.and_then(|f| f.user_interface.as_ref()),
            ctx,
        )?;
        doc.menus = menus;
        doc.role_menus = role_menus;
        Ok(())
    })?;

    header::resolve_trailer(device, &mut doc.properties);
    ctx.leave();

    let log_ctx = LogContext::device("iodd", ctx.source_file());
    dd_debug!(
        log_ctx,
        "resolved {} parameters, {} events, {} menus",
        doc.parameters.len(),
        doc.events.len(),
        doc.menus.len()
    );

    let (texts, datatypes, warnings) = ctx.finish();
    doc.texts = texts;
    doc.datatypes = datatypes;
    Ok(ParsedDocument {
        document: doc,
        warnings,
    })
}

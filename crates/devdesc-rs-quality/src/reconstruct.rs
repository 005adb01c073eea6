// crates/devdesc-rs-quality/src/reconstruct.rs

//! Format dispatch over the IODD and EDS crates.

use devdesc_rs::error::{DevDescError, DiffErrorKind, ErrorContext, Result};
use devdesc_rs::{DeviceSnapshot, DocNode, DocumentFormat, ParseOptions, ParsedDocument, Reconstruction};

pub fn parse_document(
    format: DocumentFormat,
    bytes: &[u8],
    source_file: &str,
    options: ParseOptions,
) -> Result<ParsedDocument> {
    match format {
        DocumentFormat::Iodd => devdesc_rs_iodd::parse_iodd(bytes, source_file, options),
        DocumentFormat::Eds => devdesc_rs_eds::parse_eds(bytes, source_file, options),
    }
}

/// Rebuilds the document a snapshot was mapped from.
pub fn reconstruct(snapshot: &DeviceSnapshot) -> Result<Reconstruction> {
    match snapshot.device.format {
        DocumentFormat::Iodd => devdesc_rs_iodd::build_iodd(snapshot),
        DocumentFormat::Eds => devdesc_rs_eds::build_eds(snapshot),
    }
}

pub fn read_document_tree(format: DocumentFormat, bytes: &[u8], source_file: &str) -> Result<DocNode> {
    match format {
        DocumentFormat::Iodd => devdesc_rs_iodd::read_tree(bytes, source_file),
        DocumentFormat::Eds => devdesc_rs_eds::read_tree(bytes, source_file),
    }
}

/// File name reported for errors in rebuilt documents.
pub const RECONSTRUCTION_FILE: &str = "<reconstruction>";

/// Reads a reconstruction back into a tree. Failing to do so makes the
/// pair incomparable, so the error is a `DiffError`.
pub fn read_reconstructed_tree(
    format: DocumentFormat,
    reconstruction: &Reconstruction,
    device_key: &str,
) -> Result<DocNode> {
    read_document_tree(format, &reconstruction.bytes, RECONSTRUCTION_FILE).map_err(|err| {
        let context = ErrorContext::new(err.context().path.clone())
            .with_device(device_key)
            .with_source(RECONSTRUCTION_FILE);
        DevDescError::diff(context, DiffErrorKind::Unreadable(err.to_string()))
    })
}

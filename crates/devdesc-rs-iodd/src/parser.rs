// crates/devdesc-rs-iodd/src/parser.rs

use crate::model::IoDevice;
use crate::resolver;
use devdesc_rs::document::ParsedDocument;
use devdesc_rs::error::{DevDescError, ErrorContext, ParseErrorKind, Result};
use devdesc_rs::{IngestionContext, ParseOptions};

/// Parses an IODD document from raw bytes.
///
/// The bytes must be UTF-8 (an optional byte-order mark is skipped).
///
/// # Errors
/// Returns a `ParseError` when the bytes are not UTF-8, the XML is not
/// well-formed, a mandatory element is missing or, with
/// `strict_references`, a text or datatype reference does not resolve.
pub fn parse_iodd(bytes: &[u8], source_file: &str, options: ParseOptions) -> Result<ParsedDocument> {
    let text = decode_utf8(bytes, source_file)?;
    parse_iodd_str(text, source_file, options)
}

/// Parses an IODD document from a string slice.
pub fn parse_iodd_str(
    xml_content: &str,
    source_file: &str,
    options: ParseOptions,
) -> Result<ParsedDocument> {
    // 1. Deserialize the raw XML string into our internal model.
    let device: IoDevice = quick_xml::de::from_str(xml_content).map_err(|e| {
        DevDescError::parse(
            ErrorContext::new("IODevice").with_source(source_file),
            ParseErrorKind::Xml(e.to_string()),
        )
    })?;

    // 2. Resolve it into the format-agnostic document.
    let ctx = IngestionContext::with_options(source_file, options);
    resolver::resolve_document(&device, ctx)
}

/// Validates the encoding and strips a UTF-8 byte-order mark.
pub(crate) fn decode_utf8<'a>(bytes: &'a [u8], source_file: &str) -> Result<&'a str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|_| {
        DevDescError::parse(
            ErrorContext::new("").with_source(source_file),
            ParseErrorKind::Encoding,
        )
    })
}

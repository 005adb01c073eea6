// crates/devdesc-rs-iodd/src/tree.rs

//! Reads any XML document into a generic [`DocNode`] tree for comparison.
//!
//! Unlike the typed model this keeps every element and attribute, including
//! the ones the resolver does not model. Comments, processing instructions
//! and the declaration are dropped; character data is trimmed.

use crate::parser::decode_utf8;
use devdesc_rs::error::{DevDescError, ErrorContext, ParseErrorKind, Result};
use devdesc_rs::tree::DocNode;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parses `bytes` into a tree rooted at the document element.
pub fn read_tree(bytes: &[u8], source_file: &str) -> Result<DocNode> {
    let text = decode_utf8(bytes, source_file)?;
    let mut reader = Reader::from_str(text);

    // Open elements plus the raw text gathered for each.
    let mut stack: Vec<(DocNode, String)> = Vec::new();
    let mut root: Option<DocNode> = None;

    loop {
        let path = || {
            stack
                .iter()
                .map(|(n, _)| n.name.as_str())
                .collect::<Vec<_>>()
                .join("/")
        };
        let event = reader
            .read_event()
            .map_err(|e| xml_error(source_file, &path(), e))?;
        match event {
            Event::Start(e) => {
                let node = start_node(&reader, &e, source_file, &path())?;
                stack.push((node, String::new()));
            }
            Event::Empty(e) => {
                let node = start_node(&reader, &e, source_file, &path())?;
                attach(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                if let Some((mut node, text)) = stack.pop() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        node.text = Some(trimmed.to_string());
                    }
                    attach(&mut stack, &mut root, node);
                }
            }
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|e| xml_error(source_file, &path(), e))?;
                if let Some((_, buf)) = stack.last_mut() {
                    buf.push_str(&decoded);
                }
            }
            Event::CData(e) => {
                let decoded = e
                    .decode()
                    .map_err(|e| xml_error(source_file, &path(), e))?;
                if let Some((_, buf)) = stack.last_mut() {
                    buf.push_str(&decoded);
                }
            }
            Event::GeneralRef(e) => {
                let resolved = match e
                    .resolve_char_ref()
                    .map_err(|e| xml_error(source_file, &path(), e))?
                {
                    Some(ch) => ch.to_string(),
                    None => {
                        let name = e
                            .decode()
                            .map_err(|e| xml_error(source_file, &path(), e))?;
                        quick_xml::escape::resolve_predefined_entity(&name)
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("&{};", name))
                    }
                };
                if let Some((_, buf)) = stack.last_mut() {
                    buf.push_str(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DevDescError::parse(
            ErrorContext::new("").with_source(source_file),
            ParseErrorKind::Xml("unexpected end of document".to_string()),
        ));
    }
    root.ok_or_else(|| {
        DevDescError::parse(
            ErrorContext::new("").with_source(source_file),
            ParseErrorKind::MissingElement("document element"),
        )
    })
}

fn start_node(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    source_file: &str,
    path: &str,
) -> Result<DocNode> {
    let mut node = DocNode::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(source_file, path, err))?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|err| xml_error(source_file, path, err))?;
        node.attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(node)
}

fn attach(stack: &mut [(DocNode, String)], root: &mut Option<DocNode>, node: DocNode) {
    match stack.last_mut() {
        Some((parent, _)) => parent.children.push(node),
        None => *root = Some(node),
    }
}

/// Wraps any quick-xml failure as a `ParseError` at `path`.
fn xml_error(source_file: &str, path: &str, err: impl std::fmt::Display) -> DevDescError {
    DevDescError::parse(
        ErrorContext::new(path).with_source(source_file),
        ParseErrorKind::Xml(err.to_string()),
    )
}

// crates/devdesc-rs-eds/src/parser.rs

//! Turns lexed EDS sections into a [`DeviceDocument`].
//!
//! `[Params]`, `[Assembly]` and `[Connection Manager]` entries with a
//! numbered key become entities; every other entry of every section is kept
//! as an ordered property so the builder can write it back unchanged.

use crate::layout::{self, *};
use crate::lexer::{self, RawEntry, RawSection, coerce_field, unquote};
use devdesc_rs::document::{
    Assembly, AssemblyMember, Attribute, Connection, ConnectionDirection, DatatypeDef,
    DatatypeValue, DeviceDocument, DocumentFormat, DocumentProperty, ParameterDef, ParameterEntry,
    ParsedDocument, ValueKind,
};
use devdesc_rs::error::{ParseErrorKind, Result};
use devdesc_rs::log::LogContext;
use devdesc_rs::text::TextRef;
use devdesc_rs::{IngestionContext, ParseOptions, dd_debug};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Parses an EDS file from raw bytes.
///
/// UTF-8 is tried first; anything else is read as ISO-8859-1, which is
/// what most EDS generators write.
///
/// # Errors
/// Returns a `ParseError` for malformed sections or entries, a missing
/// `[Device]` section or identity key, or a numeric field that does not
/// coerce once comments are stripped.
pub fn parse_eds(bytes: &[u8], source_file: &str, options: ParseOptions) -> Result<ParsedDocument> {
    let text = decode_text(bytes);
    parse_eds_str(&text, source_file, options)
}

/// Parses an EDS file from a string slice.
pub fn parse_eds_str(text: &str, source_file: &str, options: ParseOptions) -> Result<ParsedDocument> {
    let sections = lexer::lex(text, source_file)?;
    let ctx = IngestionContext::with_options(source_file, options);
    resolve_sections(&sections, ctx)
}

pub(crate) fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// An `EnumN` value map waiting for its owning parameter.
struct PendingEnum {
    datatype: DatatypeDef,
    texts: Vec<(String, String)>,
}

fn resolve_sections(sections: &[RawSection], mut ctx: IngestionContext) -> Result<ParsedDocument> {
    let mut doc = DeviceDocument::new(DocumentFormat::Eds);
    let mut texts: Vec<(String, String)> = Vec::new();
    let mut enums: Vec<PendingEnum> = Vec::new();
    ctx.enter("EDS");

    let mut seen = BTreeSet::new();
    for section in sections {
        if !seen.insert(section.name.as_str()) {
            let kind = ParseErrorKind::Malformed(format!("duplicate section [{}]", section.name));
            return Err(ctx.parse_error(kind));
        }
        doc.sections.push(section.name.clone());
    }

    // Identity first so every later error carries the device key.
    ctx.within(DEVICE, |ctx| resolve_identity(sections, &mut doc, ctx))?;

    for section in sections {
        ctx.within(section.name.as_str(), |ctx| {
            for entry in &section.entries {
                ctx.within(entry.key.as_str(), |ctx| {
                    resolve_entry(section, entry, &mut doc, &mut texts, &mut enums, ctx)
                })?;
            }
            Ok(())
        })?;
    }

    attach_enums(&mut doc, enums, &mut texts, &mut ctx)?;
    check_member_references(&doc, &mut ctx);
    for (id, value) in texts {
        ctx.texts_mut().insert(TEXT_LANGUAGE, id, value);
    }
    ctx.leave();

    let log_ctx = LogContext::device("eds", ctx.source_file());
    dd_debug!(
        log_ctx,
        "resolved {} sections, {} parameters, {} assemblies, {} connections",
        doc.sections.len(),
        doc.parameters.len(),
        doc.assemblies.len(),
        doc.connections.len()
    );

    let (pool, datatypes, warnings) = ctx.finish();
    doc.texts = pool;
    doc.datatypes = datatypes;
    Ok(ParsedDocument {
        document: doc,
        warnings,
    })
}

fn resolve_entry(
    section: &RawSection,
    entry: &RawEntry,
    doc: &mut DeviceDocument,
    texts: &mut Vec<(String, String)>,
    enums: &mut Vec<PendingEnum>,
    ctx: &mut IngestionContext,
) -> Result<()> {
    let key = entry.key.as_str();
    match section.name.as_str() {
        PARAMS => {
            if let Some(n) = numbered(key, PARAM_PREFIX) {
                let param = resolve_param(n, entry, texts, ctx)?;
                doc.parameters.push(ParameterEntry::Full(param));
                return Ok(());
            }
            if numbered(key, ENUM_PREFIX).is_some() {
                enums.push(resolve_enum(entry, ctx)?);
                return Ok(());
            }
        }
        ASSEMBLY => {
            if numbered(key, ASSEM_PREFIX).is_some() {
                doc.assemblies.push(resolve_assembly(entry, texts, ctx)?);
                return Ok(());
            }
        }
        CONNECTION_MANAGER => {
            if numbered(key, CONNECTION_PREFIX).is_some() {
                doc.connections.push(resolve_connection(entry, texts, ctx)?);
                return Ok(());
            }
        }
        _ => {}
    }
    doc.properties
        .push(DocumentProperty::new(&section.name, key, entry.value()));
    Ok(())
}

// --- Field helpers ---

fn numeric(ctx: &IngestionContext, field: String, raw: &str) -> Result<Option<i64>> {
    coerce_field(raw).map_err(|_| {
        ctx.parse_error(ParseErrorKind::NumericCoercion {
            field,
            value: raw.to_string(),
        })
    })
}

fn numeric_u32(ctx: &IngestionContext, field: String, raw: &str) -> Result<Option<u32>> {
    match numeric(ctx, field.clone(), raw)? {
        None => Ok(None),
        Some(value) => u32::try_from(value).map(Some).map_err(|_| {
            ctx.parse_error(ParseErrorKind::NumericCoercion {
                field,
                value: raw.to_string(),
            })
        }),
    }
}

/// A size field may also name a parameter (`Param3`) instead of a number.
fn size_field(ctx: &IngestionContext, field: String, raw: &str) -> Result<Option<u32>> {
    if raw.starts_with(|c: char| c.is_ascii_digit()) {
        numeric_u32(ctx, field, raw)
    } else {
        Ok(None)
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Records a display string in the pending text list. A quoted field is
/// unquoted; an empty field has no text.
fn text_field(
    owner: &str,
    field: &str,
    raw: Option<&str>,
    texts: &mut Vec<(String, String)>,
) -> Option<TextRef> {
    let raw = raw.filter(|s| !s.is_empty())?;
    let value = unquote(raw).unwrap_or(raw);
    let id = layout::text_id(owner, field);
    texts.push((id.clone(), value.to_string()));
    Some(TextRef::new(id))
}

// --- Identity ---

fn resolve_identity(
    sections: &[RawSection],
    doc: &mut DeviceDocument,
    ctx: &mut IngestionContext,
) -> Result<()> {
    let device = sections
        .iter()
        .find(|s| s.name == DEVICE)
        .ok_or_else(|| ctx.parse_error(ParseErrorKind::MissingElement("[Device]")))?;
    let lookup = |section: &RawSection, key: &str| {
        section
            .entries
            .iter()
            .find(|e| e.key == key)
            .map(RawEntry::value)
    };

    let vendor = lookup(device, "VendCode")
        .ok_or_else(|| ctx.parse_error(ParseErrorKind::MissingAttribute("VendCode")))?;
    let product = lookup(device, "ProdCode")
        .ok_or_else(|| ctx.parse_error(ParseErrorKind::MissingAttribute("ProdCode")))?;
    let required = |field: &str, raw: &str| -> Result<u32> {
        numeric_u32(ctx, field.to_string(), raw)?.ok_or_else(|| {
            ctx.parse_error(ParseErrorKind::NumericCoercion {
                field: field.to_string(),
                value: raw.to_string(),
            })
        })
    };
    doc.identity.vendor_id = required("VendCode", &vendor)?;
    doc.identity.device_id = required("ProdCode", &product)?;

    let text = |key: &str| {
        lookup(device, key).map(|v| unquote(&v).map(str::to_string).unwrap_or(v))
    };
    doc.identity.vendor_name = text("VendName").unwrap_or_default();
    doc.identity.product_name = text("ProdName").unwrap_or_default();

    let major = match lookup(device, "MajRev") {
        Some(raw) => numeric_u32(ctx, "MajRev".into(), &raw)?,
        None => None,
    };
    let minor = match lookup(device, "MinRev") {
        Some(raw) => numeric_u32(ctx, "MinRev".into(), &raw)?,
        None => None,
    };
    let file_revision = sections
        .iter()
        .find(|s| s.name == FILE)
        .and_then(|s| lookup(s, "Revision"));
    doc.identity.revision = match (major, file_revision) {
        (Some(major), _) => format!("{}.{}", major, minor.unwrap_or(0)),
        (None, Some(revision)) => revision,
        (None, None) => "0".to_string(),
    };

    ctx.set_device_id(doc.key().as_str());
    Ok(())
}

// --- Params ---

fn resolve_param(
    index: u32,
    entry: &RawEntry,
    texts: &mut Vec<(String, String)>,
    ctx: &mut IngestionContext,
) -> Result<ParameterDef> {
    if entry.fields.len() < PARAM_MIN_FIELDS {
        return Err(ctx.parse_error(ParseErrorKind::Malformed(format!(
            "{} has {} fields, at least {} are required",
            entry.key,
            entry.fields.len(),
            PARAM_MIN_FIELDS
        ))));
    }

    let mut descriptor = None;
    for (position, name) in PARAM_NUMERIC_FIELDS {
        let raw = entry.field(position).unwrap_or("");
        let value = numeric(ctx, format!("{}.{}", entry.key, name), raw)?;
        if name == "descriptor" {
            descriptor = value;
        }
    }

    let mut attributes: Vec<Attribute> = PARAM_RAW_FIELDS
        .iter()
        .filter_map(|&(position, name)| entry.field(position).map(|v| Attribute::new(name, v)))
        .collect();
    attributes.extend(
        entry
            .fields
            .iter()
            .enumerate()
            .skip(PARAM_NAMED_FIELDS)
            .map(|(position, v)| Attribute::new(param_extra_field(position), v.as_str())),
    );

    let key = entry.key.as_str();
    Ok(ParameterDef {
        id: key.to_string(),
        index: Some(index),
        subindex: None,
        access: descriptor.map(|d| {
            let access = if d & DESCRIPTOR_READ_ONLY != 0 { "ro" } else { "rw" };
            access.to_string()
        }),
        datatype: None,
        default_value: non_empty(entry.field(PARAM_DEFAULT)),
        min: non_empty(entry.field(PARAM_MIN)),
        max: non_empty(entry.field(PARAM_MAX)),
        name: text_field(key, "name", entry.field(PARAM_NAME), texts),
        description: text_field(key, "help", entry.field(PARAM_HELP), texts),
        unit: text_field(key, "units", entry.field(PARAM_UNITS), texts),
        attributes,
        overrides: Vec::new(),
    })
}

fn resolve_enum(entry: &RawEntry, ctx: &mut IngestionContext) -> Result<PendingEnum> {
    let key = entry.key.as_str();
    let fields: &[String] = if entry.fields.iter().all(String::is_empty) {
        &[]
    } else {
        &entry.fields
    };
    if fields.len() % 2 != 0 {
        return Err(ctx.parse_error(ParseErrorKind::Malformed(format!(
            "{} must be a list of value/name pairs",
            key
        ))));
    }

    let mut texts = Vec::new();
    let mut values = Vec::new();
    for (k, pair) in fields.chunks(2).enumerate() {
        numeric(ctx, format!("{}.value", key), &pair[0])?;
        values.push(DatatypeValue {
            kind: ValueKind::Single,
            value: pair[0].clone(),
            upper: None,
            name: text_field(key, &k.to_string(), Some(pair[1].as_str()), &mut texts),
        });
    }

    let owner = numbered(key, ENUM_PREFIX).map(|n| format!("{}{}", PARAM_PREFIX, n));
    Ok(PendingEnum {
        datatype: DatatypeDef {
            id: key.to_string(),
            kind: ENUM_KIND.to_string(),
            owner,
            values,
            ..Default::default()
        },
        texts,
    })
}

/// Binds every `EnumN` to `ParamN` and registers the value maps in parameter
/// order, so the datatype order does not depend on where the enumerations
/// sat in the file.
fn attach_enums(
    doc: &mut DeviceDocument,
    mut enums: Vec<PendingEnum>,
    texts: &mut Vec<(String, String)>,
    ctx: &mut IngestionContext,
) -> Result<()> {
    let position = |owner: Option<&str>| {
        doc.parameters
            .iter()
            .position(|p| Some(p.id()) == owner)
            .unwrap_or(usize::MAX)
    };
    // Stable: orphans keep their file order at the end.
    enums.sort_by_key(|e| position(e.datatype.owner.as_deref()));

    ctx.within(PARAMS, |ctx| {
        for pending in enums {
            let owner = pending.datatype.owner.as_deref().unwrap_or_default();
            match doc.parameters.iter_mut().find(|p| p.id() == owner) {
                Some(ParameterEntry::Full(param)) => {
                    param.datatype = Some(pending.datatype.id.clone());
                }
                _ => ctx.warn(format!(
                    "{} has no matching {}",
                    pending.datatype.id, owner
                )),
            }
            texts.extend(pending.texts);
            ctx.register_datatype(pending.datatype)?;
        }
        Ok(())
    })
}

// --- Assembly ---

fn resolve_assembly(
    entry: &RawEntry,
    texts: &mut Vec<(String, String)>,
    ctx: &mut IngestionContext,
) -> Result<Assembly> {
    let key = entry.key.as_str();
    let members_raw = entry.fields.get(ASSEM_MEMBERS..).unwrap_or(&[]);
    if members_raw.len() % 2 != 0 {
        return Err(ctx.parse_error(ParseErrorKind::Malformed(format!(
            "{} members must be size/reference pairs",
            key
        ))));
    }

    let mut members = Vec::new();
    let mut offset: u32 = 0;
    for (k, pair) in members_raw.chunks(2).enumerate() {
        let bit_size = numeric_u32(ctx, format!("{}.member{}.size", key, k + 1), &pair[0])?;
        members.push(AssemblyMember {
            bit_size,
            bit_offset: offset,
            reference: pair[1].clone(),
        });
        offset = offset.saturating_add(bit_size.unwrap_or(0));
    }

    Ok(Assembly {
        id: key.to_string(),
        name: text_field(key, "name", entry.field(ASSEM_NAME), texts),
        path: non_empty(entry.field(ASSEM_PATH)),
        size: non_empty(entry.field(ASSEM_SIZE)),
        descriptor: non_empty(entry.field(ASSEM_DESCRIPTOR)),
        reserved: entry
            .fields
            .iter()
            .skip(ASSEM_RESERVED)
            .take(ASSEM_MEMBERS - ASSEM_RESERVED)
            .cloned()
            .collect(),
        members,
    })
}

/// Member references to parameters the file does not define are kept, but
/// reported.
fn check_member_references(doc: &DeviceDocument, ctx: &mut IngestionContext) {
    let params: BTreeSet<&str> = doc.parameters.iter().map(|p| p.id()).collect();
    let assemblies: BTreeSet<&str> = doc.assemblies.iter().map(|a| a.id.as_str()).collect();
    let mut dangling = Vec::new();
    for assembly in &doc.assemblies {
        for member in &assembly.members {
            let r = member.reference.as_str();
            let known = if numbered(r, PARAM_PREFIX).is_some() {
                params.contains(r)
            } else if numbered(r, ASSEM_PREFIX).is_some() {
                assemblies.contains(r)
            } else {
                true
            };
            if !known {
                dangling.push(format!("{} references undefined {}", assembly.id, r));
            }
        }
    }
    if dangling.is_empty() {
        return;
    }
    ctx.enter(ASSEMBLY);
    for message in dangling {
        ctx.warn(message);
    }
    ctx.leave();
}

// --- Connection Manager ---

fn resolve_connection(
    entry: &RawEntry,
    texts: &mut Vec<(String, String)>,
    ctx: &mut IngestionContext,
) -> Result<Connection> {
    let key = entry.key.as_str();
    let ot_size = size_field(
        ctx,
        format!("{}.ot_size", key),
        entry.field(CONN_OT_SIZE).unwrap_or(""),
    )?;
    let to_size = size_field(
        ctx,
        format!("{}.to_size", key),
        entry.field(CONN_TO_SIZE).unwrap_or(""),
    )?;

    Ok(Connection {
        id: key.to_string(),
        name: text_field(key, "name", entry.field(CONN_NAME), texts),
        help: text_field(key, "help", entry.field(CONN_HELP), texts),
        direction: ConnectionDirection::from_sizes(ot_size, to_size),
        ot_size,
        to_size,
        rpi: non_empty(entry.field(CONN_OT_RPI)),
        path: non_empty(entry.field(CONN_PATH)),
        fields: entry.fields.clone(),
    })
}

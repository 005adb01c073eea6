// crates/devdesc-rs-iodd/src/resolver/utils.rs

//! Utility functions for the resolver.

use devdesc_rs::IngestionContext;
use devdesc_rs::document::{Attribute, DocumentProperty};
use devdesc_rs::error::{ParseErrorKind, Result};

/// Parses a decimal or `0x`-prefixed hexadecimal attribute.
pub(super) fn parse_u32(ctx: &IngestionContext, field: &str, value: &str) -> Result<u32> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse::<u32>(),
    };
    parsed.map_err(|_| {
        ctx.parse_error(ParseErrorKind::NumericCoercion {
            field: field.to_string(),
            value: value.to_string(),
        })
    })
}

pub(super) fn parse_u32_opt(
    ctx: &IngestionContext,
    field: &str,
    value: Option<&String>,
) -> Result<Option<u32>> {
    value.map(|v| parse_u32(ctx, field, v)).transpose()
}

/// Appends one property per present attribute, in the given order.
pub(super) fn push_properties(
    props: &mut Vec<DocumentProperty>,
    section: &str,
    fields: &[(&str, Option<&String>)],
) {
    for (key, value) in fields {
        if let Some(value) = value {
            props.push(DocumentProperty::new(section, key, value.as_str()));
        }
    }
}

/// Collects present attributes as verbatim name/value pairs.
pub(super) fn collect_attributes(fields: &[(&str, Option<&String>)]) -> Vec<Attribute> {
    fields
        .iter()
        .filter_map(|(name, value)| value.map(|v| Attribute::new(*name, v.as_str())))
        .collect()
}

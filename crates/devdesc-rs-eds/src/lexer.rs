// crates/devdesc-rs-eds/src/lexer.rs

//! Splits EDS text into sections, entries and fields.
//!
//! This is the comment-stripping pre-pass every numeric field goes through
//! before it is coerced. The rules:
//!
//! - `$` starts a comment that runs to the end of the line.
//! - `"..."` protects `$`, `;`, `,` and `=`; a string may not span lines.
//! - An entry is `key = field, field, ...;` and may span several lines.
//! - A line whose first non-blank character is `[` opens a section.

use devdesc_rs::error::{DevDescError, ErrorContext, ParseErrorKind, Result};
use std::fmt;

/// One `key = fields;` assignment with its fields trimmed but otherwise
/// verbatim (quotes are kept).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub key: String,
    pub fields: Vec<String>,
    /// Line the entry started on, 1-based.
    pub line: usize,
}

impl RawEntry {
    /// The fields joined back with `,`, the canonical value form.
    pub fn value(&self) -> String {
        self.fields.join(",")
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub name: String,
    pub line: usize,
    pub entries: Vec<RawEntry>,
}

/// Tokenizes a whole document.
///
/// # Errors
/// `ParseError::Malformed` for an unterminated section header, string or
/// entry, for content outside any section and for an entry without `=`.
pub fn lex(text: &str, source_file: &str) -> Result<Vec<RawSection>> {
    let malformed = |line: usize, path: &str, detail: String| {
        DevDescError::parse(
            ErrorContext::new(path).with_source(source_file),
            ParseErrorKind::Malformed(format!("line {}: {}", line, detail)),
        )
    };
    let section_path = |sections: &[RawSection]| match sections.last() {
        Some(s) => format!("EDS/{}", s.name),
        None => "EDS".to_string(),
    };

    let mut sections: Vec<RawSection> = Vec::new();
    let mut buf = String::new();
    let mut entry_line = 1;
    let mut line = 1;
    let mut in_quote = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            if in_quote {
                return Err(malformed(
                    line,
                    &section_path(&sections),
                    "unterminated string".into(),
                ));
            }
            line += 1;
            buf.push(' ');
            continue;
        }
        if in_quote {
            if c == '"' {
                in_quote = false;
            }
            buf.push(c);
            continue;
        }
        match c {
            '\r' => {}
            '"' => {
                if buf.trim().is_empty() {
                    entry_line = line;
                }
                in_quote = true;
                buf.push(c);
            }
            '$' => {
                // Comment: skip to (not past) the end of the line.
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
            }
            '[' if buf.trim().is_empty() => {
                let mut name = String::new();
                let mut closed = false;
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break;
                    }
                    chars.next();
                    if n == ']' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(malformed(
                        line,
                        &section_path(&sections),
                        "unterminated section header".into(),
                    ));
                }
                buf.clear();
                sections.push(RawSection {
                    name: name.trim().to_string(),
                    line,
                    entries: Vec::new(),
                });
            }
            ';' => {
                let path = section_path(&sections);
                let Some(section) = sections.last_mut() else {
                    return Err(malformed(entry_line, &path, "entry outside of any section".into()));
                };
                let entry = split_entry(&buf, entry_line)
                    .ok_or_else(|| malformed(entry_line, &path, format!("entry without '=': {}", buf.trim())))?;
                section.entries.push(entry);
                buf.clear();
            }
            _ => {
                if buf.trim().is_empty() && !c.is_whitespace() {
                    entry_line = line;
                }
                buf.push(c);
            }
        }
    }

    if in_quote {
        return Err(malformed(line, &section_path(&sections), "unterminated string".into()));
    }
    if !buf.trim().is_empty() {
        return Err(malformed(
            entry_line,
            &section_path(&sections),
            "entry is not terminated by ';'".into(),
        ));
    }
    Ok(sections)
}

/// Splits `key = value` at the first unquoted `=`.
fn split_entry(text: &str, line: usize) -> Option<RawEntry> {
    let eq = unquoted_positions(text, '=').next()?;
    let key = text[..eq].trim();
    if key.is_empty() {
        return None;
    }
    Some(RawEntry {
        key: key.to_string(),
        fields: split_fields(&text[eq + 1..]),
        line,
    })
}

/// Byte positions of `needle` outside double quotes.
fn unquoted_positions(text: &str, needle: char) -> impl Iterator<Item = usize> + '_ {
    let mut in_quote = false;
    text.char_indices().filter_map(move |(i, c)| {
        if c == '"' {
            in_quote = !in_quote;
            None
        } else if c == needle && !in_quote {
            Some(i)
        } else {
            None
        }
    })
}

/// Splits an entry value at unquoted commas. Every field is trimmed; empty
/// fields are kept so positions stay meaningful.
pub fn split_fields(value: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut start = 0;
    for pos in unquoted_positions(value, ',') {
        fields.push(value[start..pos].trim().to_string());
        start = pos + 1;
    }
    fields.push(value[start..].trim().to_string());
    fields
}

/// Removes the surrounding quotes of a string field. Returns `None` for an
/// unquoted field.
pub fn unquote(field: &str) -> Option<&str> {
    field
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
}

/// Why a field could not be read as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceError {
    /// Nothing left after stripping comments and terminators.
    Empty,
    NotNumeric,
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoerceError::Empty => f.write_str("empty field"),
            CoerceError::NotNumeric => f.write_str("not a number"),
        }
    }
}

/// Reads an integer out of a raw field.
///
/// A trailing `$` comment and anything after an unquoted `;` are dropped
/// first, so `"6;  $ Maximum number"` reads as `6`. Decimal and `0x`
/// hexadecimal forms are accepted.
pub fn coerce_int(raw: &str) -> std::result::Result<i64, CoerceError> {
    let without_comment = match unquoted_positions(raw, '$').next() {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    let without_terminator = match unquoted_positions(without_comment, ';').next() {
        Some(pos) => &without_comment[..pos],
        None => without_comment,
    };
    let s = without_terminator.trim();
    if s.is_empty() {
        return Err(CoerceError::Empty);
    }

    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .map_err(|_| CoerceError::NotNumeric)?;
    Ok(if negative { -value } else { value })
}

/// Like [`coerce_int`], but an empty field is `None` rather than an error.
pub fn coerce_field(raw: &str) -> std::result::Result<Option<i64>, CoerceError> {
    match coerce_int(raw) {
        Ok(value) => Ok(Some(value)),
        Err(CoerceError::Empty) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_int_strips_comment_and_terminator() {
        assert_eq!(coerce_int("6;  $ Maximum number"), Ok(6));
        assert_eq!(coerce_int("  0x1F "), Ok(31));
        assert_eq!(coerce_int("-40"), Ok(-40));
        assert_eq!(coerce_int("$ only a comment"), Err(CoerceError::Empty));
        assert_eq!(coerce_int("abc"), Err(CoerceError::NotNumeric));
        assert_eq!(coerce_field(""), Ok(None));
        assert_eq!(coerce_field("12"), Ok(Some(12)));
    }

    #[test]
    fn test_multi_line_entry_with_comments() {
        let text = "$ header comment\n[Params]\n  Param1 =\n    0,     $ reserved\n    \"a;b,$c\", $ name\n    7;\n";
        let sections = lex(text, "t.eds").unwrap();
        assert_eq!(sections.len(), 1);
        let entry = &sections[0].entries[0];
        assert_eq!(entry.key, "Param1");
        assert_eq!(entry.fields, vec!["0", "\"a;b,$c\"", "7"]);
        assert_eq!(entry.line, 3);
        assert_eq!(unquote(&entry.fields[1]), Some("a;b,$c"));
    }

    #[test]
    fn test_empty_fields_are_kept() {
        assert_eq!(split_fields(" ,,1, "), vec!["", "", "1", ""]);
    }

    #[test]
    fn test_unterminated_entry_is_malformed() {
        let err = lex("[Device]\nVendCode = 1\n", "t.eds").unwrap_err();
        match err {
            DevDescError::Parse {
                kind: ParseErrorKind::Malformed(msg),
                context,
            } => {
                assert!(msg.contains("not terminated"));
                assert_eq!(context.path, "EDS/Device");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_entry_outside_section_is_malformed() {
        assert!(lex("VendCode = 1;\n[Device]\n", "t.eds").is_err());
    }

    #[test]
    fn test_unterminated_header_is_malformed() {
        assert!(lex("[Device\nVendCode = 1;\n", "t.eds").is_err());
    }
}

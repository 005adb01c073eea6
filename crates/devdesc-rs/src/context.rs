// crates/devdesc-rs/src/context.rs

//! Per-ingestion state threaded through every extraction step.
//!
//! A context is created for one document, owns the lookup pools the parser
//! builds up (texts, datatypes) and the current document path used to
//! annotate errors. It is consumed by [`IngestionContext::finish`]; nothing
//! is shared between ingestions.

use crate::document::DatatypeDef;
use crate::error::{DevDescError, ErrorContext, ParseErrorKind, Result};
use crate::log::LogContext;
use crate::text::{TextPool, TextRef};
use crate::dd_warn;
use std::collections::BTreeMap;

/// Knobs shared by both parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Unresolved text or datatype references are errors instead of warnings.
    pub strict_references: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_references: true,
        }
    }
}

#[derive(Debug)]
pub struct IngestionContext {
    source_file: String,
    device_id: Option<String>,
    strict_references: bool,
    texts: TextPool,
    datatypes: Vec<DatatypeDef>,
    datatype_index: BTreeMap<String, usize>,
    path: Vec<String>,
    warnings: Vec<String>,
}

impl IngestionContext {
    pub fn new(source_file: impl Into<String>, strict_references: bool) -> Self {
        Self {
            source_file: source_file.into(),
            device_id: None,
            strict_references,
            texts: TextPool::new(),
            datatypes: Vec::new(),
            datatype_index: BTreeMap::new(),
            path: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_options(source_file: impl Into<String>, options: ParseOptions) -> Self {
        Self::new(source_file, options.strict_references)
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn set_device_id(&mut self, device_id: impl Into<String>) {
        self.device_id = Some(device_id.into());
    }

    pub fn strict_references(&self) -> bool {
        self.strict_references
    }

    // --- Path tracking ---

    pub fn enter(&mut self, segment: impl Into<String>) {
        self.path.push(segment.into());
    }

    pub fn leave(&mut self) {
        self.path.pop();
    }

    /// Runs `f` with `segment` pushed on the path; the segment is popped
    /// whether `f` succeeds or not.
    pub fn within<T>(
        &mut self,
        segment: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.enter(segment);
        let result = f(self);
        self.leave();
        result
    }

    pub fn path(&self) -> String {
        self.path.join("/")
    }

    pub fn error_context(&self) -> ErrorContext {
        ErrorContext {
            device_id: self.device_id.clone(),
            source_file: Some(self.source_file.clone()),
            path: self.path(),
        }
    }

    pub fn parse_error(&self, kind: ParseErrorKind) -> DevDescError {
        DevDescError::parse(self.error_context(), kind)
    }

    /// Records a non-fatal problem, also logged as a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = format!("{}: {}", self.path(), message.into());
        let log_ctx = LogContext {
            component: "ingest",
            device: self.device_id.as_deref(),
        };
        dd_warn!(log_ctx, "{} ({})", message, self.source_file);
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    // --- Texts ---

    pub fn texts(&self) -> &TextPool {
        &self.texts
    }

    pub fn texts_mut(&mut self) -> &mut TextPool {
        &mut self.texts
    }

    /// Checks that `id` exists in the document's own text pool.
    ///
    /// In strict mode a dangling reference is a `ParseError`; otherwise it is
    /// kept and recorded as a warning.
    pub fn resolve_text(&mut self, id: &str) -> Result<TextRef> {
        if !self.texts.contains(id) {
            if self.strict_references {
                return Err(self.parse_error(ParseErrorKind::UnresolvedText(id.to_string())));
            }
            self.warn(format!("unresolved text reference '{}'", id));
        }
        Ok(TextRef::new(id))
    }

    pub fn resolve_text_opt(&mut self, id: Option<&str>) -> Result<Option<TextRef>> {
        id.map(|id| self.resolve_text(id)).transpose()
    }

    // --- Datatypes ---

    /// Adds a datatype to the pool. A repeated id is a parse error.
    pub fn register_datatype(&mut self, datatype: DatatypeDef) -> Result<()> {
        if self.datatype_index.contains_key(&datatype.id) {
            return Err(self.parse_error(ParseErrorKind::Malformed(format!(
                "duplicate datatype id '{}'",
                datatype.id
            ))));
        }
        self.datatype_index
            .insert(datatype.id.clone(), self.datatypes.len());
        self.datatypes.push(datatype);
        Ok(())
    }

    pub fn datatype(&self, id: &str) -> Option<&DatatypeDef> {
        self.datatype_index.get(id).map(|&pos| &self.datatypes[pos])
    }

    /// Checks that `id` names a datatype of this document.
    pub fn resolve_datatype(&mut self, id: &str) -> Result<String> {
        if !self.datatype_index.contains_key(id) {
            if self.strict_references {
                return Err(
                    self.parse_error(ParseErrorKind::UnresolvedDatatype(id.to_string()))
                );
            }
            self.warn(format!("unresolved datatype reference '{}'", id));
        }
        Ok(id.to_string())
    }

    /// Hands the accumulated pools to the caller.
    pub fn finish(self) -> (TextPool, Vec<DatatypeDef>, Vec<String>) {
        (self.texts, self.datatypes, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DevDescError;

    #[test]
    fn test_strict_text_reference_fails_with_path() {
        let mut ctx = IngestionContext::new("dev.xml", true);
        ctx.set_device_id("iodd:1:2:V1");
        ctx.enter("IODevice");
        ctx.enter("VariableCollection");
        let err = ctx.resolve_text("TN_Missing").unwrap_err();
        match err {
            DevDescError::Parse { context, kind } => {
                assert_eq!(context.path, "IODevice/VariableCollection");
                assert_eq!(context.source_file.as_deref(), Some("dev.xml"));
                assert_eq!(context.device_id.as_deref(), Some("iodd:1:2:V1"));
                assert_eq!(kind, ParseErrorKind::UnresolvedText("TN_Missing".into()));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_lenient_text_reference_warns() {
        let mut ctx = IngestionContext::new("dev.xml", false);
        let text = ctx.resolve_text("TN_Missing").unwrap();
        assert_eq!(text.as_str(), "TN_Missing");
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn test_within_pops_segment_on_error() {
        let mut ctx = IngestionContext::new("dev.xml", true);
        let result: Result<()> = ctx.within("Variable", |c| {
            Err(c.parse_error(ParseErrorKind::MissingAttribute("id")))
        });
        assert!(result.is_err());
        assert_eq!(ctx.path(), "");
    }

    #[test]
    fn test_duplicate_datatype_rejected() {
        let mut ctx = IngestionContext::new("dev.xml", true);
        let dt = DatatypeDef {
            id: "DT_1".into(),
            kind: "UIntegerT".into(),
            ..Default::default()
        };
        ctx.register_datatype(dt.clone()).unwrap();
        assert!(ctx.register_datatype(dt).is_err());
        assert_eq!(ctx.resolve_datatype("DT_1").unwrap(), "DT_1");
        assert!(ctx.resolve_datatype("DT_2").is_err());
    }
}

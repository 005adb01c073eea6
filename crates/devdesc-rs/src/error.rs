// crates/devdesc-rs/src/error.rs

//! The error taxonomy shared by every stage of the pipeline.
//!
//! Every error carries an [`ErrorContext`] naming the device, the source file
//! and the document path at which it occurred, so that the excluded
//! presentation layer can report per-file failures without guessing.

use std::fmt;

/// Where an error happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Device key (or best known identity) the error belongs to.
    pub device_id: Option<String>,
    /// Name of the file (or archive entry) being processed.
    pub source_file: Option<String>,
    /// Document path, e.g. `IODevice/ProfileBody/DeviceFunction/VariableCollection`.
    pub path: String,
}

impl ErrorContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_source(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "device={}, file={}, path={}",
            self.device_id.as_deref().unwrap_or("-"),
            self.source_file.as_deref().unwrap_or("-"),
            if self.path.is_empty() { "/" } else { &self.path }
        )
    }
}

/// Reasons an archive (or a single input) is rejected before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveErrorKind {
    /// The container could not be read.
    Corrupt(String),
    /// A size bound was exceeded (input, entry, total or ratio).
    Oversized { limit: u64, actual: u64 },
    /// The container holds more entries than allowed.
    TooManyEntries { limit: usize, actual: usize },
    /// The ingestion time budget ran out.
    TimeBudgetExceeded { budget_ms: u64 },
    /// A container was nested deeper than one level.
    UnsupportedNesting,
    /// The input is neither a known container nor a known document.
    UnsupportedFormat(String),
}

/// Reasons a document fails to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The XML layer rejected the document.
    Xml(String),
    /// The document bytes are not valid UTF-8 (or a supported encoding).
    Encoding,
    /// A bracketed EDS section or an XML tag is malformed.
    Malformed(String),
    /// A mandatory element is absent.
    MissingElement(&'static str),
    /// A mandatory attribute or key is absent.
    MissingAttribute(&'static str),
    /// A `textId` does not resolve in the document's own text pool.
    UnresolvedText(String),
    /// A `datatypeId` does not resolve in the document's datatype pool.
    UnresolvedDatatype(String),
    /// A numeric field still failed to coerce after comment stripping.
    NumericCoercion { field: String, value: String },
}

/// Reasons a snapshot cannot be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceErrorKind {
    /// A uniqueness or reference invariant was violated.
    Constraint(String),
    /// Row counts after insert did not match the snapshot.
    PartialWrite { table: &'static str, expected: usize, actual: usize },
    /// Another writer holds this device; retry later.
    Busy,
    /// The storage backend failed.
    Backend(String),
}

/// Reasons the diff analyzer refuses to compare two trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffErrorKind {
    /// Original and reconstruction are not the same document format.
    FormatMismatch { original: String, reconstructed: String },
    /// The reconstruction could not be read back into a tree.
    Unreadable(String),
}

/// Top level error type for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevDescError {
    Archive {
        context: ErrorContext,
        kind: ArchiveErrorKind,
    },
    Parse {
        context: ErrorContext,
        kind: ParseErrorKind,
    },
    Persistence {
        context: ErrorContext,
        kind: PersistenceErrorKind,
    },
    /// Required relational data is missing for a mandatory section.
    Reconstruction {
        context: ErrorContext,
        section: String,
        detail: String,
    },
    Diff {
        context: ErrorContext,
        kind: DiffErrorKind,
    },
}

/// Coarse classification of a [`DevDescError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCategory {
    Archive,
    Parse,
    Persistence,
    Reconstruction,
    Diff,
}

impl DevDescError {
    pub fn archive(context: ErrorContext, kind: ArchiveErrorKind) -> Self {
        DevDescError::Archive { context, kind }
    }

    pub fn parse(context: ErrorContext, kind: ParseErrorKind) -> Self {
        DevDescError::Parse { context, kind }
    }

    pub fn persistence(context: ErrorContext, kind: PersistenceErrorKind) -> Self {
        DevDescError::Persistence { context, kind }
    }

    pub fn reconstruction(
        context: ErrorContext,
        section: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        DevDescError::Reconstruction {
            context,
            section: section.into(),
            detail: detail.into(),
        }
    }

    pub fn diff(context: ErrorContext, kind: DiffErrorKind) -> Self {
        DevDescError::Diff { context, kind }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DevDescError::Archive { .. } => ErrorCategory::Archive,
            DevDescError::Parse { .. } => ErrorCategory::Parse,
            DevDescError::Persistence { .. } => ErrorCategory::Persistence,
            DevDescError::Reconstruction { .. } => ErrorCategory::Reconstruction,
            DevDescError::Diff { .. } => ErrorCategory::Diff,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            DevDescError::Archive { context, .. }
            | DevDescError::Parse { context, .. }
            | DevDescError::Persistence { context, .. }
            | DevDescError::Reconstruction { context, .. }
            | DevDescError::Diff { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            DevDescError::Archive { context, .. }
            | DevDescError::Parse { context, .. }
            | DevDescError::Persistence { context, .. }
            | DevDescError::Reconstruction { context, .. }
            | DevDescError::Diff { context, .. } => context,
        }
    }

    /// Fills in the device id if the error does not carry one yet.
    pub fn with_device(mut self, device_id: &str) -> Self {
        let context = self.context_mut();
        if context.device_id.is_none() {
            context.device_id = Some(device_id.to_string());
        }
        self
    }

    /// Fills in the source file if the error does not carry one yet.
    pub fn with_source(mut self, source_file: &str) -> Self {
        let context = self.context_mut();
        if context.source_file.is_none() {
            context.source_file = Some(source_file.to_string());
        }
        self
    }

    /// `true` when the operation may succeed if simply retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DevDescError::Persistence {
                kind: PersistenceErrorKind::Busy,
                ..
            }
        )
    }
}

impl fmt::Display for ArchiveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveErrorKind::Corrupt(msg) => write!(f, "corrupt container: {}", msg),
            ArchiveErrorKind::Oversized { limit, actual } => {
                write!(f, "size bound exceeded: {} > {} bytes", actual, limit)
            }
            ArchiveErrorKind::TooManyEntries { limit, actual } => {
                write!(f, "too many entries: {} > {}", actual, limit)
            }
            ArchiveErrorKind::TimeBudgetExceeded { budget_ms } => {
                write!(f, "ingestion time budget of {} ms exceeded", budget_ms)
            }
            ArchiveErrorKind::UnsupportedNesting => {
                write!(f, "containers nested deeper than one level are not supported")
            }
            ArchiveErrorKind::UnsupportedFormat(what) => write!(f, "unsupported input: {}", what),
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::Xml(msg) => write!(f, "XML error: {}", msg),
            ParseErrorKind::Encoding => write!(f, "document is not valid UTF-8"),
            ParseErrorKind::Malformed(msg) => write!(f, "malformed content: {}", msg),
            ParseErrorKind::MissingElement(name) => {
                write!(f, "missing required element: {}", name)
            }
            ParseErrorKind::MissingAttribute(name) => {
                write!(f, "missing required attribute: {}", name)
            }
            ParseErrorKind::UnresolvedText(id) => write!(f, "unresolved text reference: {}", id),
            ParseErrorKind::UnresolvedDatatype(id) => {
                write!(f, "unresolved datatype reference: {}", id)
            }
            ParseErrorKind::NumericCoercion { field, value } => {
                write!(f, "field '{}' is not numeric: {:?}", field, value)
            }
        }
    }
}

impl fmt::Display for PersistenceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceErrorKind::Constraint(msg) => write!(f, "constraint violation: {}", msg),
            PersistenceErrorKind::PartialWrite {
                table,
                expected,
                actual,
            } => write!(
                f,
                "partial write detected in '{}': expected {} rows, found {}",
                table, expected, actual
            ),
            PersistenceErrorKind::Busy => write!(f, "device is busy, retry later"),
            PersistenceErrorKind::Backend(msg) => write!(f, "storage backend error: {}", msg),
        }
    }
}

impl fmt::Display for DiffErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffErrorKind::FormatMismatch {
                original,
                reconstructed,
            } => write!(
                f,
                "trees are incomparable: original root '{}' vs reconstructed root '{}'",
                original, reconstructed
            ),
            DiffErrorKind::Unreadable(msg) => write!(f, "reconstruction is unreadable: {}", msg),
        }
    }
}

impl fmt::Display for DevDescError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevDescError::Archive { context, kind } => {
                write!(f, "ArchiveError [{}]: {}", context, kind)
            }
            DevDescError::Parse { context, kind } => write!(f, "ParseError [{}]: {}", context, kind),
            DevDescError::Persistence { context, kind } => {
                write!(f, "PersistenceError [{}]: {}", context, kind)
            }
            DevDescError::Reconstruction {
                context,
                section,
                detail,
            } => write!(
                f,
                "ReconstructionError [{}]: section '{}': {}",
                context, section, detail
            ),
            DevDescError::Diff { context, kind } => write!(f, "DiffError [{}]: {}", context, kind),
        }
    }
}

impl std::error::Error for DevDescError {}

/// Convenience alias used across the workspace.
pub type Result<T> = core::result::Result<T, DevDescError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = DevDescError::parse(
            ErrorContext::new("EDS/Params/Param3")
                .with_device("eds:1:2:1.1")
                .with_source("device.eds"),
            ParseErrorKind::NumericCoercion {
                field: "Param3.max".into(),
                value: "abc".into(),
            },
        );
        let text = err.to_string();
        assert!(text.starts_with("ParseError"));
        assert!(text.contains("device=eds:1:2:1.1"));
        assert!(text.contains("file=device.eds"));
        assert!(text.contains("path=EDS/Params/Param3"));
    }

    #[test]
    fn test_with_device_does_not_overwrite() {
        let err = DevDescError::persistence(
            ErrorContext::new("devices").with_device("first"),
            PersistenceErrorKind::Busy,
        )
        .with_device("second");
        assert_eq!(err.context().device_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_busy_is_retryable() {
        let busy = DevDescError::persistence(ErrorContext::default(), PersistenceErrorKind::Busy);
        assert!(busy.is_retryable());
        assert_eq!(busy.category(), ErrorCategory::Persistence);

        let constraint = DevDescError::persistence(
            ErrorContext::default(),
            PersistenceErrorKind::Constraint("dup".into()),
        );
        assert!(!constraint.is_retryable());
    }

    #[test]
    fn test_empty_path_displays_as_root() {
        let ctx = ErrorContext::default();
        assert_eq!(ctx.to_string(), "device=-, file=-, path=/");
    }
}

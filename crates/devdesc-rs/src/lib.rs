// crates/devdesc-rs/src/lib.rs

#![doc = "Format-agnostic core of the device-description pipeline."]
#![doc = ""]
#![doc = "Provides the intermediate document model shared by the IODD and EDS"]
#![doc = "parsers, the relational entity rows a device is persisted as, the"]
#![doc = "pure document → rows mapper, the ordinal-sorted read view used by the"]
#![doc = "reconstruction builders and the error taxonomy of the whole pipeline."]

// --- Foundation Modules ---
pub mod error;
pub mod log;
pub mod text;
pub mod checksum;

// --- Document Model ---
pub mod context;
pub mod document;
pub mod tree;

// --- Relational Model ---
pub mod entity;
pub mod mapper;
pub mod reconstruction;
pub mod view;

#[doc(hidden)]
pub use ::log as __log;

// --- Top-level Exports ---
pub use checksum::content_checksum;
pub use context::{IngestionContext, ParseOptions};
pub use document::{DeviceDocument, DeviceKey, DocumentFormat, ParsedDocument};
pub use entity::{DeviceSnapshot, DiffCategory, DiffCounts, DiffRecord, QualityScore, SourceDocument};
pub use error::{DevDescError, ErrorCategory, ErrorContext, Result};
pub use mapper::{MappingMeta, map_document};
pub use reconstruction::{Reconstruction, SectionLog};
pub use text::{TextPool, TextRef};
pub use tree::DocNode;
pub use view::SnapshotView;

/// Version recorded with every snapshot and quality score.
pub const PARSER_VERSION: &str = env!("CARGO_PKG_VERSION");

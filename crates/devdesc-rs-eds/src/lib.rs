// crates/devdesc-rs-eds/src/lib.rs

#![doc = "Parses and rebuilds EDS (Electronic Data Sheet) files."]
#![doc = ""]
#![doc = "It supports:"]
#![doc = "- `parse_eds`: lexing an EDS into sections and resolving it into the shared `DeviceDocument` model."]
#![doc = "- `build_eds`: writing a stored `DeviceSnapshot` back out as EDS text."]
#![doc = "- `read_tree`: reading any EDS file into a generic `DocNode` tree."]
#![doc = "- `select_canonical`: choosing one file among several revisions of a device."]

// --- Crate Modules ---

mod builder;
mod layout;
pub mod lexer;
mod package;
mod parser;
mod tree;

// --- Public API Re-exports ---

pub use builder::build_eds;
pub use package::{EdsCandidate, eds_revision_key, filename_version, select_canonical};
pub use parser::{parse_eds, parse_eds_str};
pub use tree::read_tree;

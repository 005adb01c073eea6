// crates/devdesc-rs-iodd/src/lib.rs

#![doc = "Parses and rebuilds IODD (IO-Link Device Description) XML files."]
#![doc = ""]
#![doc = "It supports:"]
#![doc = "- `parse_iodd`: resolving an IODD into the shared `DeviceDocument` model."]
#![doc = "- `build_iodd`: serializing a stored `DeviceSnapshot` back into IODD XML."]
#![doc = "- `read_tree`: reading any XML document into a generic `DocNode` tree."]

// --- Crate Modules ---

mod builder;
mod model;
mod parser;
mod resolver;
mod tree;

// --- Public API Re-exports ---

pub use builder::build_iodd;
pub use parser::{parse_iodd, parse_iodd_str};
pub use tree::read_tree;

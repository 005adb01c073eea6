// crates/devdesc-rs-iodd/src/model/common.rs

//! Small element shapes shared across the schema.

use serde::{Deserialize, Serialize};

/// Any element whose only content is a text pool reference, such as
/// `<Name textId="..."/>` or `<Description textId="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct TextId {
    #[serde(rename = "@textId")]
    pub text_id: String,
}

impl TextId {
    pub fn new(text_id: impl Into<String>) -> Self {
        Self {
            text_id: text_id.into(),
        }
    }
}

/// Represents `<DatatypeRef datatypeId="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct DatatypeRef {
    #[serde(rename = "@datatypeId")]
    pub datatype_id: String,
}

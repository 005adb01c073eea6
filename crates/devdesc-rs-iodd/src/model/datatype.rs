// crates/devdesc-rs-iodd/src/model/datatype.rs

//! Contains model structs for `<Datatype>`, `<SimpleDatatype>` and their
//! value and record children.
//!
//! Named, inline and simple datatypes share one shape. A record item's
//! `SimpleDatatype` may itself hold record items, which is how arbitrarily
//! nested records are represented.

use super::common::{DatatypeRef, TextId};
use serde::{Deserialize, Serialize};

/// Represents `<Datatype>` and `<SimpleDatatype>`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Datatype {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "@xsi:type", default)]
    pub xsi_type: String,

    #[serde(rename = "@bitLength", default, skip_serializing_if = "Option::is_none")]
    pub bit_length: Option<String>,

    #[serde(rename = "@fixedLength", default, skip_serializing_if = "Option::is_none")]
    pub fixed_length: Option<String>,

    #[serde(rename = "@count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<String>,

    #[serde(rename = "@encoding", default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    #[serde(
        rename = "@subindexAccessSupported",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub subindex_access_supported: Option<String>,

    /// Value mappings, record items and the array element type, in order.
    #[serde(rename = "$value", default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<DatatypeItem>,
}

/// The ordered children of a `<Datatype>`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum DatatypeItem {
    SingleValue(SingleValue),
    ValueRange(ValueRange),
    RecordItem(RecordItem),
    SimpleDatatype(Box<Datatype>),
}

/// Represents `<SingleValue value="...">`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct SingleValue {
    #[serde(rename = "@value")]
    pub value: String,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TextId>,
}

/// Represents `<ValueRange lowerValue="..." upperValue="...">`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ValueRange {
    #[serde(rename = "@lowerValue")]
    pub lower_value: String,

    #[serde(rename = "@upperValue")]
    pub upper_value: String,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TextId>,
}

/// Represents `<RecordItem>`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct RecordItem {
    #[serde(rename = "@subindex")]
    pub subindex: String,

    #[serde(rename = "@bitOffset", default)]
    pub bit_offset: String,

    #[serde(
        rename = "@accessRightRestriction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_right_restriction: Option<String>,

    #[serde(rename = "SimpleDatatype", default, skip_serializing_if = "Option::is_none")]
    pub simple_datatype: Option<Box<Datatype>>,

    #[serde(rename = "DatatypeRef", default, skip_serializing_if = "Option::is_none")]
    pub datatype_ref: Option<DatatypeRef>,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TextId>,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<TextId>,
}

/// Represents `<DatatypeCollection>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DatatypeCollection {
    #[serde(rename = "Datatype", default, skip_serializing_if = "Vec::is_empty")]
    pub datatype: Vec<Datatype>,
}

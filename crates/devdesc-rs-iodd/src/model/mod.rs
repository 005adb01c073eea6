// crates/devdesc-rs-iodd/src/model/mod.rs

//! Internal `serde` data structures that map directly to the IODD XML schema.
//!
//! Attributes are kept verbatim as strings; numeric interpretation happens in
//! the resolver. Collections whose children may appear in any order use a
//! `$value` list of choice enums so that document order survives.

#![allow(clippy::pedantic)] // XML schema naming conventions differ from Rust

use serde::{Deserialize, Serialize};

pub mod comm;
pub mod common;
pub mod datatype;
pub mod device_function;
pub mod header;
pub mod identity;
pub mod user_interface;

pub use comm::CommNetworkProfile;
pub use common::TextId;
pub use datatype::Datatype;
pub use device_function::DeviceFunction;
pub use header::{DocumentInfo, ProfileHeader};
pub use identity::DeviceIdentity;

/// The root element of an IODD file.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename = "IODevice")]
pub struct IoDevice {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,

    #[serde(rename = "@xmlns:xsi", default, skip_serializing_if = "Option::is_none")]
    pub xmlns_xsi: Option<String>,

    #[serde(
        rename = "@xsi:schemaLocation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub xsi_schema_location: Option<String>,

    #[serde(rename = "DocumentInfo", default, skip_serializing_if = "Option::is_none")]
    pub document_info: Option<DocumentInfo>,

    #[serde(rename = "ProfileHeader", default, skip_serializing_if = "Option::is_none")]
    pub profile_header: Option<ProfileHeader>,

    #[serde(rename = "ProfileBody", default, skip_serializing_if = "Option::is_none")]
    pub profile_body: Option<ProfileBody>,

    #[serde(
        rename = "CommNetworkProfile",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub comm_network_profile: Option<CommNetworkProfile>,

    #[serde(
        rename = "ExternalTextCollection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub external_text_collection: Option<ExternalTextCollection>,

    #[serde(rename = "Stamp", default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<Stamp>,
}

/// Represents `<ProfileBody>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ProfileBody {
    #[serde(rename = "DeviceIdentity", default, skip_serializing_if = "Option::is_none")]
    pub device_identity: Option<DeviceIdentity>,

    #[serde(rename = "DeviceFunction", default, skip_serializing_if = "Option::is_none")]
    pub device_function: Option<DeviceFunction>,
}

/// Represents `<ExternalTextCollection>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ExternalTextCollection {
    #[serde(rename = "PrimaryLanguage", default, skip_serializing_if = "Option::is_none")]
    pub primary_language: Option<Language>,

    #[serde(rename = "Language", default, skip_serializing_if = "Vec::is_empty")]
    pub language: Vec<Language>,
}

/// Represents `<PrimaryLanguage>` and `<Language>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Language {
    #[serde(rename = "@xml:lang")]
    pub lang: String,

    #[serde(rename = "Text", default, skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<Text>,
}

/// Represents `<Text id="..." value="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Text {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@value", default)]
    pub value: String,
}

/// Represents `<Stamp crc="...">`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Stamp {
    #[serde(rename = "@crc", default, skip_serializing_if = "Option::is_none")]
    pub crc: Option<String>,

    #[serde(rename = "Checker", default, skip_serializing_if = "Option::is_none")]
    pub checker: Option<Checker>,
}

/// Represents `<Checker name="..." version="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Checker {
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "@version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

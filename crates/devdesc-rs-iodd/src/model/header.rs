// crates/devdesc-rs-iodd/src/model/header.rs

//! Contains model structs for `<DocumentInfo>` and `<ProfileHeader>`.

use serde::{Deserialize, Serialize};

/// Represents `<DocumentInfo version="..." releaseDate="..." copyright="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DocumentInfo {
    #[serde(rename = "@version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(rename = "@releaseDate", default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    #[serde(rename = "@copyright", default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
}

/// Metadata header for the profile.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ProfileHeader {
    #[serde(
        rename = "ProfileIdentification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_identification: Option<String>,

    #[serde(rename = "ProfileRevision", default, skip_serializing_if = "Option::is_none")]
    pub profile_revision: Option<String>,

    #[serde(rename = "ProfileName", default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,

    #[serde(rename = "ProfileSource", default, skip_serializing_if = "Option::is_none")]
    pub profile_source: Option<String>,

    #[serde(rename = "ProfileClassID", default, skip_serializing_if = "Option::is_none")]
    pub profile_class_id: Option<String>,

    #[serde(
        rename = "ISO15745Reference",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub iso15745_reference: Option<Iso15745Reference>,
}

/// References the specific part and edition of the ISO 15745 standard.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Iso15745Reference {
    #[serde(rename = "ISO15745Part", default, skip_serializing_if = "Option::is_none")]
    pub iso15745_part: Option<String>,

    #[serde(rename = "ISO15745Edition", default, skip_serializing_if = "Option::is_none")]
    pub iso15745_edition: Option<String>,

    #[serde(rename = "ProfileTechnology", default, skip_serializing_if = "Option::is_none")]
    pub profile_technology: Option<String>,
}

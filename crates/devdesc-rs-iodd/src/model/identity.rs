// crates/devdesc-rs-iodd/src/model/identity.rs

//! Contains model structs related to `<DeviceIdentity>`.

use super::common::TextId;
use serde::{Deserialize, Serialize};

/// Represents `<DeviceIdentity>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DeviceIdentity {
    #[serde(rename = "@vendorId", default)]
    pub vendor_id: String,

    #[serde(rename = "@vendorName", default)]
    pub vendor_name: String,

    #[serde(rename = "@deviceId", default)]
    pub device_id: String,

    #[serde(rename = "VendorText", default, skip_serializing_if = "Option::is_none")]
    pub vendor_text: Option<TextId>,

    #[serde(rename = "VendorUrl", default, skip_serializing_if = "Option::is_none")]
    pub vendor_url: Option<TextId>,

    #[serde(rename = "VendorLogo", default, skip_serializing_if = "Option::is_none")]
    pub vendor_logo: Option<VendorLogo>,

    #[serde(rename = "DeviceName", default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<TextId>,

    #[serde(rename = "DeviceFamily", default, skip_serializing_if = "Option::is_none")]
    pub device_family: Option<TextId>,

    #[serde(
        rename = "DeviceVariantCollection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub device_variant_collection: Option<DeviceVariantCollection>,
}

/// Represents `<VendorLogo name="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct VendorLogo {
    #[serde(rename = "@name")]
    pub name: String,
}

/// Represents `<DeviceVariantCollection>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DeviceVariantCollection {
    #[serde(rename = "DeviceVariant", default, skip_serializing_if = "Vec::is_empty")]
    pub device_variant: Vec<DeviceVariant>,
}

/// Represents `<DeviceVariant>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DeviceVariant {
    #[serde(rename = "@productId")]
    pub product_id: String,

    #[serde(rename = "@deviceSymbol", default, skip_serializing_if = "Option::is_none")]
    pub device_symbol: Option<String>,

    #[serde(rename = "@deviceIcon", default, skip_serializing_if = "Option::is_none")]
    pub device_icon: Option<String>,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TextId>,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<TextId>,
}

// crates/devdesc-rs-iodd/src/model/comm.rs

//! Contains model structs for `<CommNetworkProfile>`.

use serde::{Deserialize, Serialize};

/// Represents `<CommNetworkProfile>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CommNetworkProfile {
    #[serde(rename = "@xsi:type", default, skip_serializing_if = "Option::is_none")]
    pub xsi_type: Option<String>,

    #[serde(rename = "@iolinkRevision", default, skip_serializing_if = "Option::is_none")]
    pub iolink_revision: Option<String>,

    #[serde(rename = "TransportLayers", default, skip_serializing_if = "Option::is_none")]
    pub transport_layers: Option<TransportLayers>,
}

/// Represents `<TransportLayers>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct TransportLayers {
    #[serde(rename = "PhysicalLayer", default, skip_serializing_if = "Option::is_none")]
    pub physical_layer: Option<PhysicalLayer>,
}

/// Represents `<PhysicalLayer>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct PhysicalLayer {
    #[serde(rename = "@bitrate", default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,

    #[serde(rename = "@minCycleTime", default, skip_serializing_if = "Option::is_none")]
    pub min_cycle_time: Option<String>,

    #[serde(rename = "@sioSupported", default, skip_serializing_if = "Option::is_none")]
    pub sio_supported: Option<String>,

    #[serde(
        rename = "@mSequenceCapability",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub m_sequence_capability: Option<String>,

    #[serde(rename = "@physics", default, skip_serializing_if = "Option::is_none")]
    pub physics: Option<String>,
}

// crates/devdesc-rs-iodd/src/builder/header.rs

//! Header-like blocks rebuilt from property rows.

use super::has_block;
use crate::model::comm::{PhysicalLayer, TransportLayers};
use crate::model::device_function::{Features, SupportedAccessLocks};
use crate::model::header::Iso15745Reference;
use crate::model::{Checker, CommNetworkProfile, DocumentInfo, IoDevice, ProfileHeader, Stamp};
use crate::resolver::header::blocks;
use devdesc_rs::SnapshotView;

fn prop(view: &SnapshotView<'_>, section: &str, key: &str) -> Option<String> {
    view.property(section, key).map(str::to_string)
}

/// The root element with its namespace attributes, `DocumentInfo` and
/// `ProfileHeader`.
pub(super) fn build_root(view: &SnapshotView<'_>) -> IoDevice {
    let document_info = has_block(view, blocks::DOCUMENT_INFO).then(|| DocumentInfo {
        version: prop(view, blocks::DOCUMENT_INFO, "version"),
        release_date: prop(view, blocks::DOCUMENT_INFO, "releaseDate"),
        copyright: prop(view, blocks::DOCUMENT_INFO, "copyright"),
    });

    let profile_header = has_block(view, blocks::PROFILE_HEADER).then(|| {
        let iso = blocks::ISO15745_REFERENCE;
        let iso15745_reference = view
            .properties_of(iso)
            .next()
            .is_some()
            .then(|| Iso15745Reference {
                iso15745_part: prop(view, iso, "ISO15745Part"),
                iso15745_edition: prop(view, iso, "ISO15745Edition"),
                profile_technology: prop(view, iso, "ProfileTechnology"),
            });
        let ph = blocks::PROFILE_HEADER;
        ProfileHeader {
            profile_identification: prop(view, ph, "ProfileIdentification"),
            profile_revision: prop(view, ph, "ProfileRevision"),
            profile_name: prop(view, ph, "ProfileName"),
            profile_source: prop(view, ph, "ProfileSource"),
            profile_class_id: prop(view, ph, "ProfileClassID"),
            iso15745_reference,
        }
    });

    IoDevice {
        xmlns: prop(view, blocks::ROOT, "xmlns"),
        xmlns_xsi: prop(view, blocks::ROOT, "xmlns:xsi"),
        xsi_schema_location: prop(view, blocks::ROOT, "xsi:schemaLocation"),
        document_info,
        profile_header,
        ..Default::default()
    }
}

pub(super) fn build_features(view: &SnapshotView<'_>) -> Option<Features> {
    if !has_block(view, blocks::FEATURES) {
        return None;
    }
    let locks = blocks::SUPPORTED_ACCESS_LOCKS;
    let supported_access_locks = has_block(view, locks).then(|| SupportedAccessLocks {
        parameter: prop(view, locks, "parameter"),
        data_storage: prop(view, locks, "dataStorage"),
        local_parameterization: prop(view, locks, "localParameterization"),
        local_user_interface: prop(view, locks, "localUserInterface"),
    });
    Some(Features {
        block_parameter: prop(view, blocks::FEATURES, "blockParameter"),
        data_storage: prop(view, blocks::FEATURES, "dataStorage"),
        profile_characteristic: prop(view, blocks::FEATURES, "profileCharacteristic"),
        supported_access_locks,
    })
}

pub(super) fn build_comm_network_profile(view: &SnapshotView<'_>) -> Option<CommNetworkProfile> {
    if !has_block(view, blocks::COMM_NETWORK_PROFILE) {
        return None;
    }
    let phy = blocks::PHYSICAL_LAYER;
    let transport_layers = has_block(view, blocks::TRANSPORT_LAYERS).then(|| TransportLayers {
        physical_layer: has_block(view, phy).then(|| PhysicalLayer {
            bitrate: prop(view, phy, "bitrate"),
            min_cycle_time: prop(view, phy, "minCycleTime"),
            sio_supported: prop(view, phy, "sioSupported"),
            m_sequence_capability: prop(view, phy, "mSequenceCapability"),
            physics: prop(view, phy, "physics"),
        }),
    });
    Some(CommNetworkProfile {
        xsi_type: prop(view, blocks::COMM_NETWORK_PROFILE, "xsi:type"),
        iolink_revision: prop(view, blocks::COMM_NETWORK_PROFILE, "iolinkRevision"),
        transport_layers,
    })
}

pub(super) fn build_stamp(view: &SnapshotView<'_>) -> Option<Stamp> {
    if !has_block(view, blocks::STAMP) {
        return None;
    }
    Some(Stamp {
        crc: prop(view, blocks::STAMP, "crc"),
        checker: has_block(view, blocks::CHECKER).then(|| Checker {
            name: prop(view, blocks::CHECKER, "name"),
            version: prop(view, blocks::CHECKER, "version"),
        }),
    })
}

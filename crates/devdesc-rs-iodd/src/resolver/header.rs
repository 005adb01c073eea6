// crates/devdesc-rs-iodd/src/resolver/header.rs

//! Pass 3: device identity and the header-like blocks kept as properties
//! (`DocumentInfo`, `ProfileHeader`, `Features`, `CommNetworkProfile`,
//! `Stamp`).
//!
//! Property sections and keys use the element and attribute names of the
//! document so the builder can emit them back without a translation table.

use super::utils::{parse_u32, push_properties};
use crate::model::{self, IoDevice};
use devdesc_rs::IngestionContext;
use devdesc_rs::document::{DeviceDocument, DeviceVariant, DocumentProperty};
use devdesc_rs::error::{ParseErrorKind, Result};

/// Block names recorded as sections when present in the document.
pub(crate) mod blocks {
    pub const DOCUMENT_INFO: &str = "DocumentInfo";
    pub const PROFILE_HEADER: &str = "ProfileHeader";
    pub const DEVICE_VARIANT_COLLECTION: &str = "DeviceVariantCollection";
    pub const DEVICE_FUNCTION: &str = "DeviceFunction";
    pub const FEATURES: &str = "Features";
    pub const SUPPORTED_ACCESS_LOCKS: &str = "SupportedAccessLocks";
    pub const DATATYPE_COLLECTION: &str = "DatatypeCollection";
    pub const VARIABLE_COLLECTION: &str = "VariableCollection";
    pub const PROCESS_DATA_COLLECTION: &str = "ProcessDataCollection";
    pub const EVENT_COLLECTION: &str = "EventCollection";
    pub const USER_INTERFACE: &str = "UserInterface";
    pub const MENU_COLLECTION: &str = "MenuCollection";
    pub const COMM_NETWORK_PROFILE: &str = "CommNetworkProfile";
    pub const TRANSPORT_LAYERS: &str = "TransportLayers";
    pub const PHYSICAL_LAYER: &str = "PhysicalLayer";
    pub const EXTERNAL_TEXT_COLLECTION: &str = "ExternalTextCollection";
    pub const STAMP: &str = "Stamp";
    pub const CHECKER: &str = "Checker";
    /// Pseudo section holding the root element's namespace attributes.
    pub const ROOT: &str = "IODevice";
    pub const DEVICE_IDENTITY: &str = "DeviceIdentity";
    pub const ISO15745_REFERENCE: &str = "ISO15745Reference";
}

/// Records which optional blocks the document contains, in document order.
pub(super) fn collect_sections(device: &IoDevice) -> Vec<String> {
    let mut sections = Vec::new();
    let mut add = |present: bool, name: &str| {
        if present {
            sections.push(name.to_string());
        }
    };
    add(device.document_info.is_some(), blocks::DOCUMENT_INFO);
    add(device.profile_header.is_some(), blocks::PROFILE_HEADER);
    let body = device.profile_body.as_ref();
    let identity = body.and_then(|b| b.device_identity.as_ref());
    add(
        identity.is_some_and(|i| i.device_variant_collection.is_some()),
        blocks::DEVICE_VARIANT_COLLECTION,
    );
    let function = body.and_then(|b| b.device_function.as_ref());
    add(function.is_some(), blocks::DEVICE_FUNCTION);
    if let Some(f) = function {
        add(f.features.is_some(), blocks::FEATURES);
        add(
            f.features
                .as_ref()
                .is_some_and(|x| x.supported_access_locks.is_some()),
            blocks::SUPPORTED_ACCESS_LOCKS,
        );
        add(f.datatype_collection.is_some(), blocks::DATATYPE_COLLECTION);
        add(f.variable_collection.is_some(), blocks::VARIABLE_COLLECTION);
        add(
            f.process_data_collection.is_some(),
            blocks::PROCESS_DATA_COLLECTION,
        );
        add(f.event_collection.is_some(), blocks::EVENT_COLLECTION);
        add(f.user_interface.is_some(), blocks::USER_INTERFACE);
        add(
            f.user_interface
                .as_ref()
                .is_some_and(|u| u.menu_collection.is_some()),
            blocks::MENU_COLLECTION,
        );
    }
    let comm = device.comm_network_profile.as_ref();
    add(comm.is_some(), blocks::COMM_NETWORK_PROFILE);
    let transport = comm.and_then(|c| c.transport_layers.as_ref());
    add(transport.is_some(), blocks::TRANSPORT_LAYERS);
    add(
        transport.is_some_and(|t| t.physical_layer.is_some()),
        blocks::PHYSICAL_LAYER,
    );
    add(
        device.external_text_collection.is_some(),
        blocks::EXTERNAL_TEXT_COLLECTION,
    );
    add(device.stamp.is_some(), blocks::STAMP);
    add(
        device.stamp.as_ref().is_some_and(|s| s.checker.is_some()),
        blocks::CHECKER,
    );
    sections
}

/// Root attributes, `DocumentInfo` and `ProfileHeader`.
pub(super) fn resolve_header(device: &IoDevice, props: &mut Vec<DocumentProperty>) {
    push_properties(
        props,
        blocks::ROOT,
        &[
            ("xmlns", device.xmlns.as_ref()),
            ("xmlns:xsi", device.xmlns_xsi.as_ref()),
            ("xsi:schemaLocation", device.xsi_schema_location.as_ref()),
        ],
    );
    if let Some(info) = &device.document_info {
        push_properties(
            props,
            blocks::DOCUMENT_INFO,
            &[
                ("version", info.version.as_ref()),
                ("releaseDate", info.release_date.as_ref()),
                ("copyright", info.copyright.as_ref()),
            ],
        );
    }
    if let Some(header) = &device.profile_header {
        push_properties(
            props,
            blocks::PROFILE_HEADER,
            &[
                ("ProfileIdentification", header.profile_identification.as_ref()),
                ("ProfileRevision", header.profile_revision.as_ref()),
                ("ProfileName", header.profile_name.as_ref()),
                ("ProfileSource", header.profile_source.as_ref()),
                ("ProfileClassID", header.profile_class_id.as_ref()),
            ],
        );
        if let Some(iso) = &header.iso15745_reference {
            push_properties(
                props,
                blocks::ISO15745_REFERENCE,
                &[
                    ("ISO15745Part", iso.iso15745_part.as_ref()),
                    ("ISO15745Edition", iso.iso15745_edition.as_ref()),
                    ("ProfileTechnology", iso.profile_technology.as_ref()),
                ],
            );
        }
    }
}

/// The revision used for the device key and canonical selection:
/// `DocumentInfo@version`, else `ProfileRevision`.
pub(super) fn document_revision(device: &IoDevice) -> String {
    device
        .document_info
        .as_ref()
        .and_then(|i| i.version.clone())
        .or_else(|| {
            device
                .profile_header
                .as_ref()
                .and_then(|h| h.profile_revision.clone())
        })
        .unwrap_or_else(|| "0".to_string())
}

/// Fills `doc.identity` and the `DeviceIdentity` properties.
pub(super) fn resolve_identity(
    identity: &model::DeviceIdentity,
    revision: String,
    doc: &mut DeviceDocument,
    ctx: &mut IngestionContext,
) -> Result<()> {
    ctx.within("DeviceIdentity", |ctx| {
        if identity.vendor_id.is_empty() {
            return Err(ctx.parse_error(ParseErrorKind::MissingAttribute("vendorId")));
        }
        if identity.device_id.is_empty() {
            return Err(ctx.parse_error(ParseErrorKind::MissingAttribute("deviceId")));
        }
        doc.identity.vendor_id = parse_u32(ctx, "vendorId", &identity.vendor_id)?;
        doc.identity.device_id = parse_u32(ctx, "deviceId", &identity.device_id)?;
        doc.identity.vendor_name = identity.vendor_name.clone();
        doc.identity.revision = revision;
        ctx.set_device_id(doc.key().to_string());

        let text_children = [
            ("VendorText", identity.vendor_text.as_ref()),
            ("VendorUrl", identity.vendor_url.as_ref()),
            ("DeviceName", identity.device_name.as_ref()),
            ("DeviceFamily", identity.device_family.as_ref()),
        ];
        for (key, text) in text_children {
            if let Some(text) = text {
                ctx.resolve_text(&text.text_id)?;
                doc.properties.push(DocumentProperty::new(
                    blocks::DEVICE_IDENTITY,
                    key,
                    text.text_id.as_str(),
                ));
            }
        }
        if let Some(logo) = &identity.vendor_logo {
            doc.properties.push(DocumentProperty::new(
                blocks::DEVICE_IDENTITY,
                "VendorLogo",
                logo.name.as_str(),
            ));
        }
        doc.identity.product_name = identity
            .device_name
            .as_ref()
            .and_then(|n| ctx.texts().resolve(&n.text_id, None))
            .unwrap_or_default()
            .to_string();

        if let Some(collection) = &identity.device_variant_collection {
            for variant in &collection.device_variant {
                let resolved = ctx.within(format!("DeviceVariant[{}]", variant.product_id), |ctx| {
                    Ok(DeviceVariant {
                        product_id: variant.product_id.clone(),
                        symbol: variant.device_symbol.clone(),
                        icon: variant.device_icon.clone(),
                        name: ctx
                            .resolve_text_opt(variant.name.as_ref().map(|n| n.text_id.as_str()))?,
                        description: ctx.resolve_text_opt(
                            variant.description.as_ref().map(|n| n.text_id.as_str()),
                        )?,
                    })
                })?;
                doc.identity.variants.push(resolved);
            }
        }
        Ok(())
    })
}

/// `Features` and its `SupportedAccessLocks`.
pub(super) fn resolve_features(
    features: Option<&model::device_function::Features>,
    props: &mut Vec<DocumentProperty>,
) {
    let Some(features) = features else {
        return;
    };
    push_properties(
        props,
        blocks::FEATURES,
        &[
            ("blockParameter", features.block_parameter.as_ref()),
            ("dataStorage", features.data_storage.as_ref()),
            ("profileCharacteristic", features.profile_characteristic.as_ref()),
        ],
    );
    if let Some(locks) = &features.supported_access_locks {
        push_properties(
            props,
            blocks::SUPPORTED_ACCESS_LOCKS,
            &[
                ("parameter", locks.parameter.as_ref()),
                ("dataStorage", locks.data_storage.as_ref()),
                ("localParameterization", locks.local_parameterization.as_ref()),
                ("localUserInterface", locks.local_user_interface.as_ref()),
            ],
        );
    }
}

/// `CommNetworkProfile` and `Stamp`.
pub(super) fn resolve_trailer(device: &IoDevice, props: &mut Vec<DocumentProperty>) {
    if let Some(comm) = &device.comm_network_profile {
        push_properties(
            props,
            blocks::COMM_NETWORK_PROFILE,
            &[
                ("xsi:type", comm.xsi_type.as_ref()),
                ("iolinkRevision", comm.iolink_revision.as_ref()),
            ],
        );
        if let Some(phy) = comm
            .transport_layers
            .as_ref()
            .and_then(|t| t.physical_layer.as_ref())
        {
            push_properties(
                props,
                blocks::PHYSICAL_LAYER,
                &[
                    ("bitrate", phy.bitrate.as_ref()),
                    ("minCycleTime", phy.min_cycle_time.as_ref()),
                    ("sioSupported", phy.sio_supported.as_ref()),
                    ("mSequenceCapability", phy.m_sequence_capability.as_ref()),
                    ("physics", phy.physics.as_ref()),
                ],
            );
        }
    }
    if let Some(stamp) = &device.stamp {
        push_properties(props, blocks::STAMP, &[("crc", stamp.crc.as_ref())]);
        if let Some(checker) = &stamp.checker {
            push_properties(
                props,
                blocks::CHECKER,
                &[
                    ("name", checker.name.as_ref()),
                    ("version", checker.version.as_ref()),
                ],
            );
        }
    }
}

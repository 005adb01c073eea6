// crates/devdesc-rs-iodd/src/builder/identity.rs

use super::has_block;
use crate::model::TextId;
use crate::model::identity::{DeviceIdentity, DeviceVariant, DeviceVariantCollection, VendorLogo};
use crate::resolver::header::blocks;
use devdesc_rs::SnapshotView;

/// Rebuilds `<DeviceIdentity>` from the device row, its properties and the
/// variant rows.
pub(super) fn build_device_identity(view: &SnapshotView<'_>) -> DeviceIdentity {
    let device = view.device();
    let text = |key: &str| view.property(blocks::DEVICE_IDENTITY, key).map(TextId::new);

    let device_variant_collection =
        has_block(view, blocks::DEVICE_VARIANT_COLLECTION).then(|| DeviceVariantCollection {
            device_variant: view
                .variants()
                .iter()
                .map(|v| DeviceVariant {
                    product_id: v.product_id.clone(),
                    device_symbol: v.symbol.clone(),
                    device_icon: v.icon.clone(),
                    name: v.name_text.as_deref().map(TextId::new),
                    description: v.description_text.as_deref().map(TextId::new),
                })
                .collect(),
        });

    DeviceIdentity {
        vendor_id: device.vendor_id.to_string(),
        vendor_name: device.vendor_name.clone(),
        device_id: device.device_id.to_string(),
        vendor_text: text("VendorText"),
        vendor_url: text("VendorUrl"),
        vendor_logo: view
            .property(blocks::DEVICE_IDENTITY, "VendorLogo")
            .map(|name| VendorLogo {
                name: name.to_string(),
            }),
        device_name: text("DeviceName"),
        device_family: text("DeviceFamily"),
        device_variant_collection,
    }
}

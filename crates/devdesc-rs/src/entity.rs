// crates/devdesc-rs/src/entity.rs

//! Relational entity rows.
//!
//! A [`DeviceSnapshot`] is the complete set of rows for one device. Rows are
//! scoped by the device key and reference each other through the original
//! identity strings. Every ordered collection carries an explicit `ordinal`
//! which is the only order source used at reconstruction time.

use crate::document::{
    Attribute, ConnectionDirection, Direction, DocumentFormat, EntryVariant, MenuItemKind, Role,
    ValueKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRow {
    pub device_key: String,
    pub format: DocumentFormat,
    pub vendor_id: u32,
    pub device_id: u32,
    pub vendor_name: String,
    pub product_name: String,
    pub revision: String,
    pub source_file: String,
    /// SHA-256 of the source bytes, hex encoded.
    pub checksum: String,
    pub parser_version: String,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRow {
    pub section: String,
    pub key: String,
    pub value: String,
    pub ordinal: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub name: String,
    pub ordinal: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRow {
    pub ordinal: u32,
    pub product_id: String,
    pub symbol: Option<String>,
    pub icon: Option<String>,
    pub name_text: Option<String>,
    pub description_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatatypeRow {
    pub id: String,
    pub ordinal: u32,
    pub kind: String,
    pub bit_length: Option<u32>,
    pub fixed_length: Option<u32>,
    pub count: Option<u32>,
    pub encoding: Option<String>,
    pub inline: bool,
    pub owner: Option<String>,
    pub element_kind: Option<String>,
    pub element_bit_length: Option<u32>,
    pub element_fixed_length: Option<u32>,
    pub element_encoding: Option<String>,
    pub attributes: Vec<Attribute>,
}

/// A value mapping entry of a datatype (`item_index == None`) or of the
/// inline simple type of one of its record items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatatypeValueRow {
    pub datatype_id: String,
    pub item_index: Option<u32>,
    pub ordinal: u32,
    pub kind: ValueKind,
    pub value: String,
    pub upper: Option<String>,
    pub name_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordItemRow {
    pub datatype_id: String,
    pub item_index: u32,
    pub parent_index: Option<u32>,
    /// Position among the siblings sharing `parent_index`.
    pub ordinal: u32,
    pub subindex: u32,
    pub bit_offset: u32,
    pub simple_kind: Option<String>,
    pub simple_bit_length: Option<u32>,
    pub simple_fixed_length: Option<u32>,
    pub simple_encoding: Option<String>,
    pub datatype_ref: Option<String>,
    pub name_text: Option<String>,
    pub description_text: Option<String>,
    pub access_restriction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRow {
    pub id: String,
    pub ordinal: u32,
    pub variant: EntryVariant,
    pub index: Option<u32>,
    pub subindex: Option<u32>,
    pub access: Option<String>,
    pub datatype_id: Option<String>,
    pub default_value: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub name_text: Option<String>,
    pub description_text: Option<String>,
    pub unit_text: Option<String>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterOverrideRow {
    pub parameter_id: String,
    pub ordinal: u32,
    pub element: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDataRow {
    pub id: String,
    pub ordinal: u32,
    pub group_id: String,
    pub direction: Direction,
    pub bit_length: Option<u32>,
    pub datatype_id: Option<String>,
    pub name_text: Option<String>,
    pub condition_variable: Option<String>,
    pub condition_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    /// Verbatim code string; unique per device.
    pub code: String,
    /// Original document position, independent of `code`.
    pub ordinal: u32,
    pub variant: EntryVariant,
    pub code_value: u32,
    pub event_type: Option<String>,
    pub mode: Option<String>,
    pub name_text: Option<String>,
    pub description_text: Option<String>,
    pub name_synthesized: bool,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyRow {
    pub id: String,
    pub ordinal: u32,
    pub name_text: Option<String>,
    pub path: Option<String>,
    pub size: Option<String>,
    pub descriptor: Option<String>,
    pub reserved: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyMemberRow {
    pub assembly_id: String,
    pub ordinal: u32,
    pub bit_size: Option<u32>,
    pub bit_offset: u32,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRow {
    pub id: String,
    pub ordinal: u32,
    pub direction: ConnectionDirection,
    pub ot_size: Option<u32>,
    pub to_size: Option<u32>,
    pub rpi: Option<String>,
    pub name_text: Option<String>,
    pub help_text: Option<String>,
    pub path: Option<String>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRow {
    pub id: String,
    pub ordinal: u32,
    pub name_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemRow {
    pub menu_id: String,
    pub ordinal: u32,
    pub kind: MenuItemKind,
    pub target: String,
    pub subindex: Option<u32>,
    pub access_restriction: Option<String>,
    pub display_format: Option<String>,
    pub unit_code: Option<String>,
    pub button_value: Option<String>,
    pub button_description_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMenuRow {
    pub role: Role,
    pub slot: String,
    pub menu_id: String,
    pub ordinal: u32,
}

/// Computed visibility: `menu_id` is reachable from `role`'s menu set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MenuRoleRow {
    pub menu_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRow {
    pub language: String,
    pub primary: bool,
    pub ordinal: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRow {
    pub language: String,
    pub text_id: String,
    pub ordinal: u32,
    pub value: String,
}

/// The complete entity graph of one device. Created, replaced and deleted as
/// one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub device: DeviceRow,
    pub properties: Vec<PropertyRow>,
    pub sections: Vec<SectionRow>,
    pub variants: Vec<VariantRow>,
    pub datatypes: Vec<DatatypeRow>,
    pub datatype_values: Vec<DatatypeValueRow>,
    pub record_items: Vec<RecordItemRow>,
    pub parameters: Vec<ParameterRow>,
    pub parameter_overrides: Vec<ParameterOverrideRow>,
    pub process_data: Vec<ProcessDataRow>,
    pub events: Vec<EventRow>,
    pub assemblies: Vec<AssemblyRow>,
    pub assembly_members: Vec<AssemblyMemberRow>,
    pub connections: Vec<ConnectionRow>,
    pub menus: Vec<MenuRow>,
    pub menu_items: Vec<MenuItemRow>,
    pub role_menus: Vec<RoleMenuRow>,
    pub menu_roles: Vec<MenuRoleRow>,
    pub languages: Vec<LanguageRow>,
    pub texts: Vec<TextRow>,
}

impl DeviceSnapshot {
    pub fn new(device: DeviceRow) -> Self {
        Self {
            device,
            properties: Vec::new(),
            sections: Vec::new(),
            variants: Vec::new(),
            datatypes: Vec::new(),
            datatype_values: Vec::new(),
            record_items: Vec::new(),
            parameters: Vec::new(),
            parameter_overrides: Vec::new(),
            process_data: Vec::new(),
            events: Vec::new(),
            assemblies: Vec::new(),
            assembly_members: Vec::new(),
            connections: Vec::new(),
            menus: Vec::new(),
            menu_items: Vec::new(),
            role_menus: Vec::new(),
            menu_roles: Vec::new(),
            languages: Vec::new(),
            texts: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.device.device_key
    }

    /// Row count per child table, in a fixed table order. Used to verify that
    /// a write landed completely.
    pub fn table_counts(&self) -> [(&'static str, usize); 19] {
        [
            ("properties", self.properties.len()),
            ("sections", self.sections.len()),
            ("variants", self.variants.len()),
            ("datatypes", self.datatypes.len()),
            ("datatype_values", self.datatype_values.len()),
            ("record_items", self.record_items.len()),
            ("parameters", self.parameters.len()),
            ("parameter_overrides", self.parameter_overrides.len()),
            ("process_data", self.process_data.len()),
            ("events", self.events.len()),
            ("assemblies", self.assemblies.len()),
            ("assembly_members", self.assembly_members.len()),
            ("connections", self.connections.len()),
            ("menus", self.menus.len()),
            ("menu_items", self.menu_items.len()),
            ("role_menus", self.role_menus.len()),
            ("menu_roles", self.menu_roles.len()),
            ("languages", self.languages.len()),
            ("texts", self.texts.len()),
        ]
    }

    /// Equality that ignores the ingestion timestamp.
    pub fn eq_ignoring_timestamps(&self, other: &DeviceSnapshot) -> bool {
        let mut left = self.clone();
        left.device.ingested_at = other.device.ingested_at;
        &left == other
    }
}

/// The original bytes a snapshot was built from, kept for re-scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub file_name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

// --- Diff output ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffCategory {
    MissingElement,
    ExtraElement,
    ValueChanged,
    OrderChanged,
}

impl DiffCategory {
    pub const ALL: [DiffCategory; 4] = [
        DiffCategory::MissingElement,
        DiffCategory::ExtraElement,
        DiffCategory::ValueChanged,
        DiffCategory::OrderChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiffCategory::MissingElement => "MISSING_ELEMENT",
            DiffCategory::ExtraElement => "EXTRA_ELEMENT",
            DiffCategory::ValueChanged => "VALUE_CHANGED",
            DiffCategory::OrderChanged => "ORDER_CHANGED",
        }
    }
}

impl fmt::Display for DiffCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One difference between an original document and its reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub category: DiffCategory,
    pub path: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    /// Contribution to the weighted diff count.
    #[serde(skip)]
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCounts {
    pub missing_element: u32,
    pub extra_element: u32,
    pub value_changed: u32,
    pub order_changed: u32,
}

impl DiffCounts {
    pub fn from_records(records: &[DiffRecord]) -> Self {
        let mut counts = DiffCounts::default();
        for record in records {
            counts.add(record.category);
        }
        counts
    }

    pub fn add(&mut self, category: DiffCategory) {
        match category {
            DiffCategory::MissingElement => self.missing_element += 1,
            DiffCategory::ExtraElement => self.extra_element += 1,
            DiffCategory::ValueChanged => self.value_changed += 1,
            DiffCategory::OrderChanged => self.order_changed += 1,
        }
    }

    pub fn get(&self, category: DiffCategory) -> u32 {
        match category {
            DiffCategory::MissingElement => self.missing_element,
            DiffCategory::ExtraElement => self.extra_element,
            DiffCategory::ValueChanged => self.value_changed,
            DiffCategory::OrderChanged => self.order_changed,
        }
    }

    pub fn total(&self) -> u32 {
        self.missing_element + self.extra_element + self.value_changed + self.order_changed
    }
}

/// One scoring run of one device. Append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub device_key: String,
    pub score: f64,
    pub counts: DiffCounts,
    pub parser_version: String,
    pub timestamp: DateTime<Utc>,
    pub incomplete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn device_row(ts: i64) -> DeviceRow {
        DeviceRow {
            device_key: "eds:1:2:1.1".into(),
            format: DocumentFormat::Eds,
            vendor_id: 1,
            device_id: 2,
            vendor_name: "Vendor".into(),
            product_name: "Product".into(),
            revision: "1.1".into(),
            source_file: "a.eds".into(),
            checksum: "00".into(),
            parser_version: "0.1.0".into(),
            ingested_at: Utc.timestamp_opt(ts, 0).unwrap(),
        }
    }

    #[test]
    fn test_eq_ignoring_timestamps() {
        let a = DeviceSnapshot::new(device_row(1));
        let mut b = DeviceSnapshot::new(device_row(2));
        assert_ne!(a, b);
        assert!(a.eq_ignoring_timestamps(&b));
        b.sections.push(SectionRow {
            name: "File".into(),
            ordinal: 0,
        });
        assert!(!a.eq_ignoring_timestamps(&b));
    }

    #[test]
    fn test_diff_counts() {
        let records = vec![
            DiffRecord {
                category: DiffCategory::MissingElement,
                path: "/a".into(),
                expected: Some("a".into()),
                actual: None,
                weight: 1.0,
            },
            DiffRecord {
                category: DiffCategory::MissingElement,
                path: "/b".into(),
                expected: Some("b".into()),
                actual: None,
                weight: 1.0,
            },
            DiffRecord {
                category: DiffCategory::OrderChanged,
                path: "/".into(),
                expected: None,
                actual: None,
                weight: 0.0,
            },
        ];
        let counts = DiffCounts::from_records(&records);
        assert_eq!(counts.get(DiffCategory::MissingElement), 2);
        assert_eq!(counts.get(DiffCategory::OrderChanged), 1);
        assert_eq!(counts.total(), 3);
    }
}

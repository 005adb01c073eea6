// crates/devdesc-rs/src/document.rs

//! The intermediate, format-agnostic document model.
//!
//! Both the IODD resolver and the EDS parser produce a [`DeviceDocument`].
//! Every collection is a `Vec` in the order the parser encountered it; that
//! position becomes the ordinal column when the document is mapped to rows.
//! Identity strings (`id`, `code`, ...) are kept verbatim.

use crate::text::{TextPool, TextRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two supported description formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentFormat {
    Iodd,
    Eds,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Iodd => "iodd",
            DocumentFormat::Eds => "eds",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "iodd" => Some(DocumentFormat::Iodd),
            "eds" => Some(DocumentFormat::Eds),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable key of a device snapshot: `format:vendor:device:revision`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceKey(pub String);

impl DeviceKey {
    pub fn new(format: DocumentFormat, vendor_id: u32, device_id: u32, revision: &str) -> Self {
        DeviceKey(format!("{}:{}:{}:{}", format, vendor_id, device_id, revision))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric components of a revision string, e.g. `"V1.3"` → `[1, 3]`.
///
/// Tuples compare component-wise, so `[1, 10] > [1, 9]`. A string without
/// digits yields an empty key, which sorts below every real revision.
pub fn revision_key(revision: &str) -> Vec<u32> {
    revision
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}

/// A verbatim `name="value"` pair for attributes or fields the model does
/// not give a dedicated slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Looks up an attribute value by name.
pub fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}

// --- Identity ---

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceVariant {
    pub product_id: String,
    pub symbol: Option<String>,
    pub icon: Option<String>,
    pub name: Option<TextRef>,
    pub description: Option<TextRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor_id: u32,
    pub device_id: u32,
    pub vendor_name: String,
    pub product_name: String,
    /// Revision string used for the device key and canonical selection.
    pub revision: String,
    pub variants: Vec<DeviceVariant>,
}

/// A scalar field of a header-like section that has no dedicated entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentProperty {
    pub section: String,
    pub key: String,
    pub value: String,
}

impl DocumentProperty {
    pub fn new(section: &str, key: &str, value: impl Into<String>) -> Self {
        Self {
            section: section.to_string(),
            key: key.to_string(),
            value: value.into(),
        }
    }
}

// --- Datatypes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Single,
    Range,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Single => "single",
            ValueKind::Range => "range",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(ValueKind::Single),
            "range" => Some(ValueKind::Range),
            _ => None,
        }
    }
}

/// One entry of an enumeration or value-range mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatatypeValue {
    pub kind: ValueKind,
    /// Single value, or the lower bound of a range.
    pub value: String,
    pub upper: Option<String>,
    pub name: Option<TextRef>,
}

/// A scalar type used inline by record items and array elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleType {
    pub kind: String,
    pub bit_length: Option<u32>,
    pub fixed_length: Option<u32>,
    pub encoding: Option<String>,
    pub values: Vec<DatatypeValue>,
}

/// A named sub-field of a composite datatype.
///
/// Items are stored flat in preorder; `index` is unique within the owning
/// datatype and `parent` points at the enclosing item for nested records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordItem {
    pub index: u32,
    pub parent: Option<u32>,
    pub subindex: u32,
    pub bit_offset: u32,
    pub simple: Option<SimpleType>,
    pub datatype_ref: Option<String>,
    pub name: Option<TextRef>,
    pub description: Option<TextRef>,
    pub access_restriction: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatatypeDef {
    pub id: String,
    /// Base type name verbatim (`UIntegerT`, `RecordT`, EDS `EnumN` base...).
    pub kind: String,
    pub bit_length: Option<u32>,
    pub fixed_length: Option<u32>,
    pub count: Option<u32>,
    pub encoding: Option<String>,
    /// The entity that declared this type inline; `None` for named types.
    pub owner: Option<String>,
    /// Element type of an array.
    pub element: Option<SimpleType>,
    pub values: Vec<DatatypeValue>,
    pub record_items: Vec<RecordItem>,
    pub attributes: Vec<Attribute>,
}

impl DatatypeDef {
    pub fn is_inline(&self) -> bool {
        self.owner.is_some()
    }

    /// Direct children of `parent` (`None` for top-level items), in order.
    pub fn children_of(&self, parent: Option<u32>) -> impl Iterator<Item = &RecordItem> {
        self.record_items.iter().filter(move |i| i.parent == parent)
    }
}

/// Identifier given to a datatype declared inline by `owner`.
pub fn inline_datatype_id(owner: &str) -> String {
    format!("{}#dt", owner)
}

// --- Parameters ---

/// A child element that refines a parameter (`RecordItemInfo`,
/// `StdSingleValueRef`, `StdRecordItemRef`...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementOverride {
    pub element: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterDef {
    pub id: String,
    pub index: Option<u32>,
    pub subindex: Option<u32>,
    pub access: Option<String>,
    pub datatype: Option<String>,
    pub default_value: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub name: Option<TextRef>,
    pub description: Option<TextRef>,
    pub unit: Option<TextRef>,
    pub attributes: Vec<Attribute>,
    pub overrides: Vec<ElementOverride>,
}

/// Shorthand pointing at a library-standard variable definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StdParameterRef {
    pub id: String,
    pub default_value: Option<String>,
    pub attributes: Vec<Attribute>,
    pub overrides: Vec<ElementOverride>,
}

/// A parameter is either fully defined or a standard reference. The choice
/// is made once by the parser and never re-derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterEntry {
    Full(ParameterDef),
    StdRef(StdParameterRef),
}

impl ParameterEntry {
    pub fn id(&self) -> &str {
        match self {
            ParameterEntry::Full(p) => &p.id,
            ParameterEntry::StdRef(r) => &r.id,
        }
    }

    pub fn variant(&self) -> EntryVariant {
        match self {
            ParameterEntry::Full(_) => EntryVariant::Full,
            ParameterEntry::StdRef(_) => EntryVariant::StdRef,
        }
    }
}

/// The persisted tag of a full-vs-reference entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryVariant {
    Full,
    StdRef,
}

impl EntryVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryVariant::Full => "full",
            EntryVariant::StdRef => "std_ref",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full" => Some(EntryVariant::Full),
            "std_ref" => Some(EntryVariant::StdRef),
            _ => None,
        }
    }
}

// --- Process data ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDataCondition {
    pub variable_id: String,
    pub value: String,
}

/// One `ProcessDataIn` / `ProcessDataOut` block. Items sharing a `group_id`
/// came from the same `ProcessData` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDataItem {
    pub id: String,
    pub group_id: String,
    pub direction: Direction,
    pub bit_length: Option<u32>,
    pub datatype: Option<String>,
    pub name: Option<TextRef>,
    pub condition: Option<ProcessDataCondition>,
}

// --- Events ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDef {
    /// The code exactly as written in the document.
    pub code: String,
    pub code_value: u32,
    pub event_type: Option<String>,
    pub mode: Option<String>,
    pub name: Option<TextRef>,
    pub description: Option<TextRef>,
    /// `true` when the document carried no name and one was synthesized.
    pub name_synthesized: bool,
}

impl EventDef {
    /// Display name used when the document does not provide one.
    pub fn synthesized_name(code_value: u32) -> String {
        format!("Event 0x{:04X}", code_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdEventRef {
    pub code: String,
    pub code_value: u32,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventEntry {
    Full(EventDef),
    StdRef(StdEventRef),
}

impl EventEntry {
    pub fn code(&self) -> &str {
        match self {
            EventEntry::Full(e) => &e.code,
            EventEntry::StdRef(r) => &r.code,
        }
    }

    pub fn code_value(&self) -> u32 {
        match self {
            EventEntry::Full(e) => e.code_value,
            EventEntry::StdRef(r) => r.code_value,
        }
    }

    pub fn variant(&self) -> EntryVariant {
        match self {
            EventEntry::Full(_) => EntryVariant::Full,
            EventEntry::StdRef(_) => EntryVariant::StdRef,
        }
    }
}

// --- Assemblies and connections (EDS) ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyMember {
    /// Declared size in bits; empty in the document means "unspecified".
    pub bit_size: Option<u32>,
    /// Running sum of the preceding member sizes.
    pub bit_offset: u32,
    /// Member reference (`ParamN`, `AssemN` or empty for padding).
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub id: String,
    pub name: Option<TextRef>,
    pub path: Option<String>,
    pub size: Option<String>,
    pub descriptor: Option<String>,
    /// The two reserved header fields, verbatim.
    pub reserved: Vec<String>,
    pub members: Vec<AssemblyMember>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionDirection {
    Output,
    Input,
    Bidirectional,
    Unspecified,
}

impl ConnectionDirection {
    /// Originator→target carries outputs, target→originator carries inputs.
    pub fn from_sizes(ot_size: Option<u32>, to_size: Option<u32>) -> Self {
        match (ot_size.unwrap_or(0) > 0, to_size.unwrap_or(0) > 0) {
            (true, true) => ConnectionDirection::Bidirectional,
            (true, false) => ConnectionDirection::Output,
            (false, true) => ConnectionDirection::Input,
            (false, false) => ConnectionDirection::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionDirection::Output => "output",
            ConnectionDirection::Input => "input",
            ConnectionDirection::Bidirectional => "bidirectional",
            ConnectionDirection::Unspecified => "unspecified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "output" => Some(ConnectionDirection::Output),
            "input" => Some(ConnectionDirection::Input),
            "bidirectional" => Some(ConnectionDirection::Bidirectional),
            "unspecified" => Some(ConnectionDirection::Unspecified),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: String,
    pub name: Option<TextRef>,
    pub help: Option<TextRef>,
    pub direction: ConnectionDirection,
    pub ot_size: Option<u32>,
    pub to_size: Option<u32>,
    pub rpi: Option<String>,
    pub path: Option<String>,
    /// Every field of the entry verbatim, in document order.
    pub fields: Vec<String>,
}

// --- User interface ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuItemKind {
    VariableRef,
    RecordItemRef,
    MenuRef,
}

impl MenuItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuItemKind::VariableRef => "VariableRef",
            MenuItemKind::RecordItemRef => "RecordItemRef",
            MenuItemKind::MenuRef => "MenuRef",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VariableRef" => Some(MenuItemKind::VariableRef),
            "RecordItemRef" => Some(MenuItemKind::RecordItemRef),
            "MenuRef" => Some(MenuItemKind::MenuRef),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuButton {
    pub value: String,
    pub description: Option<TextRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub kind: MenuItemKind,
    /// Variable id or menu id the item points at.
    pub target: String,
    pub subindex: Option<u32>,
    pub access_restriction: Option<String>,
    pub display_format: Option<String>,
    pub unit_code: Option<String>,
    pub button: Option<MenuButton>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub id: String,
    pub name: Option<TextRef>,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Observer,
    Maintenance,
    Specialist,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Observer, Role::Maintenance, Role::Specialist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Observer => "observer",
            Role::Maintenance => "maintenance",
            Role::Specialist => "specialist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "observer" => Some(Role::Observer),
            "maintenance" => Some(Role::Maintenance),
            "specialist" => Some(Role::Specialist),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMenuEntry {
    /// Slot element name (`IdentificationMenu`, `ParameterMenu`, ...).
    pub slot: String,
    pub menu_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMenuSet {
    pub role: Role,
    pub entries: Vec<RoleMenuEntry>,
}

// --- Document ---

/// The parsed form of one device-description document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDocument {
    pub format: DocumentFormat,
    pub identity: DeviceIdentity,
    /// Section order (EDS) or top-level block order (IODD).
    pub sections: Vec<String>,
    pub properties: Vec<DocumentProperty>,
    pub datatypes: Vec<DatatypeDef>,
    pub parameters: Vec<ParameterEntry>,
    pub process_data: Vec<ProcessDataItem>,
    pub events: Vec<EventEntry>,
    pub assemblies: Vec<Assembly>,
    pub connections: Vec<Connection>,
    pub menus: Vec<Menu>,
    pub role_menus: Vec<RoleMenuSet>,
    pub texts: TextPool,
}

impl DeviceDocument {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            identity: DeviceIdentity::default(),
            sections: Vec::new(),
            properties: Vec::new(),
            datatypes: Vec::new(),
            parameters: Vec::new(),
            process_data: Vec::new(),
            events: Vec::new(),
            assemblies: Vec::new(),
            connections: Vec::new(),
            menus: Vec::new(),
            role_menus: Vec::new(),
            texts: TextPool::new(),
        }
    }

    pub fn key(&self) -> DeviceKey {
        DeviceKey::new(
            self.format,
            self.identity.vendor_id,
            self.identity.device_id,
            &self.identity.revision,
        )
    }

    pub fn property(&self, section: &str, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.section == section && p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn datatype(&self, id: &str) -> Option<&DatatypeDef> {
        self.datatypes.iter().find(|d| d.id == id)
    }

    /// Display text of an entity, using the primary language.
    pub fn text(&self, text: Option<&TextRef>) -> Option<&str> {
        text.and_then(|t| self.texts.resolve(t.as_str(), None))
    }

    /// Display name of an event: its own text, or the synthesized name.
    pub fn event_display_name(&self, event: &EventEntry) -> String {
        match event {
            EventEntry::Full(e) => match self.text(e.name.as_ref()) {
                Some(name) if !e.name_synthesized => name.to_string(),
                _ => EventDef::synthesized_name(e.code_value),
            },
            EventEntry::StdRef(r) => EventDef::synthesized_name(r.code_value),
        }
    }
}

/// Parser output: the document plus the non-fatal problems found on the way.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: DeviceDocument,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_key_format() {
        let key = DeviceKey::new(DocumentFormat::Iodd, 310, 1043, "V1.1");
        assert_eq!(key.as_str(), "iodd:310:1043:V1.1");
    }

    #[test]
    fn test_revision_key_compares_numerically() {
        assert_eq!(revision_key("V1.3"), vec![1, 3]);
        assert_eq!(revision_key("2.10"), vec![2, 10]);
        assert!(revision_key("V1.10") > revision_key("V1.9"));
        assert!(revision_key("unknown").is_empty());
    }

    #[test]
    fn test_connection_direction_from_sizes() {
        assert_eq!(
            ConnectionDirection::from_sizes(Some(4), Some(8)),
            ConnectionDirection::Bidirectional
        );
        assert_eq!(
            ConnectionDirection::from_sizes(None, Some(8)),
            ConnectionDirection::Input
        );
        assert_eq!(
            ConnectionDirection::from_sizes(Some(2), Some(0)),
            ConnectionDirection::Output
        );
        assert_eq!(
            ConnectionDirection::from_sizes(None, None),
            ConnectionDirection::Unspecified
        );
    }

    #[test]
    fn test_event_display_name_synthesized() {
        let mut doc = DeviceDocument::new(DocumentFormat::Iodd);
        doc.texts.insert("en", "TN_Ev", "Overtemperature");
        let named = EventEntry::Full(EventDef {
            code: "16912".into(),
            code_value: 16912,
            event_type: Some("Warning".into()),
            mode: None,
            name: Some(TextRef::from("TN_Ev")),
            description: None,
            name_synthesized: false,
        });
        let unnamed = EventEntry::Full(EventDef {
            code: "0x1800".into(),
            code_value: 0x1800,
            event_type: None,
            mode: None,
            name: None,
            description: None,
            name_synthesized: true,
        });
        assert_eq!(doc.event_display_name(&named), "Overtemperature");
        assert_eq!(doc.event_display_name(&unnamed), "Event 0x1800");
    }

    #[test]
    fn test_enum_string_forms_are_reversible() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        for kind in [
            MenuItemKind::VariableRef,
            MenuItemKind::RecordItemRef,
            MenuItemKind::MenuRef,
        ] {
            assert_eq!(MenuItemKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntryVariant::parse("std_ref"), Some(EntryVariant::StdRef));
        assert_eq!(DocumentFormat::parse("eds"), Some(DocumentFormat::Eds));
    }
}

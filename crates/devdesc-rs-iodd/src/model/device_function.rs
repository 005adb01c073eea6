// crates/devdesc-rs-iodd/src/model/device_function.rs

//! Contains model structs related to `<DeviceFunction>`: features,
//! variables, process data and events.

use super::common::{DatatypeRef, TextId};
use super::datatype::{Datatype, DatatypeCollection};
use super::user_interface::UserInterface;
use serde::{Deserialize, Serialize};

/// Represents the `<DeviceFunction>` element.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DeviceFunction {
    #[serde(rename = "Features", default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Features>,

    #[serde(
        rename = "DatatypeCollection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub datatype_collection: Option<DatatypeCollection>,

    #[serde(
        rename = "VariableCollection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub variable_collection: Option<VariableCollection>,

    #[serde(
        rename = "ProcessDataCollection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub process_data_collection: Option<ProcessDataCollection>,

    #[serde(rename = "EventCollection", default, skip_serializing_if = "Option::is_none")]
    pub event_collection: Option<EventCollection>,

    #[serde(rename = "UserInterface", default, skip_serializing_if = "Option::is_none")]
    pub user_interface: Option<UserInterface>,
}

// --- Features ---

/// Represents `<Features>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Features {
    #[serde(rename = "@blockParameter", default, skip_serializing_if = "Option::is_none")]
    pub block_parameter: Option<String>,

    #[serde(rename = "@dataStorage", default, skip_serializing_if = "Option::is_none")]
    pub data_storage: Option<String>,

    #[serde(
        rename = "@profileCharacteristic",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_characteristic: Option<String>,

    #[serde(
        rename = "SupportedAccessLocks",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub supported_access_locks: Option<SupportedAccessLocks>,
}

/// Represents `<SupportedAccessLocks>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SupportedAccessLocks {
    #[serde(rename = "@parameter", default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,

    #[serde(rename = "@dataStorage", default, skip_serializing_if = "Option::is_none")]
    pub data_storage: Option<String>,

    #[serde(
        rename = "@localParameterization",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub local_parameterization: Option<String>,

    #[serde(
        rename = "@localUserInterface",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub local_user_interface: Option<String>,
}

// --- Variables ---

/// Represents `<VariableCollection>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct VariableCollection {
    #[serde(rename = "$value", default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<VariableItem>,
}

/// A variable is either a standard reference or a full definition.
#[derive(Debug, Serialize, Deserialize)]
pub enum VariableItem {
    StdVariableRef(StdVariableRef),
    Variable(Variable),
}

/// Represents `<StdVariableRef>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StdVariableRef {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@defaultValue", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(
        rename = "@fixedLengthRestriction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed_length_restriction: Option<String>,

    #[serde(
        rename = "@excludedFromDataStorage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub excluded_from_data_storage: Option<String>,

    #[serde(rename = "$value", default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<StdVariableRefItem>,
}

/// The refinements allowed inside a `<StdVariableRef>`.
#[derive(Debug, Serialize, Deserialize)]
pub enum StdVariableRefItem {
    StdSingleValueRef(StdSingleValueRef),
    StdRecordItemRef(StdRecordItemRef),
}

/// Represents `<StdSingleValueRef value="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StdSingleValueRef {
    #[serde(rename = "@value")]
    pub value: String,
}

/// Represents `<StdRecordItemRef subindex="..." defaultValue="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StdRecordItemRef {
    #[serde(rename = "@subindex")]
    pub subindex: String,

    #[serde(rename = "@defaultValue", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// Represents `<Variable>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Variable {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    #[serde(rename = "@accessRights", default, skip_serializing_if = "Option::is_none")]
    pub access_rights: Option<String>,

    #[serde(rename = "@defaultValue", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(rename = "@dynamic", default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<String>,

    #[serde(
        rename = "@modifiesOtherVariables",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub modifies_other_variables: Option<String>,

    #[serde(
        rename = "@excludedFromDataStorage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub excluded_from_data_storage: Option<String>,

    #[serde(rename = "Datatype", default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Datatype>,

    #[serde(rename = "DatatypeRef", default, skip_serializing_if = "Option::is_none")]
    pub datatype_ref: Option<DatatypeRef>,

    #[serde(rename = "RecordItemInfo", default, skip_serializing_if = "Vec::is_empty")]
    pub record_item_info: Vec<RecordItemInfo>,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TextId>,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<TextId>,
}

/// Represents `<RecordItemInfo>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct RecordItemInfo {
    #[serde(rename = "@subindex")]
    pub subindex: String,

    #[serde(rename = "@defaultValue", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(
        rename = "@excludedFromDataStorage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub excluded_from_data_storage: Option<String>,

    #[serde(
        rename = "@modifiesOtherVariables",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub modifies_other_variables: Option<String>,
}

// --- Process Data ---

/// Represents `<ProcessDataCollection>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ProcessDataCollection {
    #[serde(rename = "ProcessData", default, skip_serializing_if = "Vec::is_empty")]
    pub process_data: Vec<ProcessData>,
}

/// Represents `<ProcessData>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ProcessData {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,

    #[serde(rename = "ProcessDataIn", default, skip_serializing_if = "Option::is_none")]
    pub process_data_in: Option<ProcessDataItem>,

    #[serde(rename = "ProcessDataOut", default, skip_serializing_if = "Option::is_none")]
    pub process_data_out: Option<ProcessDataItem>,
}

/// Represents `<Condition variableId="..." value="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Condition {
    #[serde(rename = "@variableId")]
    pub variable_id: String,

    #[serde(rename = "@value")]
    pub value: String,
}

/// Represents `<ProcessDataIn>` and `<ProcessDataOut>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ProcessDataItem {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@bitLength", default, skip_serializing_if = "Option::is_none")]
    pub bit_length: Option<String>,

    #[serde(rename = "Datatype", default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Datatype>,

    #[serde(rename = "DatatypeRef", default, skip_serializing_if = "Option::is_none")]
    pub datatype_ref: Option<DatatypeRef>,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TextId>,
}

// --- Events ---

/// Represents `<EventCollection>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct EventCollection {
    #[serde(rename = "$value", default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<EventItem>,
}

/// An event is either a full definition or a standard reference.
#[derive(Debug, Serialize, Deserialize)]
pub enum EventItem {
    Event(Event),
    StdEventRef(StdEventRef),
}

/// Represents `<Event>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Event {
    #[serde(rename = "@code")]
    pub code: String,

    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    #[serde(rename = "@mode", default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TextId>,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<TextId>,
}

/// Represents `<StdEventRef code="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StdEventRef {
    #[serde(rename = "@code")]
    pub code: String,
}

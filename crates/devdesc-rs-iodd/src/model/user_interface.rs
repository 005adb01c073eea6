// crates/devdesc-rs-iodd/src/model/user_interface.rs

//! Contains model structs related to `<UserInterface>`: menus and the three
//! role menu sets.

use super::common::TextId;
use serde::{Deserialize, Serialize};

/// Represents `<UserInterface>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct UserInterface {
    #[serde(rename = "MenuCollection", default, skip_serializing_if = "Option::is_none")]
    pub menu_collection: Option<MenuCollection>,

    #[serde(
        rename = "ObserverRoleMenuSet",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub observer_role_menu_set: Option<RoleMenuSet>,

    #[serde(
        rename = "MaintenanceRoleMenuSet",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub maintenance_role_menu_set: Option<RoleMenuSet>,

    #[serde(
        rename = "SpecialistRoleMenuSet",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub specialist_role_menu_set: Option<RoleMenuSet>,
}

/// Represents `<MenuCollection>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct MenuCollection {
    #[serde(rename = "Menu", default, skip_serializing_if = "Vec::is_empty")]
    pub menu: Vec<Menu>,
}

/// Represents `<Menu id="...">`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Menu {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "$value", default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<MenuChild>,
}

/// The ordered children of a `<Menu>`.
#[derive(Debug, Serialize, Deserialize)]
pub enum MenuChild {
    Name(TextId),
    VariableRef(VariableRef),
    RecordItemRef(RecordItemRef),
    MenuRef(MenuRef),
}

/// Represents `<VariableRef>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct VariableRef {
    #[serde(rename = "@variableId")]
    pub variable_id: String,

    #[serde(
        rename = "@accessRightRestriction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_right_restriction: Option<String>,

    #[serde(rename = "@displayFormat", default, skip_serializing_if = "Option::is_none")]
    pub display_format: Option<String>,

    #[serde(rename = "@unitCode", default, skip_serializing_if = "Option::is_none")]
    pub unit_code: Option<String>,

    #[serde(rename = "Button", default, skip_serializing_if = "Option::is_none")]
    pub button: Option<Button>,
}

/// Represents `<Button buttonValue="...">`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Button {
    #[serde(rename = "@buttonValue")]
    pub button_value: String,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<TextId>,
}

/// Represents `<RecordItemRef>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct RecordItemRef {
    #[serde(rename = "@variableId")]
    pub variable_id: String,

    #[serde(rename = "@subindex")]
    pub subindex: String,

    #[serde(
        rename = "@accessRightRestriction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_right_restriction: Option<String>,

    #[serde(rename = "@displayFormat", default, skip_serializing_if = "Option::is_none")]
    pub display_format: Option<String>,

    #[serde(rename = "@unitCode", default, skip_serializing_if = "Option::is_none")]
    pub unit_code: Option<String>,
}

/// Represents `<MenuRef menuId="..."/>`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct MenuRef {
    #[serde(rename = "@menuId")]
    pub menu_id: String,
}

/// Represents one of the `*RoleMenuSet` elements.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct RoleMenuSet {
    #[serde(rename = "$value", default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<RoleMenu>,
}

/// The menu slots of a role menu set.
#[derive(Debug, Serialize, Deserialize)]
pub enum RoleMenu {
    IdentificationMenu(MenuRef),
    ParameterMenu(MenuRef),
    ObservationMenu(MenuRef),
    DiagnosisMenu(MenuRef),
}

impl RoleMenu {
    pub fn slot(&self) -> &'static str {
        match self {
            RoleMenu::IdentificationMenu(_) => "IdentificationMenu",
            RoleMenu::ParameterMenu(_) => "ParameterMenu",
            RoleMenu::ObservationMenu(_) => "ObservationMenu",
            RoleMenu::DiagnosisMenu(_) => "DiagnosisMenu",
        }
    }

    pub fn menu_id(&self) -> &str {
        match self {
            RoleMenu::IdentificationMenu(r)
            | RoleMenu::ParameterMenu(r)
            | RoleMenu::ObservationMenu(r)
            | RoleMenu::DiagnosisMenu(r) => &r.menu_id,
        }
    }

    pub fn from_slot(slot: &str, menu_id: String) -> Option<Self> {
        let r = MenuRef { menu_id };
        match slot {
            "IdentificationMenu" => Some(RoleMenu::IdentificationMenu(r)),
            "ParameterMenu" => Some(RoleMenu::ParameterMenu(r)),
            "ObservationMenu" => Some(RoleMenu::ObservationMenu(r)),
            "DiagnosisMenu" => Some(RoleMenu::DiagnosisMenu(r)),
            _ => None,
        }
    }
}

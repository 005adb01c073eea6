// crates/devdesc-rs-iodd/src/builder/menus.rs

use super::has_block;
use crate::model::TextId;
use crate::model::user_interface::{
    Button, Menu, MenuChild, MenuCollection, MenuRef, RecordItemRef, RoleMenu, RoleMenuSet,
    UserInterface, VariableRef,
};
use crate::resolver::header::blocks;
use devdesc_rs::document::{MenuItemKind, Role};
use devdesc_rs::entity::{MenuItemRow, MenuRow};
use devdesc_rs::error::Result;
use devdesc_rs::{SectionLog, SnapshotView};

const SECTION: &str = blocks::USER_INTERFACE;

pub(super) fn build_user_interface(view: &SnapshotView<'_>, log: &mut SectionLog) -> UserInterface {
    let menu_collection = if has_block(view, blocks::MENU_COLLECTION) {
        let results: Vec<Result<Menu>> = view
            .menus()
            .iter()
            .map(|m| build_menu(view, m, log))
            .collect();
        Some(MenuCollection {
            menu: log.items(SECTION, results),
        })
    } else {
        None
    };

    let mut role_set = |role: Role| -> Option<RoleMenuSet> {
        let rows = view.role_menus(role);
        if rows.is_empty() {
            return None;
        }
        let results: Vec<Result<RoleMenu>> = rows
            .iter()
            .map(|r| {
                RoleMenu::from_slot(&r.slot, r.menu_id.clone()).ok_or_else(|| {
                    log.missing(
                        SECTION,
                        format!("unknown {} menu slot '{}'", role.as_str(), r.slot),
                    )
                })
            })
            .collect();
        Some(RoleMenuSet {
            items: log.items(SECTION, results),
        })
    };

    UserInterface {
        menu_collection,
        observer_role_menu_set: role_set(Role::Observer),
        maintenance_role_menu_set: role_set(Role::Maintenance),
        specialist_role_menu_set: role_set(Role::Specialist),
    }
}

fn build_menu(view: &SnapshotView<'_>, menu: &MenuRow, log: &SectionLog) -> Result<Menu> {
    let mut items = Vec::new();
    if let Some(name) = &menu.name_text {
        items.push(MenuChild::Name(TextId::new(name.as_str())));
    }
    for item in view.items_of(&menu.id) {
        items.push(build_item(item, log)?);
    }
    Ok(Menu {
        id: menu.id.clone(),
        items,
    })
}

fn build_item(item: &MenuItemRow, log: &SectionLog) -> Result<MenuChild> {
    Ok(match item.kind {
        MenuItemKind::VariableRef => MenuChild::VariableRef(VariableRef {
            variable_id: item.target.clone(),
            access_right_restriction: item.access_restriction.clone(),
            display_format: item.display_format.clone(),
            unit_code: item.unit_code.clone(),
            button: item.button_value.as_ref().map(|value| Button {
                button_value: value.clone(),
                description: item.button_description_text.as_deref().map(TextId::new),
            }),
        }),
        MenuItemKind::RecordItemRef => {
            let subindex = item.subindex.ok_or_else(|| {
                log.missing(
                    SECTION,
                    format!(
                        "record item reference to '{}' in menu '{}' has no subindex",
                        item.target, item.menu_id
                    ),
                )
            })?;
            MenuChild::RecordItemRef(RecordItemRef {
                variable_id: item.target.clone(),
                subindex: subindex.to_string(),
                access_right_restriction: item.access_restriction.clone(),
                display_format: item.display_format.clone(),
                unit_code: item.unit_code.clone(),
            })
        }
        MenuItemKind::MenuRef => MenuChild::MenuRef(MenuRef {
            menu_id: item.target.clone(),
        }),
    })
}

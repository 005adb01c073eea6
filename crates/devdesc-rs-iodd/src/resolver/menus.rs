// crates/devdesc-rs-iodd/src/resolver/menus.rs

//! Pass 7: `<UserInterface>`: the menu collection and the role menu sets.

use super::utils::parse_u32;
use crate::model::user_interface::{self, MenuChild, UserInterface};
use devdesc_rs::IngestionContext;
use devdesc_rs::document::{
    Menu, MenuButton, MenuItem, MenuItemKind, Role, RoleMenuEntry, RoleMenuSet,
};
use devdesc_rs::error::Result;
use std::collections::BTreeSet;

pub(super) fn resolve_user_interface(
    ui: Option<&UserInterface>,
    ctx: &mut IngestionContext,
) -> Result<(Vec<Menu>, Vec<RoleMenuSet>)> {
    let Some(ui) = ui else {
        return Ok((Vec::new(), Vec::new()));
    };
    ctx.within("UserInterface", |ctx| {
        let mut menus = Vec::new();
        if let Some(collection) = &ui.menu_collection {
            ctx.within("MenuCollection", |ctx| {
                for menu in &collection.menu {
                    let resolved =
                        ctx.within(format!("Menu[{}]", menu.id), |ctx| resolve_menu(menu, ctx))?;
                    menus.push(resolved);
                }
                Ok(())
            })?;
        }

        let known: BTreeSet<&str> = menus.iter().map(|m| m.id.as_str()).collect();
        for menu in &menus {
            for item in menu.items.iter().filter(|i| i.kind == MenuItemKind::MenuRef) {
                if !known.contains(item.target.as_str()) {
                    ctx.warn(format!(
                        "menu '{}' references unknown menu '{}'",
                        menu.id, item.target
                    ));
                }
            }
        }

        let sets = [
            (Role::Observer, ui.observer_role_menu_set.as_ref()),
            (Role::Maintenance, ui.maintenance_role_menu_set.as_ref()),
            (Role::Specialist, ui.specialist_role_menu_set.as_ref()),
        ];
        let mut role_menus = Vec::new();
        for (role, set) in sets {
            let Some(set) = set else { continue };
            let entries: Vec<RoleMenuEntry> = set
                .items
                .iter()
                .map(|slot| RoleMenuEntry {
                    slot: slot.slot().to_string(),
                    menu_id: slot.menu_id().to_string(),
                })
                .collect();
            for entry in &entries {
                if !known.contains(entry.menu_id.as_str()) {
                    ctx.warn(format!(
                        "{} role menu '{}' references unknown menu '{}'",
                        role.as_str(),
                        entry.slot,
                        entry.menu_id
                    ));
                }
            }
            role_menus.push(RoleMenuSet { role, entries });
        }
        Ok((menus, role_menus))
    })
}

fn resolve_menu(menu: &user_interface::Menu, ctx: &mut IngestionContext) -> Result<Menu> {
    let mut resolved = Menu {
        id: menu.id.clone(),
        name: None,
        items: Vec::with_capacity(menu.items.len()),
    };
    for child in &menu.items {
        match child {
            MenuChild::Name(name) => {
                resolved.name = Some(ctx.resolve_text(&name.text_id)?);
            }
            MenuChild::VariableRef(v) => {
                let button = match &v.button {
                    Some(b) => Some(MenuButton {
                        value: b.button_value.clone(),
                        description: ctx
                            .resolve_text_opt(b.description.as_ref().map(|d| d.text_id.as_str()))?,
                    }),
                    None => None,
                };
                resolved.items.push(MenuItem {
                    kind: MenuItemKind::VariableRef,
                    target: v.variable_id.clone(),
                    subindex: None,
                    access_restriction: v.access_right_restriction.clone(),
                    display_format: v.display_format.clone(),
                    unit_code: v.unit_code.clone(),
                    button,
                });
            }
            MenuChild::RecordItemRef(r) => resolved.items.push(MenuItem {
                kind: MenuItemKind::RecordItemRef,
                target: r.variable_id.clone(),
                subindex: Some(parse_u32(ctx, "subindex", &r.subindex)?),
                access_restriction: r.access_right_restriction.clone(),
                display_format: r.display_format.clone(),
                unit_code: r.unit_code.clone(),
                button: None,
            }),
            MenuChild::MenuRef(r) => resolved.items.push(MenuItem {
                kind: MenuItemKind::MenuRef,
                target: r.menu_id.clone(),
                subindex: None,
                access_restriction: None,
                display_format: None,
                unit_code: None,
                button: None,
            }),
        }
    }
    Ok(resolved)
}

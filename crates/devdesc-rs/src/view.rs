// crates/devdesc-rs/src/view.rs

//! Read-side access to a [`DeviceSnapshot`] for the reconstruction builders.
//!
//! The view never trusts the order rows come back from storage: every child
//! list is sorted by its ordinal column once, when the view is built.

use crate::entity::*;
use crate::document::Role;
use std::collections::BTreeMap;

pub struct SnapshotView<'a> {
    snapshot: &'a DeviceSnapshot,
    primary_language: Option<&'a str>,
    texts: BTreeMap<&'a str, BTreeMap<&'a str, &'a str>>,
    texts_by_language: BTreeMap<&'a str, Vec<&'a TextRow>>,
    languages: Vec<&'a LanguageRow>,
    sections: Vec<&'a SectionRow>,
    properties: Vec<&'a PropertyRow>,
    variants: Vec<&'a VariantRow>,
    datatypes: Vec<&'a DatatypeRow>,
    values: BTreeMap<&'a str, BTreeMap<Option<u32>, Vec<&'a DatatypeValueRow>>>,
    record_items: BTreeMap<&'a str, BTreeMap<Option<u32>, Vec<&'a RecordItemRow>>>,
    parameters: Vec<&'a ParameterRow>,
    overrides: BTreeMap<&'a str, Vec<&'a ParameterOverrideRow>>,
    process_data: Vec<&'a ProcessDataRow>,
    events: Vec<&'a EventRow>,
    assemblies: Vec<&'a AssemblyRow>,
    members: BTreeMap<&'a str, Vec<&'a AssemblyMemberRow>>,
    connections: Vec<&'a ConnectionRow>,
    menus: Vec<&'a MenuRow>,
    menu_items: BTreeMap<&'a str, Vec<&'a MenuItemRow>>,
    role_menus: BTreeMap<Role, Vec<&'a RoleMenuRow>>,
}

fn sorted<'a, T>(rows: &'a [T], ordinal: impl Fn(&T) -> u32) -> Vec<&'a T> {
    let mut out: Vec<&T> = rows.iter().collect();
    out.sort_by_key(|r| ordinal(r));
    out
}

fn grouped<'a, K: Ord, T>(
    rows: &'a [T],
    key: impl Fn(&'a T) -> K,
    ordinal: impl Fn(&T) -> u32,
) -> BTreeMap<K, Vec<&'a T>> {
    let mut map: BTreeMap<K, Vec<&'a T>> = BTreeMap::new();
    for row in rows {
        map.entry(key(row)).or_default().push(row);
    }
    for list in map.values_mut() {
        list.sort_by_key(|r| ordinal(r));
    }
    map
}

/// Groups by an outer string key, then by an inner key, each list sorted by
/// ordinal.
fn nested<'a, K: Ord, T>(
    rows: &'a [T],
    outer: impl Fn(&'a T) -> &'a str,
    inner: impl Fn(&'a T) -> K,
    ordinal: impl Fn(&T) -> u32,
) -> BTreeMap<&'a str, BTreeMap<K, Vec<&'a T>>> {
    let mut map: BTreeMap<&'a str, BTreeMap<K, Vec<&'a T>>> = BTreeMap::new();
    for row in rows {
        map.entry(outer(row))
            .or_default()
            .entry(inner(row))
            .or_default()
            .push(row);
    }
    for list in map.values_mut().flat_map(|m| m.values_mut()) {
        list.sort_by_key(|r| ordinal(r));
    }
    map
}

impl<'a> SnapshotView<'a> {
    pub fn new(snapshot: &'a DeviceSnapshot) -> Self {
        let languages = sorted(&snapshot.languages, |r| r.ordinal);
        let primary_language = languages
            .iter()
            .find(|l| l.primary)
            .or_else(|| languages.first())
            .map(|l| l.language.as_str());
        let mut texts: BTreeMap<&str, BTreeMap<&str, &str>> = BTreeMap::new();
        for t in &snapshot.texts {
            texts
                .entry(t.language.as_str())
                .or_default()
                .insert(t.text_id.as_str(), t.value.as_str());
        }

        Self {
            snapshot,
            primary_language,
            texts,
            texts_by_language: grouped(&snapshot.texts, |t| t.language.as_str(), |t| t.ordinal),
            languages,
            sections: sorted(&snapshot.sections, |r| r.ordinal),
            properties: sorted(&snapshot.properties, |r| r.ordinal),
            variants: sorted(&snapshot.variants, |r| r.ordinal),
            datatypes: sorted(&snapshot.datatypes, |r| r.ordinal),
            values: nested(
                &snapshot.datatype_values,
                |v| v.datatype_id.as_str(),
                |v| v.item_index,
                |v| v.ordinal,
            ),
            record_items: nested(
                &snapshot.record_items,
                |r| r.datatype_id.as_str(),
                |r| r.parent_index,
                |r| r.ordinal,
            ),
            parameters: sorted(&snapshot.parameters, |r| r.ordinal),
            overrides: grouped(
                &snapshot.parameter_overrides,
                |o| o.parameter_id.as_str(),
                |o| o.ordinal,
            ),
            process_data: sorted(&snapshot.process_data, |r| r.ordinal),
            events: sorted(&snapshot.events, |r| r.ordinal),
            assemblies: sorted(&snapshot.assemblies, |r| r.ordinal),
            members: grouped(
                &snapshot.assembly_members,
                |m| m.assembly_id.as_str(),
                |m| m.ordinal,
            ),
            connections: sorted(&snapshot.connections, |r| r.ordinal),
            menus: sorted(&snapshot.menus, |r| r.ordinal),
            menu_items: grouped(&snapshot.menu_items, |i| i.menu_id.as_str(), |i| i.ordinal),
            role_menus: grouped(&snapshot.role_menus, |r| r.role, |r| r.ordinal),
        }
    }

    pub fn snapshot(&self) -> &'a DeviceSnapshot {
        self.snapshot
    }

    pub fn device(&self) -> &'a DeviceRow {
        &self.snapshot.device
    }

    // --- Texts ---

    pub fn primary_language(&self) -> Option<&'a str> {
        self.primary_language
    }

    pub fn languages(&self) -> &[&'a LanguageRow] {
        &self.languages
    }

    pub fn texts_of(&self, language: &str) -> &[&'a TextRow] {
        self.texts_by_language
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolves a text id in the primary language, falling back to any
    /// language that defines it.
    pub fn text(&self, id: &str) -> Option<&'a str> {
        let lookup = |lang: &str| self.texts.get(lang).and_then(|m| m.get(id)).copied();
        if let Some(value) = self.primary_language.and_then(lookup) {
            return Some(value);
        }
        self.languages.iter().find_map(|l| lookup(&l.language))
    }

    // --- Sections and properties ---

    pub fn sections(&self) -> &[&'a SectionRow] {
        &self.sections
    }

    pub fn properties_of(&self, section: &'a str) -> impl Iterator<Item = &'a PropertyRow> + '_ {
        self.properties
            .iter()
            .copied()
            .filter(move |p| p.section == section)
    }

    pub fn property(&self, section: &str, key: &str) -> Option<&'a str> {
        self.properties
            .iter()
            .find(|p| p.section == section && p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.properties.iter().any(|p| p.section == section)
    }

    pub fn variants(&self) -> &[&'a VariantRow] {
        &self.variants
    }

    // --- Datatypes ---

    pub fn datatypes(&self) -> &[&'a DatatypeRow] {
        &self.datatypes
    }

    pub fn datatype(&self, id: &str) -> Option<&'a DatatypeRow> {
        self.datatypes.iter().find(|d| d.id == id).copied()
    }

    /// The inline datatype declared by `owner`, if any.
    pub fn inline_datatype_of(&self, owner: &str) -> Option<&'a DatatypeRow> {
        self.datatypes
            .iter()
            .find(|d| d.inline && d.owner.as_deref() == Some(owner))
            .copied()
    }

    pub fn values_of(&self, datatype_id: &str, item_index: Option<u32>) -> &[&'a DatatypeValueRow] {
        self.values
            .get(datatype_id)
            .and_then(|m| m.get(&item_index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn record_children(&self, datatype_id: &str, parent: Option<u32>) -> &[&'a RecordItemRow] {
        self.record_items
            .get(datatype_id)
            .and_then(|m| m.get(&parent))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // --- Entities ---

    pub fn parameters(&self) -> &[&'a ParameterRow] {
        &self.parameters
    }

    pub fn overrides_of(&self, parameter_id: &str) -> &[&'a ParameterOverrideRow] {
        self.overrides
            .get(parameter_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn process_data(&self) -> &[&'a ProcessDataRow] {
        &self.process_data
    }

    pub fn events(&self) -> &[&'a EventRow] {
        &self.events
    }

    pub fn assemblies(&self) -> &[&'a AssemblyRow] {
        &self.assemblies
    }

    pub fn members_of(&self, assembly_id: &str) -> &[&'a AssemblyMemberRow] {
        self.members
            .get(assembly_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn connections(&self) -> &[&'a ConnectionRow] {
        &self.connections
    }

    pub fn menus(&self) -> &[&'a MenuRow] {
        &self.menus
    }

    pub fn items_of(&self, menu_id: &str) -> &[&'a MenuItemRow] {
        self.menu_items
            .get(menu_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn role_menus(&self, role: Role) -> &[&'a RoleMenuRow] {
        self.role_menus
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// crates/devdesc-rs/src/mapper.rs

//! Maps a [`DeviceDocument`] onto the relational rows of a [`DeviceSnapshot`].
//!
//! The mapping is pure: it only validates and flattens. Every ordered
//! collection receives the position the parser encountered as its ordinal.
//! Identity keys must be unique within their scope and every text reference
//! must resolve in the device's own pool, otherwise the snapshot is rejected
//! with a `PersistenceError::Constraint` before anything is written.

use crate::document::{
    DatatypeDef, DeviceDocument, MenuItemKind, ParameterEntry, EventEntry, Role, SimpleType,
};
use crate::entity::*;
use crate::error::{DevDescError, ErrorContext, PersistenceErrorKind, Result};
use crate::log::LogContext;
use crate::text::TextRef;
use crate::dd_debug;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Bookkeeping columns that do not come from the document itself.
#[derive(Debug, Clone)]
pub struct MappingMeta {
    pub source_file: String,
    pub checksum: String,
    pub parser_version: String,
    pub ingested_at: DateTime<Utc>,
}

/// Flattens `doc` into a snapshot.
pub fn map_document(doc: &DeviceDocument, meta: &MappingMeta) -> Result<DeviceSnapshot> {
    let key = doc.key();
    let mut mapper = Mapper {
        doc,
        key: key.to_string(),
        source_file: meta.source_file.clone(),
    };

    let mut snapshot = DeviceSnapshot::new(DeviceRow {
        device_key: key.to_string(),
        format: doc.format,
        vendor_id: doc.identity.vendor_id,
        device_id: doc.identity.device_id,
        vendor_name: doc.identity.vendor_name.clone(),
        product_name: doc.identity.product_name.clone(),
        revision: doc.identity.revision.clone(),
        source_file: meta.source_file.clone(),
        checksum: meta.checksum.clone(),
        parser_version: meta.parser_version.clone(),
        ingested_at: meta.ingested_at,
    });

    mapper.map_texts(&mut snapshot)?;
    mapper.map_header(&mut snapshot)?;
    mapper.map_datatypes(&mut snapshot)?;
    mapper.map_parameters(&mut snapshot)?;
    mapper.map_process_data(&mut snapshot)?;
    mapper.map_events(&mut snapshot)?;
    mapper.map_assemblies(&mut snapshot)?;
    mapper.map_connections(&mut snapshot)?;
    mapper.map_menus(&mut snapshot)?;

    let log_ctx = LogContext::device("mapper", &mapper.key);
    dd_debug!(
        log_ctx,
        "Mapped {} parameters, {} events, {} datatypes, {} texts",
        snapshot.parameters.len(),
        snapshot.events.len(),
        snapshot.datatypes.len(),
        snapshot.texts.len()
    );
    Ok(snapshot)
}

struct Mapper<'a> {
    doc: &'a DeviceDocument,
    key: String,
    source_file: String,
}

impl Mapper<'_> {
    fn constraint(&self, path: String, detail: String) -> DevDescError {
        DevDescError::persistence(
            ErrorContext::new(path)
                .with_device(self.key.clone())
                .with_source(self.source_file.clone()),
            PersistenceErrorKind::Constraint(detail),
        )
    }

    /// Validates a text reference and converts it to its column value.
    fn text(&self, text: Option<&TextRef>, path: &str) -> Result<Option<String>> {
        match text {
            None => Ok(None),
            Some(t) if self.doc.texts.contains(t.as_str()) => Ok(Some(t.0.clone())),
            Some(t) => Err(self.constraint(
                path.to_string(),
                format!("text reference '{}' does not resolve in the device's text pool", t.0),
            )),
        }
    }

    fn unique(&self, seen: &mut BTreeSet<String>, key: String, scope: &str) -> Result<()> {
        if !seen.insert(key.clone()) {
            return Err(self.constraint(
                scope.to_string(),
                format!("duplicate identity key '{}' in {}", key, scope),
            ));
        }
        Ok(())
    }

    fn map_texts(&mut self, snapshot: &mut DeviceSnapshot) -> Result<()> {
        let mut seen_langs = BTreeSet::new();
        for (ordinal, lang) in self.doc.texts.languages.iter().enumerate() {
            self.unique(&mut seen_langs, lang.code.clone(), "languages")?;
            snapshot.languages.push(LanguageRow {
                language: lang.code.clone(),
                primary: lang.primary,
                ordinal: ordinal as u32,
            });
            for (text_ordinal, entry) in lang.entries.iter().enumerate() {
                snapshot.texts.push(TextRow {
                    language: lang.code.clone(),
                    text_id: entry.id.clone(),
                    ordinal: text_ordinal as u32,
                    value: entry.value.clone(),
                });
            }
        }
        Ok(())
    }

    fn map_header(&mut self, snapshot: &mut DeviceSnapshot) -> Result<()> {
        for (ordinal, name) in self.doc.sections.iter().enumerate() {
            snapshot.sections.push(SectionRow {
                name: name.clone(),
                ordinal: ordinal as u32,
            });
        }
        for (ordinal, prop) in self.doc.properties.iter().enumerate() {
            snapshot.properties.push(PropertyRow {
                section: prop.section.clone(),
                key: prop.key.clone(),
                value: prop.value.clone(),
                ordinal: ordinal as u32,
            });
        }
        let mut seen = BTreeSet::new();
        for (ordinal, variant) in self.doc.identity.variants.iter().enumerate() {
            let path = format!("variants/{}", variant.product_id);
            self.unique(&mut seen, variant.product_id.clone(), "variants")?;
            snapshot.variants.push(VariantRow {
                ordinal: ordinal as u32,
                product_id: variant.product_id.clone(),
                symbol: variant.symbol.clone(),
                icon: variant.icon.clone(),
                name_text: self.text(variant.name.as_ref(), &path)?,
                description_text: self.text(variant.description.as_ref(), &path)?,
            });
        }
        Ok(())
    }

    fn map_datatypes(&mut self, snapshot: &mut DeviceSnapshot) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (ordinal, dt) in self.doc.datatypes.iter().enumerate() {
            self.unique(&mut seen, dt.id.clone(), "datatypes")?;
            self.map_datatype(snapshot, ordinal as u32, dt)?;
        }
        Ok(())
    }

    fn map_datatype(
        &self,
        snapshot: &mut DeviceSnapshot,
        ordinal: u32,
        dt: &DatatypeDef,
    ) -> Result<()> {
        let path = format!("datatypes/{}", dt.id);
        let element = dt.element.as_ref();
        snapshot.datatypes.push(DatatypeRow {
            id: dt.id.clone(),
            ordinal,
            kind: dt.kind.clone(),
            bit_length: dt.bit_length,
            fixed_length: dt.fixed_length,
            count: dt.count,
            encoding: dt.encoding.clone(),
            inline: dt.is_inline(),
            owner: dt.owner.clone(),
            element_kind: element.map(|e| e.kind.clone()),
            element_bit_length: element.and_then(|e| e.bit_length),
            element_fixed_length: element.and_then(|e| e.fixed_length),
            element_encoding: element.and_then(|e| e.encoding.clone()),
            attributes: dt.attributes.clone(),
        });
        self.map_values(snapshot, &dt.id, None, &dt.values, &path)?;

        // Sibling ordinals are counted per parent; identity is the subindex.
        let mut sibling_counts: BTreeMap<Option<u32>, u32> = BTreeMap::new();
        let mut seen_indices = BTreeSet::new();
        let mut seen_subindices = BTreeSet::new();
        for item in &dt.record_items {
            let item_path = format!("{}/RecordItem[{}]", path, item.subindex);
            if !seen_indices.insert(item.index) {
                return Err(self.constraint(
                    item_path,
                    format!("duplicate record item index {}", item.index),
                ));
            }
            if !seen_subindices.insert((item.parent, item.subindex)) {
                return Err(self.constraint(
                    item_path,
                    format!("duplicate record item subindex {}", item.subindex),
                ));
            }
            if let Some(parent) = item.parent {
                if !seen_indices.contains(&parent) {
                    return Err(self.constraint(
                        item_path,
                        format!("record item parent {} does not precede its child", parent),
                    ));
                }
            }
            let sibling = sibling_counts.entry(item.parent).or_insert(0);
            let simple: Option<&SimpleType> = item.simple.as_ref();
            snapshot.record_items.push(RecordItemRow {
                datatype_id: dt.id.clone(),
                item_index: item.index,
                parent_index: item.parent,
                ordinal: *sibling,
                subindex: item.subindex,
                bit_offset: item.bit_offset,
                simple_kind: simple.map(|s| s.kind.clone()),
                simple_bit_length: simple.and_then(|s| s.bit_length),
                simple_fixed_length: simple.and_then(|s| s.fixed_length),
                simple_encoding: simple.and_then(|s| s.encoding.clone()),
                datatype_ref: item.datatype_ref.clone(),
                name_text: self.text(item.name.as_ref(), &item_path)?,
                description_text: self.text(item.description.as_ref(), &item_path)?,
                access_restriction: item.access_restriction.clone(),
            });
            *sibling += 1;
            if let Some(simple) = simple {
                self.map_values(snapshot, &dt.id, Some(item.index), &simple.values, &item_path)?;
            }
        }
        Ok(())
    }

    fn map_values(
        &self,
        snapshot: &mut DeviceSnapshot,
        datatype_id: &str,
        item_index: Option<u32>,
        values: &[crate::document::DatatypeValue],
        path: &str,
    ) -> Result<()> {
        for (ordinal, value) in values.iter().enumerate() {
            snapshot.datatype_values.push(DatatypeValueRow {
                datatype_id: datatype_id.to_string(),
                item_index,
                ordinal: ordinal as u32,
                kind: value.kind,
                value: value.value.clone(),
                upper: value.upper.clone(),
                name_text: self.text(value.name.as_ref(), path)?,
            });
        }
        Ok(())
    }

    fn map_parameters(&mut self, snapshot: &mut DeviceSnapshot) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (ordinal, entry) in self.doc.parameters.iter().enumerate() {
            let id = entry.id();
            let path = format!("parameters/{}", id);
            self.unique(&mut seen, id.to_string(), "parameters")?;
            let (row, overrides) = match entry {
                ParameterEntry::Full(p) => (
                    ParameterRow {
                        id: p.id.clone(),
                        ordinal: ordinal as u32,
                        variant: entry.variant(),
                        index: p.index,
                        subindex: p.subindex,
                        access: p.access.clone(),
                        datatype_id: p.datatype.clone(),
                        default_value: p.default_value.clone(),
                        min: p.min.clone(),
                        max: p.max.clone(),
                        name_text: self.text(p.name.as_ref(), &path)?,
                        description_text: self.text(p.description.as_ref(), &path)?,
                        unit_text: self.text(p.unit.as_ref(), &path)?,
                        attributes: p.attributes.clone(),
                    },
                    &p.overrides,
                ),
                ParameterEntry::StdRef(r) => (
                    ParameterRow {
                        id: r.id.clone(),
                        ordinal: ordinal as u32,
                        variant: entry.variant(),
                        index: None,
                        subindex: None,
                        access: None,
                        datatype_id: None,
                        default_value: r.default_value.clone(),
                        min: None,
                        max: None,
                        name_text: None,
                        description_text: None,
                        unit_text: None,
                        attributes: r.attributes.clone(),
                    },
                    &r.overrides,
                ),
            };
            snapshot.parameters.push(row);
            for (o_ordinal, o) in overrides.iter().enumerate() {
                snapshot.parameter_overrides.push(ParameterOverrideRow {
                    parameter_id: id.to_string(),
                    ordinal: o_ordinal as u32,
                    element: o.element.clone(),
                    attributes: o.attributes.clone(),
                });
            }
        }
        Ok(())
    }

    fn map_process_data(&mut self, snapshot: &mut DeviceSnapshot) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (ordinal, pd) in self.doc.process_data.iter().enumerate() {
            let path = format!("process_data/{}", pd.id);
            self.unique(&mut seen, pd.id.clone(), "process_data")?;
            snapshot.process_data.push(ProcessDataRow {
                id: pd.id.clone(),
                ordinal: ordinal as u32,
                group_id: pd.group_id.clone(),
                direction: pd.direction,
                bit_length: pd.bit_length,
                datatype_id: pd.datatype.clone(),
                name_text: self.text(pd.name.as_ref(), &path)?,
                condition_variable: pd.condition.as_ref().map(|c| c.variable_id.clone()),
                condition_value: pd.condition.as_ref().map(|c| c.value.clone()),
            });
        }
        Ok(())
    }

    fn map_events(&mut self, snapshot: &mut DeviceSnapshot) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (ordinal, event) in self.doc.events.iter().enumerate() {
            let path = format!("events/{}", event.code());
            self.unique(&mut seen, event.code().to_string(), "events")?;
            let row = match event {
                EventEntry::Full(e) => EventRow {
                    code: e.code.clone(),
                    ordinal: ordinal as u32,
                    variant: event.variant(),
                    code_value: e.code_value,
                    event_type: e.event_type.clone(),
                    mode: e.mode.clone(),
                    name_text: self.text(e.name.as_ref(), &path)?,
                    description_text: self.text(e.description.as_ref(), &path)?,
                    name_synthesized: e.name_synthesized,
                    attributes: Vec::new(),
                },
                EventEntry::StdRef(r) => EventRow {
                    code: r.code.clone(),
                    ordinal: ordinal as u32,
                    variant: event.variant(),
                    code_value: r.code_value,
                    event_type: None,
                    mode: None,
                    name_text: None,
                    description_text: None,
                    name_synthesized: false,
                    attributes: r.attributes.clone(),
                },
            };
            snapshot.events.push(row);
        }
        Ok(())
    }

    fn map_assemblies(&mut self, snapshot: &mut DeviceSnapshot) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (ordinal, assembly) in self.doc.assemblies.iter().enumerate() {
            let path = format!("assemblies/{}", assembly.id);
            self.unique(&mut seen, assembly.id.clone(), "assemblies")?;
            snapshot.assemblies.push(AssemblyRow {
                id: assembly.id.clone(),
                ordinal: ordinal as u32,
                name_text: self.text(assembly.name.as_ref(), &path)?,
                path: assembly.path.clone(),
                size: assembly.size.clone(),
                descriptor: assembly.descriptor.clone(),
                reserved: assembly.reserved.clone(),
            });
            for (m_ordinal, member) in assembly.members.iter().enumerate() {
                snapshot.assembly_members.push(AssemblyMemberRow {
                    assembly_id: assembly.id.clone(),
                    ordinal: m_ordinal as u32,
                    bit_size: member.bit_size,
                    bit_offset: member.bit_offset,
                    reference: member.reference.clone(),
                });
            }
        }
        Ok(())
    }

    fn map_connections(&mut self, snapshot: &mut DeviceSnapshot) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (ordinal, conn) in self.doc.connections.iter().enumerate() {
            let path = format!("connections/{}", conn.id);
            self.unique(&mut seen, conn.id.clone(), "connections")?;
            snapshot.connections.push(ConnectionRow {
                id: conn.id.clone(),
                ordinal: ordinal as u32,
                direction: conn.direction,
                ot_size: conn.ot_size,
                to_size: conn.to_size,
                rpi: conn.rpi.clone(),
                name_text: self.text(conn.name.as_ref(), &path)?,
                help_text: self.text(conn.help.as_ref(), &path)?,
                path: conn.path.clone(),
                fields: conn.fields.clone(),
            });
        }
        Ok(())
    }

    fn map_menus(&mut self, snapshot: &mut DeviceSnapshot) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (ordinal, menu) in self.doc.menus.iter().enumerate() {
            let path = format!("menus/{}", menu.id);
            self.unique(&mut seen, menu.id.clone(), "menus")?;
            snapshot.menus.push(MenuRow {
                id: menu.id.clone(),
                ordinal: ordinal as u32,
                name_text: self.text(menu.name.as_ref(), &path)?,
            });
            let mut seen_items = BTreeSet::new();
            for (i_ordinal, item) in menu.items.iter().enumerate() {
                let item_key = format!(
                    "{}:{}:{}:{}",
                    item.kind.as_str(),
                    item.target,
                    item.subindex.map(|s| s.to_string()).unwrap_or_default(),
                    item.button.as_ref().map(|b| b.value.as_str()).unwrap_or("")
                );
                self.unique(&mut seen_items, item_key, &path)?;
                snapshot.menu_items.push(MenuItemRow {
                    menu_id: menu.id.clone(),
                    ordinal: i_ordinal as u32,
                    kind: item.kind,
                    target: item.target.clone(),
                    subindex: item.subindex,
                    access_restriction: item.access_restriction.clone(),
                    display_format: item.display_format.clone(),
                    unit_code: item.unit_code.clone(),
                    button_value: item.button.as_ref().map(|b| b.value.clone()),
                    button_description_text: self.text(
                        item.button.as_ref().and_then(|b| b.description.as_ref()),
                        &path,
                    )?,
                });
            }
        }

        for set in &self.doc.role_menus {
            for (ordinal, entry) in set.entries.iter().enumerate() {
                snapshot.role_menus.push(RoleMenuRow {
                    role: set.role,
                    slot: entry.slot.clone(),
                    menu_id: entry.menu_id.clone(),
                    ordinal: ordinal as u32,
                });
            }
        }
        snapshot.menu_roles = compute_menu_roles(self.doc);
        Ok(())
    }
}

/// Computes which menus each role can reach, following `MenuRef` items from
/// the role's menu set. Cycles in the menu graph are tolerated.
pub fn compute_menu_roles(doc: &DeviceDocument) -> Vec<MenuRoleRow> {
    let submenus: BTreeMap<&str, Vec<&str>> = doc
        .menus
        .iter()
        .map(|m| {
            let refs = m
                .items
                .iter()
                .filter(|i| i.kind == MenuItemKind::MenuRef)
                .map(|i| i.target.as_str())
                .collect();
            (m.id.as_str(), refs)
        })
        .collect();

    let mut rows = BTreeSet::new();
    for role in Role::ALL {
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = doc
            .role_menus
            .iter()
            .filter(|s| s.role == role)
            .flat_map(|s| s.entries.iter().map(|e| e.menu_id.as_str()))
            .collect();
        while let Some(menu_id) = queue.pop_front() {
            if !visited.insert(menu_id) {
                continue;
            }
            if let Some(children) = submenus.get(menu_id) {
                queue.extend(children.iter().copied());
            }
        }
        for menu_id in visited {
            // Only menus that exist are recorded.
            if submenus.contains_key(menu_id) {
                rows.insert(MenuRoleRow {
                    menu_id: menu_id.to_string(),
                    role,
                });
            }
        }
    }
    rows.into_iter().collect()
}

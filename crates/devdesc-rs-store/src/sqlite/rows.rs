// crates/devdesc-rs-store/src/sqlite/rows.rs

//! Column mapping of the child row types.

use super::conversion_error;
use devdesc_rs::document::{
    ConnectionDirection, Direction, EntryVariant, MenuItemKind, Role, ValueKind,
};
use devdesc_rs::entity::{
    AssemblyMemberRow, AssemblyRow, ConnectionRow, DatatypeRow, DatatypeValueRow, EventRow,
    LanguageRow, MenuItemRow, MenuRoleRow, MenuRow, ParameterOverrideRow, ParameterRow,
    ProcessDataRow, PropertyRow, RecordItemRow, RoleMenuRow, SectionRow, TextRow, VariantRow,
};
use rusqlite::types::Type;
use rusqlite::{CachedStatement, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A row type stored in its own child table.
///
/// `COLUMNS` lists the row's own columns, after `device_key` and `position`.
/// `bind` receives them as `?3..`, `read` gets them back from index 0.
pub(crate) trait TableRow: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize>;

    fn read(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (3..Self::COLUMNS.len() + 3).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} (device_key, position, {}) VALUES (?1, ?2, {})",
            Self::TABLE,
            Self::COLUMNS.join(", "),
            placeholders.join(", ")
        )
    }

    fn select_sql() -> String {
        format!(
            "SELECT {} FROM {} WHERE device_key = ?1 ORDER BY position",
            Self::COLUMNS.join(", "),
            Self::TABLE
        )
    }
}

// --- Column helpers ---

fn json_text<T: Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn tag_column<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, format!("unknown tag '{}'", raw)))
}

// --- Header ---

impl TableRow for PropertyRow {
    const TABLE: &'static str = "properties";
    const COLUMNS: &'static [&'static str] = &["section", "\"key\"", "value", "ordinal"];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![key, position, self.section, self.key, self.value, self.ordinal])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            section: row.get(0)?,
            key: row.get(1)?,
            value: row.get(2)?,
            ordinal: row.get(3)?,
        })
    }
}

impl TableRow for SectionRow {
    const TABLE: &'static str = "sections";
    const COLUMNS: &'static [&'static str] = &["name", "ordinal"];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![key, position, self.name, self.ordinal])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            ordinal: row.get(1)?,
        })
    }
}

impl TableRow for VariantRow {
    const TABLE: &'static str = "variants";
    const COLUMNS: &'static [&'static str] = &[
        "ordinal",
        "product_id",
        "symbol",
        "icon",
        "name_text",
        "description_text",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.ordinal,
            self.product_id,
            self.symbol,
            self.icon,
            self.name_text,
            self.description_text,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ordinal: row.get(0)?,
            product_id: row.get(1)?,
            symbol: row.get(2)?,
            icon: row.get(3)?,
            name_text: row.get(4)?,
            description_text: row.get(5)?,
        })
    }
}

// --- Datatypes ---

impl TableRow for DatatypeRow {
    const TABLE: &'static str = "datatypes";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "ordinal",
        "kind",
        "bit_length",
        "fixed_length",
        "count",
        "encoding",
        "inline",
        "owner",
        "element_kind",
        "element_bit_length",
        "element_fixed_length",
        "element_encoding",
        "attributes",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.id,
            self.ordinal,
            self.kind,
            self.bit_length,
            self.fixed_length,
            self.count,
            self.encoding,
            self.inline,
            self.owner,
            self.element_kind,
            self.element_bit_length,
            self.element_fixed_length,
            self.element_encoding,
            json_text(&self.attributes)?,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ordinal: row.get(1)?,
            kind: row.get(2)?,
            bit_length: row.get(3)?,
            fixed_length: row.get(4)?,
            count: row.get(5)?,
            encoding: row.get(6)?,
            inline: row.get(7)?,
            owner: row.get(8)?,
            element_kind: row.get(9)?,
            element_bit_length: row.get(10)?,
            element_fixed_length: row.get(11)?,
            element_encoding: row.get(12)?,
            attributes: json_column(row, 13)?,
        })
    }
}

impl TableRow for DatatypeValueRow {
    const TABLE: &'static str = "datatype_values";
    const COLUMNS: &'static [&'static str] = &[
        "datatype_id",
        "item_index",
        "ordinal",
        "kind",
        "value",
        "upper",
        "name_text",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.datatype_id,
            self.item_index,
            self.ordinal,
            self.kind.as_str(),
            self.value,
            self.upper,
            self.name_text,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            datatype_id: row.get(0)?,
            item_index: row.get(1)?,
            ordinal: row.get(2)?,
            kind: tag_column(row, 3, ValueKind::parse)?,
            value: row.get(4)?,
            upper: row.get(5)?,
            name_text: row.get(6)?,
        })
    }
}

impl TableRow for RecordItemRow {
    const TABLE: &'static str = "record_items";
    const COLUMNS: &'static [&'static str] = &[
        "datatype_id",
        "item_index",
        "parent_index",
        "ordinal",
        "subindex",
        "bit_offset",
        "simple_kind",
        "simple_bit_length",
        "simple_fixed_length",
        "simple_encoding",
        "datatype_ref",
        "name_text",
        "description_text",
        "access_restriction",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.datatype_id,
            self.item_index,
            self.parent_index,
            self.ordinal,
            self.subindex,
            self.bit_offset,
            self.simple_kind,
            self.simple_bit_length,
            self.simple_fixed_length,
            self.simple_encoding,
            self.datatype_ref,
            self.name_text,
            self.description_text,
            self.access_restriction,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            datatype_id: row.get(0)?,
            item_index: row.get(1)?,
            parent_index: row.get(2)?,
            ordinal: row.get(3)?,
            subindex: row.get(4)?,
            bit_offset: row.get(5)?,
            simple_kind: row.get(6)?,
            simple_bit_length: row.get(7)?,
            simple_fixed_length: row.get(8)?,
            simple_encoding: row.get(9)?,
            datatype_ref: row.get(10)?,
            name_text: row.get(11)?,
            description_text: row.get(12)?,
            access_restriction: row.get(13)?,
        })
    }
}

// --- Parameters, process data, events ---

impl TableRow for ParameterRow {
    const TABLE: &'static str = "parameters";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "ordinal",
        "variant",
        "\"index\"",
        "subindex",
        "access",
        "datatype_id",
        "default_value",
        "min",
        "max",
        "name_text",
        "description_text",
        "unit_text",
        "attributes",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.id,
            self.ordinal,
            self.variant.as_str(),
            self.index,
            self.subindex,
            self.access,
            self.datatype_id,
            self.default_value,
            self.min,
            self.max,
            self.name_text,
            self.description_text,
            self.unit_text,
            json_text(&self.attributes)?,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ordinal: row.get(1)?,
            variant: tag_column(row, 2, EntryVariant::parse)?,
            index: row.get(3)?,
            subindex: row.get(4)?,
            access: row.get(5)?,
            datatype_id: row.get(6)?,
            default_value: row.get(7)?,
            min: row.get(8)?,
            max: row.get(9)?,
            name_text: row.get(10)?,
            description_text: row.get(11)?,
            unit_text: row.get(12)?,
            attributes: json_column(row, 13)?,
        })
    }
}

impl TableRow for ParameterOverrideRow {
    const TABLE: &'static str = "parameter_overrides";
    const COLUMNS: &'static [&'static str] = &["parameter_id", "ordinal", "element", "attributes"];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.parameter_id,
            self.ordinal,
            self.element,
            json_text(&self.attributes)?,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            parameter_id: row.get(0)?,
            ordinal: row.get(1)?,
            element: row.get(2)?,
            attributes: json_column(row, 3)?,
        })
    }
}

impl TableRow for ProcessDataRow {
    const TABLE: &'static str = "process_data";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "ordinal",
        "group_id",
        "direction",
        "bit_length",
        "datatype_id",
        "name_text",
        "condition_variable",
        "condition_value",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.id,
            self.ordinal,
            self.group_id,
            self.direction.as_str(),
            self.bit_length,
            self.datatype_id,
            self.name_text,
            self.condition_variable,
            self.condition_value,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ordinal: row.get(1)?,
            group_id: row.get(2)?,
            direction: tag_column(row, 3, Direction::parse)?,
            bit_length: row.get(4)?,
            datatype_id: row.get(5)?,
            name_text: row.get(6)?,
            condition_variable: row.get(7)?,
            condition_value: row.get(8)?,
        })
    }
}

impl TableRow for EventRow {
    const TABLE: &'static str = "events";
    const COLUMNS: &'static [&'static str] = &[
        "code",
        "ordinal",
        "variant",
        "code_value",
        "event_type",
        "mode",
        "name_text",
        "description_text",
        "name_synthesized",
        "attributes",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.code,
            self.ordinal,
            self.variant.as_str(),
            self.code_value,
            self.event_type,
            self.mode,
            self.name_text,
            self.description_text,
            self.name_synthesized,
            json_text(&self.attributes)?,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            code: row.get(0)?,
            ordinal: row.get(1)?,
            variant: tag_column(row, 2, EntryVariant::parse)?,
            code_value: row.get(3)?,
            event_type: row.get(4)?,
            mode: row.get(5)?,
            name_text: row.get(6)?,
            description_text: row.get(7)?,
            name_synthesized: row.get(8)?,
            attributes: json_column(row, 9)?,
        })
    }
}

// --- Assemblies and connections ---

impl TableRow for AssemblyRow {
    const TABLE: &'static str = "assemblies";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "ordinal",
        "name_text",
        "path",
        "size",
        "descriptor",
        "reserved",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.id,
            self.ordinal,
            self.name_text,
            self.path,
            self.size,
            self.descriptor,
            json_text(&self.reserved)?,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ordinal: row.get(1)?,
            name_text: row.get(2)?,
            path: row.get(3)?,
            size: row.get(4)?,
            descriptor: row.get(5)?,
            reserved: json_column(row, 6)?,
        })
    }
}

impl TableRow for AssemblyMemberRow {
    const TABLE: &'static str = "assembly_members";
    const COLUMNS: &'static [&'static str] =
        &["assembly_id", "ordinal", "bit_size", "bit_offset", "reference"];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.assembly_id,
            self.ordinal,
            self.bit_size,
            self.bit_offset,
            self.reference,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            assembly_id: row.get(0)?,
            ordinal: row.get(1)?,
            bit_size: row.get(2)?,
            bit_offset: row.get(3)?,
            reference: row.get(4)?,
        })
    }
}

impl TableRow for ConnectionRow {
    const TABLE: &'static str = "connections";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "ordinal",
        "direction",
        "ot_size",
        "to_size",
        "rpi",
        "name_text",
        "help_text",
        "path",
        "fields",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.id,
            self.ordinal,
            self.direction.as_str(),
            self.ot_size,
            self.to_size,
            self.rpi,
            self.name_text,
            self.help_text,
            self.path,
            json_text(&self.fields)?,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ordinal: row.get(1)?,
            direction: tag_column(row, 2, ConnectionDirection::parse)?,
            ot_size: row.get(3)?,
            to_size: row.get(4)?,
            rpi: row.get(5)?,
            name_text: row.get(6)?,
            help_text: row.get(7)?,
            path: row.get(8)?,
            fields: json_column(row, 9)?,
        })
    }
}

// --- Menus ---

impl TableRow for MenuRow {
    const TABLE: &'static str = "menus";
    const COLUMNS: &'static [&'static str] = &["id", "ordinal", "name_text"];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![key, position, self.id, self.ordinal, self.name_text])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ordinal: row.get(1)?,
            name_text: row.get(2)?,
        })
    }
}

impl TableRow for MenuItemRow {
    const TABLE: &'static str = "menu_items";
    const COLUMNS: &'static [&'static str] = &[
        "menu_id",
        "ordinal",
        "kind",
        "target",
        "subindex",
        "access_restriction",
        "display_format",
        "unit_code",
        "button_value",
        "button_description_text",
    ];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.menu_id,
            self.ordinal,
            self.kind.as_str(),
            self.target,
            self.subindex,
            self.access_restriction,
            self.display_format,
            self.unit_code,
            self.button_value,
            self.button_description_text,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            menu_id: row.get(0)?,
            ordinal: row.get(1)?,
            kind: tag_column(row, 2, MenuItemKind::parse)?,
            target: row.get(3)?,
            subindex: row.get(4)?,
            access_restriction: row.get(5)?,
            display_format: row.get(6)?,
            unit_code: row.get(7)?,
            button_value: row.get(8)?,
            button_description_text: row.get(9)?,
        })
    }
}

impl TableRow for RoleMenuRow {
    const TABLE: &'static str = "role_menus";
    const COLUMNS: &'static [&'static str] = &["role", "slot", "menu_id", "ordinal"];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![
            key,
            position,
            self.role.as_str(),
            self.slot,
            self.menu_id,
            self.ordinal,
        ])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            role: tag_column(row, 0, Role::parse)?,
            slot: row.get(1)?,
            menu_id: row.get(2)?,
            ordinal: row.get(3)?,
        })
    }
}

impl TableRow for MenuRoleRow {
    const TABLE: &'static str = "menu_roles";
    const COLUMNS: &'static [&'static str] = &["menu_id", "role"];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![key, position, self.menu_id, self.role.as_str()])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            menu_id: row.get(0)?,
            role: tag_column(row, 1, Role::parse)?,
        })
    }
}

// --- Texts ---

impl TableRow for LanguageRow {
    const TABLE: &'static str = "languages";
    const COLUMNS: &'static [&'static str] = &["language", "\"primary\"", "ordinal"];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![key, position, self.language, self.primary, self.ordinal])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            language: row.get(0)?,
            primary: row.get(1)?,
            ordinal: row.get(2)?,
        })
    }
}

impl TableRow for TextRow {
    const TABLE: &'static str = "texts";
    const COLUMNS: &'static [&'static str] = &["language", "text_id", "ordinal", "value"];

    fn bind(&self, stmt: &mut CachedStatement<'_>, key: &str, position: i64) -> rusqlite::Result<usize> {
        stmt.execute(params![key, position, self.language, self.text_id, self.ordinal, self.value])
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            language: row.get(0)?,
            text_id: row.get(1)?,
            ordinal: row.get(2)?,
            value: row.get(3)?,
        })
    }
}

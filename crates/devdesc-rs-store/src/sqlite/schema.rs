// crates/devdesc-rs-store/src/sqlite/schema.rs

//! Table layout of the SQLite backend.
//!
//! `devices` holds the identity columns. Every child row type has its own
//! table with one typed column per row field, cascading from `devices`.
//! `position` is the row's place in the snapshot; `ordinal` is the document
//! order the builders use. Identity keys are `UNIQUE` per device. List-valued
//! fields (`attributes`, `reserved`, `fields`) are JSON arrays. `scores` has
//! no foreign key, so the history outlives re-ingestion.

/// Child tables, named as in `DeviceSnapshot::table_counts`.
pub(crate) const CHILD_TABLES: [&str; 19] = [
    "properties",
    "sections",
    "variants",
    "datatypes",
    "datatype_values",
    "record_items",
    "parameters",
    "parameter_overrides",
    "process_data",
    "events",
    "assemblies",
    "assembly_members",
    "connections",
    "menus",
    "menu_items",
    "role_menus",
    "menu_roles",
    "languages",
    "texts",
];

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS devices (
    device_key     TEXT PRIMARY KEY,
    format         TEXT NOT NULL,
    vendor_id      INTEGER NOT NULL,
    device_id      INTEGER NOT NULL,
    vendor_name    TEXT NOT NULL,
    product_name   TEXT NOT NULL,
    revision       TEXT NOT NULL,
    source_file    TEXT NOT NULL,
    checksum       TEXT NOT NULL,
    parser_version TEXT NOT NULL,
    ingested_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_devices_identity ON devices(format, vendor_id, device_id);

CREATE TABLE IF NOT EXISTS sources (
    device_key TEXT PRIMARY KEY,
    file_name  TEXT NOT NULL,
    format     TEXT NOT NULL,
    bytes      BLOB NOT NULL,
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS properties (
    device_key TEXT NOT NULL,
    position   INTEGER NOT NULL,
    section    TEXT NOT NULL,
    "key"      TEXT NOT NULL,
    value      TEXT NOT NULL,
    ordinal    INTEGER NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, ordinal),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS sections (
    device_key TEXT NOT NULL,
    position   INTEGER NOT NULL,
    name       TEXT NOT NULL,
    ordinal    INTEGER NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, ordinal),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS variants (
    device_key       TEXT NOT NULL,
    position         INTEGER NOT NULL,
    ordinal          INTEGER NOT NULL,
    product_id       TEXT NOT NULL,
    symbol           TEXT,
    icon             TEXT,
    name_text        TEXT,
    description_text TEXT,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, product_id),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS datatypes (
    device_key           TEXT NOT NULL,
    position             INTEGER NOT NULL,
    id                   TEXT NOT NULL,
    ordinal              INTEGER NOT NULL,
    kind                 TEXT NOT NULL,
    bit_length           INTEGER,
    fixed_length         INTEGER,
    count                INTEGER,
    encoding             TEXT,
    inline               INTEGER NOT NULL,
    owner                TEXT,
    element_kind         TEXT,
    element_bit_length   INTEGER,
    element_fixed_length INTEGER,
    element_encoding     TEXT,
    attributes           TEXT NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, id),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS datatype_values (
    device_key  TEXT NOT NULL,
    position    INTEGER NOT NULL,
    datatype_id TEXT NOT NULL,
    item_index  INTEGER,
    ordinal     INTEGER NOT NULL,
    kind        TEXT NOT NULL,
    value       TEXT NOT NULL,
    upper       TEXT,
    name_text   TEXT,
    PRIMARY KEY (device_key, position),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);
CREATE UNIQUE INDEX IF NOT EXISTS uq_datatype_values_order
    ON datatype_values(device_key, datatype_id, IFNULL(item_index, -1), ordinal);

CREATE TABLE IF NOT EXISTS record_items (
    device_key          TEXT NOT NULL,
    position            INTEGER NOT NULL,
    datatype_id         TEXT NOT NULL,
    item_index          INTEGER NOT NULL,
    parent_index        INTEGER,
    ordinal             INTEGER NOT NULL,
    subindex            INTEGER NOT NULL,
    bit_offset          INTEGER NOT NULL,
    simple_kind         TEXT,
    simple_bit_length   INTEGER,
    simple_fixed_length INTEGER,
    simple_encoding     TEXT,
    datatype_ref        TEXT,
    name_text           TEXT,
    description_text    TEXT,
    access_restriction  TEXT,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, datatype_id, item_index),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);
CREATE UNIQUE INDEX IF NOT EXISTS uq_record_items_subindex
    ON record_items(device_key, datatype_id, IFNULL(parent_index, -1), subindex);

CREATE TABLE IF NOT EXISTS parameters (
    device_key       TEXT NOT NULL,
    position         INTEGER NOT NULL,
    id               TEXT NOT NULL,
    ordinal          INTEGER NOT NULL,
    variant          TEXT NOT NULL CHECK (variant IN ('full', 'std_ref')),
    "index"          INTEGER,
    subindex         INTEGER,
    access           TEXT,
    datatype_id      TEXT,
    default_value    TEXT,
    min              TEXT,
    max              TEXT,
    name_text        TEXT,
    description_text TEXT,
    unit_text        TEXT,
    attributes       TEXT NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, id),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS parameter_overrides (
    device_key   TEXT NOT NULL,
    position     INTEGER NOT NULL,
    parameter_id TEXT NOT NULL,
    ordinal      INTEGER NOT NULL,
    element      TEXT NOT NULL,
    attributes   TEXT NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, parameter_id, ordinal),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS process_data (
    device_key         TEXT NOT NULL,
    position           INTEGER NOT NULL,
    id                 TEXT NOT NULL,
    ordinal            INTEGER NOT NULL,
    group_id           TEXT NOT NULL,
    direction          TEXT NOT NULL,
    bit_length         INTEGER,
    datatype_id        TEXT,
    name_text          TEXT,
    condition_variable TEXT,
    condition_value    TEXT,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, id),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS events (
    device_key       TEXT NOT NULL,
    position         INTEGER NOT NULL,
    code             TEXT NOT NULL,
    ordinal          INTEGER NOT NULL,
    variant          TEXT NOT NULL CHECK (variant IN ('full', 'std_ref')),
    code_value       INTEGER NOT NULL,
    event_type       TEXT,
    mode             TEXT,
    name_text        TEXT,
    description_text TEXT,
    name_synthesized INTEGER NOT NULL,
    attributes       TEXT NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, code),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS assemblies (
    device_key TEXT NOT NULL,
    position   INTEGER NOT NULL,
    id         TEXT NOT NULL,
    ordinal    INTEGER NOT NULL,
    name_text  TEXT,
    path       TEXT,
    size       TEXT,
    descriptor TEXT,
    reserved   TEXT NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, id),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS assembly_members (
    device_key  TEXT NOT NULL,
    position    INTEGER NOT NULL,
    assembly_id TEXT NOT NULL,
    ordinal     INTEGER NOT NULL,
    bit_size    INTEGER,
    bit_offset  INTEGER NOT NULL,
    reference   TEXT NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, assembly_id, ordinal),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS connections (
    device_key TEXT NOT NULL,
    position   INTEGER NOT NULL,
    id         TEXT NOT NULL,
    ordinal    INTEGER NOT NULL,
    direction  TEXT NOT NULL,
    ot_size    INTEGER,
    to_size    INTEGER,
    rpi        TEXT,
    name_text  TEXT,
    help_text  TEXT,
    path       TEXT,
    fields     TEXT NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, id),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS menus (
    device_key TEXT NOT NULL,
    position   INTEGER NOT NULL,
    id         TEXT NOT NULL,
    ordinal    INTEGER NOT NULL,
    name_text  TEXT,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, id),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS menu_items (
    device_key              TEXT NOT NULL,
    position                INTEGER NOT NULL,
    menu_id                 TEXT NOT NULL,
    ordinal                 INTEGER NOT NULL,
    kind                    TEXT NOT NULL,
    target                  TEXT NOT NULL,
    subindex                INTEGER,
    access_restriction      TEXT,
    display_format          TEXT,
    unit_code               TEXT,
    button_value            TEXT,
    button_description_text TEXT,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, menu_id, ordinal),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS role_menus (
    device_key TEXT NOT NULL,
    position   INTEGER NOT NULL,
    role       TEXT NOT NULL,
    slot       TEXT NOT NULL,
    menu_id    TEXT NOT NULL,
    ordinal    INTEGER NOT NULL,
    PRIMARY KEY (device_key, position),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS menu_roles (
    device_key TEXT NOT NULL,
    position   INTEGER NOT NULL,
    menu_id    TEXT NOT NULL,
    role       TEXT NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, menu_id, role),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS languages (
    device_key TEXT NOT NULL,
    position   INTEGER NOT NULL,
    language   TEXT NOT NULL,
    "primary"  INTEGER NOT NULL,
    ordinal    INTEGER NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, language),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS texts (
    device_key TEXT NOT NULL,
    position   INTEGER NOT NULL,
    language   TEXT NOT NULL,
    text_id    TEXT NOT NULL,
    ordinal    INTEGER NOT NULL,
    value      TEXT NOT NULL,
    PRIMARY KEY (device_key, position),
    UNIQUE (device_key, language, ordinal),
    FOREIGN KEY (device_key) REFERENCES devices(device_key) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS scores (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    device_key     TEXT NOT NULL,
    score          REAL NOT NULL,
    missing        INTEGER NOT NULL,
    extra          INTEGER NOT NULL,
    value_changed  INTEGER NOT NULL,
    order_changed  INTEGER NOT NULL,
    parser_version TEXT NOT NULL,
    timestamp      TEXT NOT NULL,
    incomplete     INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scores_device ON scores(device_key);
"#;

pub(crate) const SCHEMA_VERSION: i64 = 2;

/// The full `CREATE` script.
pub(crate) fn create_script() -> &'static str {
    SCHEMA
}

#[cfg(test)]
mod tests {
    use super::*;
    use devdesc_rs::document::DocumentFormat;
    use devdesc_rs::entity::{DeviceRow, DeviceSnapshot};

    #[test]
    fn test_child_tables_follow_snapshot_counts() {
        let snapshot = DeviceSnapshot::new(DeviceRow {
            device_key: "eds:1:2:1.0".into(),
            format: DocumentFormat::Eds,
            vendor_id: 1,
            device_id: 2,
            vendor_name: String::new(),
            product_name: String::new(),
            revision: "1.0".into(),
            source_file: "a.eds".into(),
            checksum: String::new(),
            parser_version: String::new(),
            ingested_at: chrono::Utc::now(),
        });
        let names: Vec<&str> = snapshot.table_counts().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, CHILD_TABLES.to_vec());
        // Every child table plus `sources` cascades from `devices`.
        assert_eq!(create_script().matches("ON DELETE CASCADE").count(), 20);
        for table in CHILD_TABLES {
            assert!(
                create_script().contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "no table for {}",
                table
            );
        }
    }
}

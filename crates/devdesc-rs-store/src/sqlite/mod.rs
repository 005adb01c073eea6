// crates/devdesc-rs-store/src/sqlite/mod.rs

//! SQLite backend.
//!
//! `replace_device` deletes the device row (its children cascade), inserts
//! the new snapshot and re-counts every child table inside one transaction.
//! A count that does not match the snapshot aborts the transaction with
//! `PersistenceError::PartialWrite`, leaving the previous snapshot in place.
//! A row that breaks an identity `UNIQUE` constraint aborts it with
//! `PersistenceError::Constraint`.

mod rows;
mod schema;

use crate::locks::{BusyPolicy, DeviceLocks};
use crate::store::SnapshotStore;
use chrono::{DateTime, SecondsFormat, Utc};
use devdesc_rs::document::DocumentFormat;
use devdesc_rs::entity::{DeviceRow, DeviceSnapshot, DiffCounts, QualityScore, SourceDocument};
use devdesc_rs::error::{DevDescError, ErrorContext, PersistenceErrorKind, Result};
use devdesc_rs::log::LogContext;
use devdesc_rs::{dd_debug, dd_info};
use rows::TableRow;
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, params};
use schema::{CHILD_TABLES, SCHEMA_VERSION, create_script};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// --- Error conversion ---

fn store_context(device_key: &str) -> ErrorContext {
    let context = ErrorContext::new("store");
    if device_key.is_empty() {
        context
    } else {
        context.with_device(device_key)
    }
}

/// Converts backend results into pipeline errors scoped to a device.
trait IntoStoreError<T> {
    fn store_err(self, device_key: &str) -> Result<T>;
}

impl<T> IntoStoreError<T> for rusqlite::Result<T> {
    fn store_err(self, device_key: &str) -> Result<T> {
        self.map_err(|err| {
            let kind = match &err {
                rusqlite::Error::SqliteFailure(e, _)
                    if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
                {
                    PersistenceErrorKind::Busy
                }
                rusqlite::Error::SqliteFailure(e, message)
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    PersistenceErrorKind::Constraint(
                        message.clone().unwrap_or_else(|| e.to_string()),
                    )
                }
                _ => PersistenceErrorKind::Backend(err.to_string()),
            };
            DevDescError::persistence(store_context(device_key), kind)
        })
    }
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

fn format_column(column: usize, raw: String) -> rusqlite::Result<DocumentFormat> {
    DocumentFormat::parse(&raw)
        .ok_or_else(|| conversion_error(column, format!("unknown document format '{}'", raw)))
}

fn timestamp_column(column: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, format!("bad timestamp '{}': {}", raw, e)))
}

fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// --- Store ---

pub struct SqliteStore {
    conn: Mutex<Connection>,
    locks: DeviceLocks,
}

impl SqliteStore {
    /// Opens (and if needed creates) a database file.
    pub fn open(path: impl AsRef<Path>, policy: BusyPolicy) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).store_err("")?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").store_err("")?;
        Self::init(conn, policy)
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory(policy: BusyPolicy) -> Result<Self> {
        let conn = Connection::open_in_memory().store_err("")?;
        Self::init(conn, policy)
    }

    fn init(conn: Connection, policy: BusyPolicy) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).store_err("")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;").store_err("")?;
        conn.execute_batch(create_script()).store_err("")?;

        let version: Option<i64> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()
            .store_err("")?;
        match version {
            None => {
                conn.execute("INSERT INTO schema_version (version) VALUES (?1)", params![SCHEMA_VERSION])
                    .store_err("")?;
            }
            Some(v) if v != SCHEMA_VERSION => {
                return Err(DevDescError::persistence(
                    ErrorContext::new("store"),
                    PersistenceErrorKind::Backend(format!(
                        "database schema version {} is not supported (expected {})",
                        v, SCHEMA_VERSION
                    )),
                ));
            }
            Some(_) => {}
        }

        Ok(Self {
            conn: Mutex::new(conn),
            locks: DeviceLocks::new(policy),
        })
    }

    pub fn locks(&self) -> &DeviceLocks {
        &self.locks
    }

    // A panic while holding the connection drops its open transaction, which
    // rolls it back, so the connection is still consistent.
    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Row helpers ---

fn insert_device(tx: &Transaction<'_>, device: &DeviceRow) -> Result<()> {
    tx.execute(
        "INSERT INTO devices (device_key, format, vendor_id, device_id, vendor_name, product_name,
                              revision, source_file, checksum, parser_version, ingested_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            device.device_key,
            device.format.as_str(),
            device.vendor_id,
            device.device_id,
            device.vendor_name,
            device.product_name,
            device.revision,
            device.source_file,
            device.checksum,
            device.parser_version,
            timestamp_text(&device.ingested_at),
        ],
    )
    .store_err(&device.device_key)?;
    Ok(())
}

fn insert_rows<T: TableRow>(tx: &Transaction<'_>, key: &str, rows: &[T]) -> Result<()> {
    let mut stmt = tx.prepare_cached(&T::insert_sql()).store_err(key)?;
    for (position, row) in rows.iter().enumerate() {
        row.bind(&mut stmt, key, position as i64).store_err(key)?;
    }
    Ok(())
}

fn load_rows<T: TableRow>(conn: &Connection, key: &str) -> Result<Vec<T>> {
    let mut stmt = conn.prepare_cached(&T::select_sql()).store_err(key)?;
    stmt.query_map(params![key], |row| T::read(row))
        .store_err(key)?
        .collect::<rusqlite::Result<Vec<T>>>()
        .store_err(key)
}

/// Every child table must hold exactly as many rows as the snapshot.
fn verify_counts(tx: &Transaction<'_>, snapshot: &DeviceSnapshot) -> Result<()> {
    let key = snapshot.key();
    for (table, expected) in snapshot.table_counts() {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE device_key = ?1", table);
        let actual: i64 = tx.query_row(&sql, params![key], |row| row.get(0)).store_err(key)?;
        if actual != expected as i64 {
            return Err(DevDescError::persistence(
                store_context(key),
                PersistenceErrorKind::PartialWrite {
                    table,
                    expected,
                    actual: actual.max(0) as usize,
                },
            ));
        }
    }
    Ok(())
}

fn write_snapshot(
    tx: &Transaction<'_>,
    snapshot: &DeviceSnapshot,
    source: Option<&SourceDocument>,
) -> Result<()> {
    let key = snapshot.key();
    tx.execute("DELETE FROM devices WHERE device_key = ?1", params![key])
        .store_err(key)?;
    insert_device(tx, &snapshot.device)?;

    insert_rows(tx, key, &snapshot.properties)?;
    insert_rows(tx, key, &snapshot.sections)?;
    insert_rows(tx, key, &snapshot.variants)?;
    insert_rows(tx, key, &snapshot.datatypes)?;
    insert_rows(tx, key, &snapshot.datatype_values)?;
    insert_rows(tx, key, &snapshot.record_items)?;
    insert_rows(tx, key, &snapshot.parameters)?;
    insert_rows(tx, key, &snapshot.parameter_overrides)?;
    insert_rows(tx, key, &snapshot.process_data)?;
    insert_rows(tx, key, &snapshot.events)?;
    insert_rows(tx, key, &snapshot.assemblies)?;
    insert_rows(tx, key, &snapshot.assembly_members)?;
    insert_rows(tx, key, &snapshot.connections)?;
    insert_rows(tx, key, &snapshot.menus)?;
    insert_rows(tx, key, &snapshot.menu_items)?;
    insert_rows(tx, key, &snapshot.role_menus)?;
    insert_rows(tx, key, &snapshot.menu_roles)?;
    insert_rows(tx, key, &snapshot.languages)?;
    insert_rows(tx, key, &snapshot.texts)?;

    if let Some(source) = source {
        tx.execute(
            "INSERT INTO sources (device_key, file_name, format, bytes) VALUES (?1, ?2, ?3, ?4)",
            params![key, source.file_name, source.format.as_str(), source.bytes],
        )
        .store_err(key)?;
    }
    verify_counts(tx, snapshot)
}

fn read_snapshot(conn: &Connection, key: &str) -> Result<Option<DeviceSnapshot>> {
    let device = conn
        .query_row(
            "SELECT device_key, format, vendor_id, device_id, vendor_name, product_name,
                    revision, source_file, checksum, parser_version, ingested_at
             FROM devices WHERE device_key = ?1",
            params![key],
            |row| {
                Ok(DeviceRow {
                    device_key: row.get(0)?,
                    format: format_column(1, row.get(1)?)?,
                    vendor_id: row.get(2)?,
                    device_id: row.get(3)?,
                    vendor_name: row.get(4)?,
                    product_name: row.get(5)?,
                    revision: row.get(6)?,
                    source_file: row.get(7)?,
                    checksum: row.get(8)?,
                    parser_version: row.get(9)?,
                    ingested_at: timestamp_column(10, row.get(10)?)?,
                })
            },
        )
        .optional()
        .store_err(key)?;
    let Some(device) = device else {
        return Ok(None);
    };

    let mut snapshot = DeviceSnapshot::new(device);
    snapshot.properties = load_rows(conn, key)?;
    snapshot.sections = load_rows(conn, key)?;
    snapshot.variants = load_rows(conn, key)?;
    snapshot.datatypes = load_rows(conn, key)?;
    snapshot.datatype_values = load_rows(conn, key)?;
    snapshot.record_items = load_rows(conn, key)?;
    snapshot.parameters = load_rows(conn, key)?;
    snapshot.parameter_overrides = load_rows(conn, key)?;
    snapshot.process_data = load_rows(conn, key)?;
    snapshot.events = load_rows(conn, key)?;
    snapshot.assemblies = load_rows(conn, key)?;
    snapshot.assembly_members = load_rows(conn, key)?;
    snapshot.connections = load_rows(conn, key)?;
    snapshot.menus = load_rows(conn, key)?;
    snapshot.menu_items = load_rows(conn, key)?;
    snapshot.role_menus = load_rows(conn, key)?;
    snapshot.menu_roles = load_rows(conn, key)?;
    snapshot.languages = load_rows(conn, key)?;
    snapshot.texts = load_rows(conn, key)?;
    Ok(Some(snapshot))
}

impl SnapshotStore for SqliteStore {
    fn replace_device(&self, snapshot: &DeviceSnapshot, source: Option<&SourceDocument>) -> Result<()> {
        let key = snapshot.key();
        let _guard = self.locks.acquire(key)?;
        let mut conn = self.connection();
        let tx = conn.transaction().store_err(key)?;
        // Dropping `tx` on error rolls everything back.
        write_snapshot(&tx, snapshot, source)?;
        tx.commit().store_err(key)?;

        let rows: usize = snapshot.table_counts().iter().map(|(_, n)| n).sum();
        dd_info!(
            LogContext::device("store", key),
            "snapshot replaced: {} child rows in {} tables",
            rows,
            CHILD_TABLES.len()
        );
        Ok(())
    }

    fn load_device(&self, device_key: &str) -> Result<Option<DeviceSnapshot>> {
        let conn = self.connection();
        read_snapshot(&conn, device_key)
    }

    fn load_source(&self, device_key: &str) -> Result<Option<SourceDocument>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT file_name, format, bytes FROM sources WHERE device_key = ?1",
            params![device_key],
            |row| {
                Ok(SourceDocument {
                    file_name: row.get(0)?,
                    format: format_column(1, row.get(1)?)?,
                    bytes: row.get(2)?,
                })
            },
        )
        .optional()
        .store_err(device_key)
    }

    fn list_devices(&self) -> Result<Vec<String>> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare("SELECT device_key FROM devices ORDER BY device_key")
            .store_err("")?;
        stmt.query_map([], |row| row.get(0))
            .store_err("")?
            .collect::<rusqlite::Result<Vec<String>>>()
            .store_err("")
    }

    fn delete_device(&self, device_key: &str) -> Result<bool> {
        let _guard = self.locks.acquire(device_key)?;
        let conn = self.connection();
        let deleted = conn
            .execute("DELETE FROM devices WHERE device_key = ?1", params![device_key])
            .store_err(device_key)?;
        dd_debug!(LogContext::device("store", device_key), "deleted {} device rows", deleted);
        Ok(deleted > 0)
    }

    fn append_score(&self, score: &QualityScore) -> Result<()> {
        let conn = self.connection();
        conn.execute(
            "INSERT INTO scores (device_key, score, missing, extra, value_changed, order_changed,
                                 parser_version, timestamp, incomplete)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                score.device_key,
                score.score,
                score.counts.missing_element,
                score.counts.extra_element,
                score.counts.value_changed,
                score.counts.order_changed,
                score.parser_version,
                timestamp_text(&score.timestamp),
                score.incomplete,
            ],
        )
        .store_err(&score.device_key)?;
        Ok(())
    }

    fn score_history(&self, device_key: &str) -> Result<Vec<QualityScore>> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare(
                "SELECT device_key, score, missing, extra, value_changed, order_changed,
                        parser_version, timestamp, incomplete
                 FROM scores WHERE device_key = ?1 ORDER BY id",
            )
            .store_err(device_key)?;
        stmt.query_map(params![device_key], |row| {
            Ok(QualityScore {
                device_key: row.get(0)?,
                score: row.get(1)?,
                counts: DiffCounts {
                    missing_element: row.get(2)?,
                    extra_element: row.get(3)?,
                    value_changed: row.get(4)?,
                    order_changed: row.get(5)?,
                },
                parser_version: row.get(6)?,
                timestamp: timestamp_column(7, row.get(7)?)?,
                incomplete: row.get(8)?,
            })
        })
        .store_err(device_key)?
        .collect::<rusqlite::Result<Vec<QualityScore>>>()
        .store_err(device_key)
    }
}

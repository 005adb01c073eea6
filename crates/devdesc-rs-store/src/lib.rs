// crates/devdesc-rs-store/src/lib.rs

#![doc = "Persistence for device snapshots."]
#![doc = ""]
#![doc = "It provides:"]
#![doc = "- `SnapshotStore`: the storage seam the pipeline writes through."]
#![doc = "- `SqliteStore`: one table per row type, whole-device replacement in one transaction."]
#![doc = "- `MemoryStore`: a process-local store for tests and short-lived batches."]
#![doc = "- `DeviceLocks`: at most one in-flight write per device key."]

// --- Crate Modules ---

mod locks;
mod memory;
mod sqlite;
mod store;

// --- Public API Re-exports ---

pub use locks::{BusyPolicy, DeviceGuard, DeviceLocks};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::SnapshotStore;

// crates/devdesc-rs-store/src/store.rs

use devdesc_rs::entity::{DeviceSnapshot, QualityScore, SourceDocument};
use devdesc_rs::error::Result;

/// A trait for abstracting where device snapshots and their score history
/// live.
///
/// A device's rows are written and removed as one unit: readers observe
/// either the previous snapshot or the new one, never a mix. Score history
/// is independent of the snapshot and survives re-ingestion.
pub trait SnapshotStore: Send + Sync {
    /// Discards every row stored for the snapshot's device key and stores
    /// `snapshot` (and `source`, when given) in its place.
    ///
    /// On error the previous snapshot is left untouched.
    fn replace_device(&self, snapshot: &DeviceSnapshot, source: Option<&SourceDocument>) -> Result<()>;

    /// Loads the full snapshot of a device, or `None` if it is not stored.
    fn load_device(&self, device_key: &str) -> Result<Option<DeviceSnapshot>>;

    /// Loads the original bytes the stored snapshot was built from.
    fn load_source(&self, device_key: &str) -> Result<Option<SourceDocument>>;

    /// Every stored device key, sorted.
    fn list_devices(&self) -> Result<Vec<String>>;

    /// Removes a device's snapshot and source. Returns `false` if nothing was
    /// stored under `device_key`.
    fn delete_device(&self, device_key: &str) -> Result<bool>;

    /// Appends one scoring run to the device's history.
    fn append_score(&self, score: &QualityScore) -> Result<()>;

    /// Every score of a device, oldest first.
    fn score_history(&self, device_key: &str) -> Result<Vec<QualityScore>>;
}

// crates/devdesc-rs-store/src/memory.rs

//! A process-local store. Snapshots are swapped whole, so a reader sees the
//! old or the new snapshot of a device and nothing in between.

use crate::locks::{BusyPolicy, DeviceLocks};
use crate::store::SnapshotStore;
use devdesc_rs::entity::{DeviceSnapshot, QualityScore, SourceDocument};
use devdesc_rs::error::Result;
use devdesc_rs::log::LogContext;
use devdesc_rs::dd_debug;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone)]
struct StoredDevice {
    snapshot: DeviceSnapshot,
    source: Option<SourceDocument>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    devices: RwLock<BTreeMap<String, StoredDevice>>,
    scores: RwLock<BTreeMap<String, Vec<QualityScore>>>,
    locks: DeviceLocks,
}

impl MemoryStore {
    pub fn new(policy: BusyPolicy) -> Self {
        Self {
            devices: RwLock::new(BTreeMap::new()),
            scores: RwLock::new(BTreeMap::new()),
            locks: DeviceLocks::new(policy),
        }
    }

    pub fn locks(&self) -> &DeviceLocks {
        &self.locks
    }
}

impl SnapshotStore for MemoryStore {
    fn replace_device(&self, snapshot: &DeviceSnapshot, source: Option<&SourceDocument>) -> Result<()> {
        let _guard = self.locks.acquire(snapshot.key())?;
        let stored = StoredDevice {
            snapshot: snapshot.clone(),
            source: source.cloned(),
        };
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(snapshot.key().to_string(), stored);
        dd_debug!(LogContext::device("store", snapshot.key()), "snapshot replaced in memory");
        Ok(())
    }

    fn load_device(&self, device_key: &str) -> Result<Option<DeviceSnapshot>> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        Ok(devices.get(device_key).map(|d| d.snapshot.clone()))
    }

    fn load_source(&self, device_key: &str) -> Result<Option<SourceDocument>> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        Ok(devices.get(device_key).and_then(|d| d.source.clone()))
    }

    fn list_devices(&self) -> Result<Vec<String>> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        Ok(devices.keys().cloned().collect())
    }

    fn delete_device(&self, device_key: &str) -> Result<bool> {
        let _guard = self.locks.acquire(device_key)?;
        let removed = self
            .devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(device_key);
        Ok(removed.is_some())
    }

    fn append_score(&self, score: &QualityScore) -> Result<()> {
        self.scores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(score.device_key.clone())
            .or_default()
            .push(score.clone());
        Ok(())
    }

    fn score_history(&self, device_key: &str) -> Result<Vec<QualityScore>> {
        let scores = self.scores.read().unwrap_or_else(PoisonError::into_inner);
        Ok(scores.get(device_key).cloned().unwrap_or_default())
    }
}

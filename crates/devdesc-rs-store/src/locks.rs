// crates/devdesc-rs-store/src/locks.rs

//! Per-device write serialization.

use devdesc_rs::error::{DevDescError, ErrorContext, PersistenceErrorKind, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// What a second writer does while another write of the same device is in
/// flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Wait until the first writer is done.
    #[default]
    Block,
    /// Fail at once with a retryable `Busy` error.
    Reject,
}

/// Keyed lock table: at most one holder per device key.
#[derive(Debug, Default)]
pub struct DeviceLocks {
    held: Mutex<BTreeSet<String>>,
    released: Condvar,
    policy: BusyPolicy,
}

impl DeviceLocks {
    pub fn new(policy: BusyPolicy) -> Self {
        Self {
            held: Mutex::new(BTreeSet::new()),
            released: Condvar::new(),
            policy,
        }
    }

    pub fn policy(&self) -> BusyPolicy {
        self.policy
    }

    // The set only ever holds plain keys, so a poisoned lock is still usable.
    fn table(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the lock of `device_key`, honouring the busy policy.
    ///
    /// # Errors
    /// `PersistenceError::Busy` when the policy is `Reject` and the device is
    /// already locked.
    pub fn acquire(&self, device_key: &str) -> Result<DeviceGuard<'_>> {
        let mut held = self.table();
        while held.contains(device_key) {
            if self.policy == BusyPolicy::Reject {
                return Err(DevDescError::persistence(
                    ErrorContext::new("store").with_device(device_key),
                    PersistenceErrorKind::Busy,
                ));
            }
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(device_key.to_string());
        Ok(DeviceGuard {
            locks: self,
            device_key: device_key.to_string(),
        })
    }

    pub fn is_locked(&self, device_key: &str) -> bool {
        self.table().contains(device_key)
    }
}

/// Releases its device lock on drop.
#[derive(Debug)]
pub struct DeviceGuard<'a> {
    locks: &'a DeviceLocks,
    device_key: String,
}

impl DeviceGuard<'_> {
    pub fn device_key(&self) -> &str {
        &self.device_key
    }
}

impl Drop for DeviceGuard<'_> {
    fn drop(&mut self) {
        self.locks.table().remove(&self.device_key);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_reject_policy_returns_busy() {
        let locks = DeviceLocks::new(BusyPolicy::Reject);
        let guard = locks.acquire("iodd:1:2:V1").unwrap();
        let err = locks.acquire("iodd:1:2:V1").unwrap_err();
        assert!(err.is_retryable());
        // Other devices are unaffected.
        assert!(locks.acquire("iodd:1:3:V1").is_ok());

        drop(guard);
        assert!(!locks.is_locked("iodd:1:2:V1"));
        assert!(locks.acquire("iodd:1:2:V1").is_ok());
    }

    #[test]
    fn test_block_policy_serializes_writers() {
        let locks = Arc::new(DeviceLocks::new(BusyPolicy::Block));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _guard = locks.acquire("eds:1:2:3.1").unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}

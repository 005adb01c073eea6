// crates/devdesc-rs-quality/src/pool.rs

//! A keyed worker pool.
//!
//! Every lane is one thread draining its own channel. A job's lane is fixed
//! by the hash of its key, so jobs of one device run one after another, in
//! submission order, while different devices spread over the lanes.

use crossbeam_channel::{Sender, unbounded};
use devdesc_rs::dd_error;
use devdesc_rs::log::LogContext;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct LanePool {
    lanes: Vec<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl LanePool {
    /// Starts `lanes` worker threads; at least one.
    pub fn new(lanes: usize) -> Self {
        let count = lanes.max(1);
        let mut senders = Vec::with_capacity(count);
        let mut workers = Vec::with_capacity(count);
        for lane in 0..count {
            let (tx, rx) = unbounded::<Job>();
            senders.push(tx);
            let worker = thread::Builder::new()
                .name(format!("devdesc-lane-{}", lane))
                .spawn(move || {
                    for job in rx {
                        // A panicking job must not take the lane down with it.
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            dd_error!(LogContext::new("pool"), "Job on lane {} panicked", lane);
                        }
                    }
                });
            match worker {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    dd_error!(LogContext::new("pool"), "Cannot start lane {}: {}", lane, err);
                    senders.pop();
                }
            }
        }
        Self {
            lanes: senders,
            workers,
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn lane_of(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.lanes.len().max(1) as u64) as usize
    }

    /// Queues `job` on the lane of `key`. When no lane could be started the
    /// job runs on the calling thread.
    pub fn submit<F>(&self, key: &str, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.lanes.is_empty() {
            job();
            return;
        }
        let lane = self.lane_of(key);
        if let Err(err) = self.lanes[lane].send(Box::new(job)) {
            dd_error!(LogContext::device("pool", key), "Lane {} is closed", lane);
            (err.0)();
        }
    }

    /// Waits for every queued job to finish.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.lanes.clear();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for LanePool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Shared stop flag for batch runs. Checked between devices only, so a
/// device that has started always finishes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

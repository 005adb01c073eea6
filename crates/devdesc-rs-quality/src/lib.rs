// crates/devdesc-rs-quality/src/lib.rs

#![doc = "Ingestion, scoring and orchestration of the device-description pipeline."]
#![doc = ""]
#![doc = "It provides:"]
#![doc = "- `plan_ingestion`: bounded unpacking, format sniffing, deduplication and canonical revision selection."]
#![doc = "- `diff_trees`: identity-keyed structural comparison and the fidelity score."]
#![doc = "- `Orchestrator`: parse → persist → reconstruct → diff per device or batch, on keyed worker lanes."]
#![doc = "- `classify` and `assess`: the lifecycle phase and remediation signal of a device."]

// --- Crate Modules ---

pub mod config;
pub mod diff;
pub mod ingest;
pub mod lifecycle;
pub mod orchestrator;
pub mod pool;
pub mod reconstruct;
pub mod remediation;
pub mod score;

// --- Public API Re-exports ---

pub use config::{ConfigError, PipelineConfig};
pub use diff::{DiffConfig, TreeDiff, diff_trees};
pub use ingest::{IngestionLimits, IngestionPlan, SelectionPolicy, TieBreak, plan_ingestion};
pub use lifecycle::{Condition, LifecycleConfig, LifecyclePhase, classify};
pub use orchestrator::{BatchReport, DeviceOutcome, Orchestrator};
pub use pool::{CancellationToken, LanePool};
pub use remediation::{
    ChannelSink, CollectingSink, LogSink, RemediationSignal, RemediationSink, RemediationThresholds,
    Severity, assess,
};
pub use score::QualityReport;

// crates/devdesc-rs-quality/src/orchestrator.rs

//! Drives parse → persist → reconstruct → diff for single devices and
//! batches, keeps the score history and raises remediation signals.

use crate::config::PipelineConfig;
use crate::diff::{TreeDiff, diff_trees};
use crate::ingest::{DuplicateDocument, SelectedDocument, SupersededDocument, plan_ingestion};
use crate::lifecycle::{LifecyclePhase, classify};
use crate::pool::{CancellationToken, LanePool};
use crate::reconstruct::{read_document_tree, read_reconstructed_tree, reconstruct};
use crate::remediation::{RemediationSignal, RemediationSink, assess};
use crate::score::QualityReport;
use chrono::Utc;
use crossbeam_channel::unbounded;
use devdesc_rs::error::{DevDescError, DiffErrorKind, ErrorContext, Result};
use devdesc_rs::log::LogContext;
use devdesc_rs::{
    DeviceSnapshot, DocNode, MappingMeta, SourceDocument, dd_debug, dd_info, dd_warn, map_document,
};
use devdesc_rs_store::SnapshotStore;
use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Result of scoring one device.
#[derive(Debug, Clone)]
pub struct DeviceOutcome {
    pub device_key: String,
    pub report: QualityReport,
    /// `None` only if the score history could not be read back.
    pub phase: Option<LifecyclePhase>,
    pub signal: Option<RemediationSignal>,
    /// Parser warnings of the ingested document (none for a rescore),
    /// followed by the error of a failed scoring stage.
    pub warnings: Vec<String>,
}

/// Result of a batch. Every selected device ends up in exactly one of
/// `outcomes`, `failures` or `cancelled`.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Sorted by device key.
    pub outcomes: Vec<DeviceOutcome>,
    pub failures: Vec<DevDescError>,
    /// Devices that were not started because the batch was cancelled.
    pub cancelled: Vec<String>,
    pub superseded: Vec<SupersededDocument>,
    pub duplicates: Vec<DuplicateDocument>,
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn was_cancelled(&self) -> bool {
        !self.cancelled.is_empty()
    }
}

enum JobResult {
    Done(Box<DeviceOutcome>),
    Failed(DevDescError),
    Cancelled(String),
}

/// Steps of `score_device` after the stored source has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScoringStage {
    Reconstruct,
    ReadBack,
    Diff,
}

impl ScoringStage {
    fn as_str(&self) -> &'static str {
        match self {
            ScoringStage::Reconstruct => "reconstruction",
            ScoringStage::ReadBack => "reconstruction read-back",
            ScoringStage::Diff => "diff",
        }
    }
}

impl fmt::Display for ScoringStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct StageFailure {
    stage: ScoringStage,
    error: DevDescError,
    incomplete_sections: Vec<String>,
}

impl StageFailure {
    fn new(stage: ScoringStage, error: DevDescError, incomplete_sections: Vec<String>) -> Self {
        Self {
            stage,
            error,
            incomplete_sections,
        }
    }
}

pub struct Orchestrator<S: SnapshotStore + 'static> {
    store: Arc<S>,
    config: Arc<PipelineConfig>,
    sink: Arc<dyn RemediationSink>,
}

impl<S: SnapshotStore + 'static> Clone for Orchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S: SnapshotStore + 'static> Orchestrator<S> {
    pub fn new(store: Arc<S>, config: PipelineConfig, sink: Arc<dyn RemediationSink>) -> Self {
        Self {
            store,
            config: Arc::new(config),
            sink,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Persists a selected document as the device's new snapshot, then
    /// scores it.
    pub fn ingest_document(&self, selected: &SelectedDocument) -> Result<DeviceOutcome> {
        let key = selected.device_key();
        let log = LogContext::device("orchestrator", &key);
        let meta = MappingMeta {
            source_file: selected.file_name.clone(),
            checksum: selected.checksum.clone(),
            parser_version: devdesc_rs::PARSER_VERSION.to_string(),
            ingested_at: Utc::now(),
        };
        let snapshot = map_document(&selected.document, &meta)?;
        let source = SourceDocument {
            file_name: selected.file_name.clone(),
            format: selected.format,
            bytes: selected.bytes.clone(),
        };
        self.store.replace_device(&snapshot, Some(&source))?;
        dd_debug!(log, "Stored snapshot from {}", selected.file_name);

        let mut outcome = self.score_device(&key)?;
        let mut warnings = selected.warnings.clone();
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Rebuilds the stored device, compares it with its stored source and
    /// records the score.
    ///
    /// When the rebuild cannot be produced, read back or compared, the
    /// device still gets a report: flagged `incomplete`, naming the failed
    /// stage, scored 0 and with the error in `warnings`.
    ///
    /// # Errors
    /// `DiffError::Unreadable` when the device or its source is not stored
    /// or the stored source no longer reads. Store failures propagate.
    pub fn score_device(&self, device_key: &str) -> Result<DeviceOutcome> {
        let log = LogContext::device("orchestrator", device_key);
        let unreadable = |what: &str| {
            DevDescError::diff(
                ErrorContext::new("store").with_device(device_key),
                DiffErrorKind::Unreadable(format!("no stored {}", what)),
            )
        };
        let snapshot = self
            .store
            .load_device(device_key)?
            .ok_or_else(|| unreadable("snapshot"))?;
        let source = self
            .store
            .load_source(device_key)?
            .ok_or_else(|| unreadable("source document"))?;

        let original = read_document_tree(snapshot.device.format, &source.bytes, &source.file_name)
            .map_err(|e| e.with_device(device_key))?;

        let mut warnings = Vec::new();
        let report = match self.compare(&snapshot, &original) {
            Ok((diff, incomplete_sections)) => {
                QualityReport::from_diff(device_key, diff, incomplete_sections)
            }
            Err(failure) => {
                dd_warn!(log, "{} failed, recording an incomplete report: {}", failure.stage, failure.error);
                warnings.push(failure.error.to_string());
                QualityReport::degraded(device_key, failure.stage.as_str(), failure.incomplete_sections)
            }
        };
        self.store.append_score(&report.to_score())?;

        let history = self.store.score_history(device_key)?;
        let phase = classify(&history, &self.config.lifecycle).map(|(phase, _)| phase);
        let signal = assess(&report, &self.config.remediation);
        if let Some(signal) = &signal {
            self.sink.emit(signal.clone());
        }
        dd_info!(
            log,
            "Scored {:.2} ({} diffs), phase {}",
            report.score,
            report.diffs.len(),
            phase.map_or("unknown", |p| p.as_str())
        );

        Ok(DeviceOutcome {
            device_key: device_key.to_string(),
            report,
            phase,
            signal,
            warnings,
        })
    }

    /// Rebuild, read back and diff. Returns the diff and the sections the
    /// builder had to leave out.
    fn compare(
        &self,
        snapshot: &DeviceSnapshot,
        original: &DocNode,
    ) -> std::result::Result<(TreeDiff, Vec<String>), StageFailure> {
        let device_key = snapshot.key();
        let format = snapshot.device.format;
        let rebuilt = reconstruct(snapshot)
            .map_err(|e| StageFailure::new(ScoringStage::Reconstruct, e.with_device(device_key), Vec::new()))?;
        for err in &rebuilt.errors {
            dd_warn!(LogContext::device("orchestrator", device_key), "Reconstruction degraded: {}", err);
        }
        let sections = rebuilt.incomplete_sections.clone();
        let rebuilt_tree = read_reconstructed_tree(format, &rebuilt, device_key)
            .map_err(|e| StageFailure::new(ScoringStage::ReadBack, e, sections.clone()))?;
        let diff = diff_trees(original, &rebuilt_tree, &self.config.diff)
            .map_err(|e| StageFailure::new(ScoringStage::Diff, e.with_device(device_key), sections.clone()))?;
        Ok((diff, sections))
    }

    /// Ingests an archive or a single document and scores every selected
    /// device on the worker lanes.
    ///
    /// # Errors
    /// Only when the input as a whole is rejected; per-device problems are
    /// collected in the report.
    pub fn run_batch(&self, bytes: &[u8], file_name: &str, token: &CancellationToken) -> Result<BatchReport> {
        let plan = plan_ingestion(
            bytes,
            file_name,
            &self.config.limits,
            &self.config.selection,
            self.config.parse_options(),
        )?;
        let mut report = BatchReport {
            failures: plan.failures,
            superseded: plan.superseded,
            duplicates: plan.duplicates,
            skipped: plan.skipped,
            ..BatchReport::default()
        };

        let jobs = plan.selected.into_iter().map(|selected| {
            let key = selected.device_key();
            let job = move |orchestrator: &Self| orchestrator.ingest_document(&selected);
            (key, job)
        });
        self.dispatch(jobs, token, &mut report);
        Ok(report)
    }

    /// Scores every stored device again, e.g. after a parser upgrade.
    pub fn rescore_all(&self, token: &CancellationToken) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let jobs = self.store.list_devices()?.into_iter().map(|key| {
            let job_key = key.clone();
            let job = move |orchestrator: &Self| orchestrator.score_device(&job_key);
            (key, job)
        });
        self.dispatch(jobs, token, &mut report);
        Ok(report)
    }

    fn dispatch<I, F>(&self, jobs: I, token: &CancellationToken, report: &mut BatchReport)
    where
        I: IntoIterator<Item = (String, F)>,
        F: FnOnce(&Self) -> Result<DeviceOutcome> + Send + 'static,
    {
        let pool = LanePool::new(self.config.worker_lanes);
        let (tx, rx) = unbounded::<JobResult>();
        for (key, job) in jobs {
            let orchestrator = self.clone();
            let token = token.clone();
            let tx = tx.clone();
            pool.submit(&key.clone(), move || {
                let result = if token.is_cancelled() {
                    JobResult::Cancelled(key)
                } else {
                    match catch_unwind(AssertUnwindSafe(|| job(&orchestrator))) {
                        Ok(Ok(outcome)) => JobResult::Done(Box::new(outcome)),
                        Ok(Err(err)) => JobResult::Failed(err.with_device(&key)),
                        Err(payload) => JobResult::Failed(panicked(&key, payload)),
                    }
                };
                // The receiver outlives the pool.
                let _ = tx.send(result);
            });
        }
        drop(tx);
        pool.join();

        for result in rx {
            match result {
                JobResult::Done(outcome) => report.outcomes.push(*outcome),
                JobResult::Failed(err) => {
                    dd_warn!(LogContext::new("orchestrator"), "Device failed: {}", err);
                    report.failures.push(err);
                }
                JobResult::Cancelled(key) => report.cancelled.push(key),
            }
        }
        report.outcomes.sort_by(|a, b| a.device_key.cmp(&b.device_key));
        report.cancelled.sort();
        if report.was_cancelled() {
            dd_info!(
                LogContext::new("orchestrator"),
                "Batch cancelled, {} devices not started",
                report.cancelled.len()
            );
        }
    }
}

/// The failure reported for a job that panicked instead of returning.
fn panicked(device_key: &str, payload: Box<dyn Any + Send>) -> DevDescError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    DevDescError::diff(
        ErrorContext::new("orchestrator").with_device(device_key),
        DiffErrorKind::Unreadable(format!("scoring panicked: {}", message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remediation::CollectingSink;
    use devdesc_rs_store::{BusyPolicy, MemoryStore};

    fn orchestrator() -> Orchestrator<MemoryStore> {
        Orchestrator::new(
            Arc::new(MemoryStore::new(BusyPolicy::Block)),
            PipelineConfig::default(),
            Arc::new(CollectingSink::new()),
        )
    }

    type Job = fn(&Orchestrator<MemoryStore>) -> Result<DeviceOutcome>;

    fn panicking(_: &Orchestrator<MemoryStore>) -> Result<DeviceOutcome> {
        panic!("builder bug")
    }

    fn failing(_: &Orchestrator<MemoryStore>) -> Result<DeviceOutcome> {
        Err(DevDescError::diff(
            ErrorContext::new("test"),
            DiffErrorKind::Unreadable("broken".into()),
        ))
    }

    #[test]
    fn test_panicking_job_is_reported_as_failure() {
        let orchestrator = orchestrator();
        let mut report = BatchReport::default();
        let jobs: Vec<(String, Job)> = vec![
            ("eds:1:1:1.0".to_string(), panicking),
            ("eds:1:2:1.0".to_string(), failing),
        ];
        orchestrator.dispatch(jobs, &CancellationToken::new(), &mut report);

        assert!(report.outcomes.is_empty());
        assert!(report.cancelled.is_empty());
        assert_eq!(report.failures.len(), 2);
        let panicked = report
            .failures
            .iter()
            .find(|e| e.context().device_id.as_deref() == Some("eds:1:1:1.0"))
            .unwrap();
        assert!(panicked.to_string().contains("builder bug"));
    }
}

// crates/devdesc-rs-quality/src/remediation.rs

//! Threshold checks on a quality report and the sinks that receive the
//! resulting remediation signals.

use crate::score::QualityReport;
use crossbeam_channel::Sender;
use devdesc_rs::log::LogContext;
use devdesc_rs::{dd_error, dd_warn};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RemediationThresholds {
    /// Scores below this are `Critical`.
    pub critical_score: f64,
    /// Scores below this raise at least a `Low` signal.
    pub warn_score: f64,
    /// More missing elements than this is `High`.
    pub max_missing: u32,
    /// More value changes than this is `Medium`.
    pub max_value_changed: u32,
}

impl Default for RemediationThresholds {
    fn default() -> Self {
        Self {
            critical_score: 50.0,
            warn_score: 95.0,
            max_missing: 0,
            max_value_changed: 5,
        }
    }
}

/// Work item for whoever maintains the device description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemediationSignal {
    pub device_id: String,
    pub severity: Severity,
    pub summary: String,
}

/// Decides whether `report` needs a signal, and how urgent it is.
pub fn assess(report: &QualityReport, thresholds: &RemediationThresholds) -> Option<RemediationSignal> {
    let counts = report.counts();
    let severity = if report.score < thresholds.critical_score {
        Severity::Critical
    } else if counts.missing_element > thresholds.max_missing || report.incomplete {
        Severity::High
    } else if counts.value_changed > thresholds.max_value_changed {
        Severity::Medium
    } else if report.score < thresholds.warn_score {
        Severity::Low
    } else {
        return None;
    };

    let mut summary = format!(
        "score {:.1}: {} missing, {} extra, {} changed",
        report.score, counts.missing_element, counts.extra_element, counts.value_changed
    );
    if !report.incomplete_sections.is_empty() {
        summary.push_str(&format!("; not rebuilt: {}", report.incomplete_sections.join(", ")));
    }
    if let Some(stage) = &report.failed_stage {
        summary.push_str(&format!("; {} failed", stage));
    }
    Some(RemediationSignal {
        device_id: report.device_id.clone(),
        severity,
        summary,
    })
}

/// Where remediation signals go. Implementations must not block for long;
/// they are called from worker lanes.
pub trait RemediationSink: Send + Sync {
    fn emit(&self, signal: RemediationSignal);
}

/// Keeps every signal in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    signals: Mutex<Vec<RemediationSignal>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<RemediationSignal> {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RemediationSink for CollectingSink {
    fn emit(&self, signal: RemediationSignal) {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signal);
    }
}

/// Forwards signals to a channel, e.g. a ticketing thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<RemediationSignal>,
}

impl ChannelSink {
    pub fn new(sender: Sender<RemediationSignal>) -> Self {
        Self { sender }
    }
}

impl RemediationSink for ChannelSink {
    fn emit(&self, signal: RemediationSignal) {
        if let Err(err) = self.sender.send(signal) {
            let device = err.0.device_id.clone();
            dd_error!(
                LogContext::device("remediation", &device),
                "Signal dropped, receiver is gone"
            );
        }
    }
}

/// Writes signals to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RemediationSink for LogSink {
    fn emit(&self, signal: RemediationSignal) {
        dd_warn!(
            LogContext::device("remediation", &signal.device_id),
            "{:?}: {}",
            signal.severity,
            signal.summary
        );
    }
}

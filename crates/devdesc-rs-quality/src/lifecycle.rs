// crates/devdesc-rs-quality/src/lifecycle.rs

//! Lifecycle phase of a device, derived from its score history.
//!
//! The phase is a small state machine. Each scoring run is turned into a set
//! of named [`Condition`]s and the declared [`TRANSITIONS`] table is scanned
//! in order; the first row whose source phase and condition both match
//! decides the next phase. When no row matches the phase is kept. The whole
//! history is replayed, so the phase never has to be stored.

use devdesc_rs::QualityScore;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Scored once.
    NewlyImported,
    /// Below target or still losing structure.
    UnderRemediation,
    /// The last run scored higher than the one before.
    Improving,
    /// At target for enough consecutive runs.
    Stable,
    /// The score dropped, or a stable device fell below target.
    Regressed,
}

impl LifecyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::NewlyImported => "newly_imported",
            LifecyclePhase::UnderRemediation => "under_remediation",
            LifecyclePhase::Improving => "improving",
            LifecyclePhase::Stable => "stable",
            LifecyclePhase::Regressed => "regressed",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about one scoring run, evaluated against the run before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// There is no earlier run.
    FirstScore,
    BelowTarget,
    /// Elements are missing from the reconstruction, or sections could not
    /// be rebuilt at all.
    StructuralLossPresent,
    ScoreImproved,
    /// Lower than the previous run by more than the drop tolerance.
    ScoreDropped,
    /// At or above target for `stable_runs` consecutive runs.
    SustainedAtTarget,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub target_score: f64,
    pub stable_runs: usize,
    pub drop_tolerance: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            target_score: 95.0,
            stable_runs: 3,
            drop_tolerance: 1.0,
        }
    }
}

/// One row of the transition table. `from: None` matches any phase.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: Option<LifecyclePhase>,
    pub when: Condition,
    pub to: LifecyclePhase,
}

const fn rule(from: Option<LifecyclePhase>, when: Condition, to: LifecyclePhase) -> Transition {
    Transition { from, when, to }
}

use Condition as C;
use LifecyclePhase as P;

/// Scanned top to bottom, first match wins.
pub const TRANSITIONS: &[Transition] = &[
    rule(None, C::FirstScore, P::NewlyImported),
    rule(None, C::ScoreDropped, P::Regressed),
    rule(Some(P::Stable), C::BelowTarget, P::Regressed),
    rule(None, C::SustainedAtTarget, P::Stable),
    rule(None, C::ScoreImproved, P::Improving),
    rule(None, C::StructuralLossPresent, P::UnderRemediation),
    rule(None, C::BelowTarget, P::UnderRemediation),
];

/// The conditions that hold for `history[index]`.
pub fn conditions(history: &[QualityScore], index: usize, config: &LifecycleConfig) -> Vec<Condition> {
    let Some(current) = history.get(index) else {
        return Vec::new();
    };
    let mut held = Vec::new();
    let previous = index.checked_sub(1).and_then(|i| history.get(i));
    match previous {
        None => held.push(Condition::FirstScore),
        Some(prev) => {
            if current.score < prev.score - config.drop_tolerance {
                held.push(Condition::ScoreDropped);
            }
            if current.score > prev.score {
                held.push(Condition::ScoreImproved);
            }
        }
    }
    if current.score < config.target_score {
        held.push(Condition::BelowTarget);
    }
    if current.counts.missing_element > 0 || current.incomplete {
        held.push(Condition::StructuralLossPresent);
    }
    let streak = history[..=index]
        .iter()
        .rev()
        .take_while(|s| s.score >= config.target_score)
        .count();
    if streak >= config.stable_runs.max(1) {
        held.push(Condition::SustainedAtTarget);
    }
    held
}

/// Next phase from the table, or the current one when no row matches.
pub fn next_phase(current: Option<LifecyclePhase>, held: &[Condition]) -> Option<LifecyclePhase> {
    TRANSITIONS
        .iter()
        .find(|t| t.from.is_none_or(|from| Some(from) == current) && held.contains(&t.when))
        .map(|t| t.to)
        .or(current)
}

/// Phase after the last run of `history` (oldest first), plus the
/// conditions of that run. `None` when the device was never scored.
pub fn classify(history: &[QualityScore], config: &LifecycleConfig) -> Option<(LifecyclePhase, Vec<Condition>)> {
    let mut phase = None;
    let mut held = Vec::new();
    for index in 0..history.len() {
        held = conditions(history, index, config);
        phase = next_phase(phase, &held);
    }
    phase.map(|p| (p, held))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use devdesc_rs::DiffCounts;

    fn history(scores: &[(f64, u32)]) -> Vec<QualityScore> {
        let start = Utc::now();
        scores
            .iter()
            .enumerate()
            .map(|(i, &(score, missing))| QualityScore {
                device_key: "iodd:1:1:V1".into(),
                score,
                counts: DiffCounts {
                    missing_element: missing,
                    ..DiffCounts::default()
                },
                parser_version: "0.1.0".into(),
                timestamp: start + Duration::minutes(i as i64),
                incomplete: false,
            })
            .collect()
    }

    fn phase(scores: &[(f64, u32)]) -> Option<LifecyclePhase> {
        classify(&history(scores), &LifecycleConfig::default()).map(|(p, _)| p)
    }

    #[test]
    fn test_phase_progression() {
        assert_eq!(phase(&[]), None);
        assert_eq!(phase(&[(60.0, 4)]), Some(P::NewlyImported));
        assert_eq!(phase(&[(60.0, 4), (60.0, 4)]), Some(P::UnderRemediation));
        assert_eq!(phase(&[(60.0, 4), (80.0, 2)]), Some(P::Improving));
        assert_eq!(
            phase(&[(60.0, 4), (96.0, 0), (97.0, 0), (97.0, 0)]),
            Some(P::Stable)
        );
    }

    #[test]
    fn test_regressions() {
        assert_eq!(phase(&[(90.0, 1), (70.0, 3)]), Some(P::Regressed));
        // A stable device slipping under target within tolerance still regresses.
        assert_eq!(
            phase(&[(96.0, 0), (96.0, 0), (96.0, 0), (95.5, 0), (94.8, 0)]),
            Some(P::Regressed)
        );
        // Inside the tolerance and above target nothing changes.
        assert_eq!(
            phase(&[(99.0, 0), (99.0, 0), (99.0, 0), (98.5, 0)]),
            Some(P::Stable)
        );
    }

    #[test]
    fn test_conditions_of_last_run() {
        let (_, held) = classify(&history(&[(90.0, 0), (92.0, 1)]), &LifecycleConfig::default()).unwrap();
        assert_eq!(
            held,
            vec![C::ScoreImproved, C::BelowTarget, C::StructuralLossPresent]
        );
    }
}

// crates/devdesc-rs-quality/src/score.rs

use crate::diff::TreeDiff;
use chrono::{DateTime, Utc};
use devdesc_rs::{DiffCategory, DiffCounts, DiffRecord, QualityScore};
use serde::Serialize;
use std::collections::BTreeMap;

/// The outcome of one scoring run, as handed to reviewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub device_id: String,
    pub score: f64,
    /// Always holds all four categories, zero or not.
    pub diff_counts_by_category: BTreeMap<DiffCategory, u32>,
    pub diffs: Vec<DiffRecord>,
    pub parser_version: String,
    pub timestamp: DateTime<Utc>,
    /// Some sections could not be rebuilt; the score covers the rest.
    pub incomplete: bool,
    pub incomplete_sections: Vec<String>,
    /// The scoring stage that failed, if any. No diff was taken then.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<String>,
}

impl QualityReport {
    pub fn from_diff(device_id: &str, diff: TreeDiff, incomplete_sections: Vec<String>) -> Self {
        let counts = diff.counts();
        Self {
            device_id: device_id.to_string(),
            score: diff.score(),
            diff_counts_by_category: DiffCategory::ALL
                .iter()
                .map(|&c| (c, counts.get(c)))
                .collect(),
            diffs: diff.records,
            parser_version: devdesc_rs::PARSER_VERSION.to_string(),
            timestamp: Utc::now(),
            incomplete: !incomplete_sections.is_empty(),
            incomplete_sections,
            failed_stage: None,
        }
    }

    /// The report of a device whose rebuild could not be compared with its
    /// source. Nothing was verified, so the score is 0.
    pub fn degraded(device_id: &str, stage: &str, incomplete_sections: Vec<String>) -> Self {
        Self {
            device_id: device_id.to_string(),
            score: 0.0,
            diff_counts_by_category: DiffCategory::ALL.iter().map(|&c| (c, 0)).collect(),
            diffs: Vec::new(),
            parser_version: devdesc_rs::PARSER_VERSION.to_string(),
            timestamp: Utc::now(),
            incomplete: true,
            incomplete_sections,
            failed_stage: Some(stage.to_string()),
        }
    }

    pub fn counts(&self) -> DiffCounts {
        let count = |category: DiffCategory| {
            self.diff_counts_by_category
                .get(&category)
                .copied()
                .unwrap_or(0)
        };
        DiffCounts {
            missing_element: count(DiffCategory::MissingElement),
            extra_element: count(DiffCategory::ExtraElement),
            value_changed: count(DiffCategory::ValueChanged),
            order_changed: count(DiffCategory::OrderChanged),
        }
    }

    /// The row appended to the device's score history.
    pub fn to_score(&self) -> QualityScore {
        QualityScore {
            device_key: self.device_id.clone(),
            score: self.score,
            counts: self.counts(),
            parser_version: self.parser_version.clone(),
            timestamp: self.timestamp,
            incomplete: self.incomplete,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: DiffCategory, path: &str) -> DiffRecord {
        DiffRecord {
            category,
            path: path.into(),
            expected: Some("a".into()),
            actual: None,
            weight: 1.0,
        }
    }

    #[test]
    fn test_report_json_shape() {
        let diff = TreeDiff {
            records: vec![
                record(DiffCategory::MissingElement, "/IODevice/@x"),
                record(DiffCategory::MissingElement, "/IODevice/Y"),
            ],
            expected_nodes: 20,
        };
        let report = QualityReport::from_diff("iodd:1:2:V1", diff, vec!["Menus".into()]);
        assert_eq!(report.score, 90.0);
        assert!(report.incomplete);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["device_id"], "iodd:1:2:V1");
        assert_eq!(json["diff_counts_by_category"]["MISSING_ELEMENT"], 2);
        assert_eq!(json["diff_counts_by_category"]["ORDER_CHANGED"], 0);
        assert_eq!(json["diffs"][1]["category"], "MISSING_ELEMENT");
        assert_eq!(json["diffs"][1]["path"], "/IODevice/Y");
        assert!(json["diffs"][0].get("weight").is_none());
        assert_eq!(json["incomplete_sections"][0], "Menus");

        assert!(json.get("failed_stage").is_none());

        let score = report.to_score();
        assert_eq!(score.counts.missing_element, 2);
        assert_eq!(score.counts.total(), 2);
        assert_eq!(score.device_key, "iodd:1:2:V1");
    }

    #[test]
    fn test_counts_follow_categories() {
        let diff = TreeDiff {
            records: vec![
                record(DiffCategory::ExtraElement, "/EDS/A"),
                record(DiffCategory::ValueChanged, "/EDS/B"),
                record(DiffCategory::ValueChanged, "/EDS/C"),
                record(DiffCategory::OrderChanged, "/EDS"),
            ],
            expected_nodes: 40,
        };
        let counts = QualityReport::from_diff("eds:1:2:1.0", diff, Vec::new()).counts();
        assert_eq!(
            counts,
            DiffCounts {
                missing_element: 0,
                extra_element: 1,
                value_changed: 2,
                order_changed: 1,
            }
        );
    }

    #[test]
    fn test_degraded_report_is_incomplete() {
        let report = QualityReport::degraded("eds:1:2:1.0", "diff", vec!["Params".into()]);
        assert_eq!(report.score, 0.0);
        assert!(report.incomplete);
        assert_eq!(report.counts(), DiffCounts::default());

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["failed_stage"], "diff");
        assert_eq!(json["diff_counts_by_category"]["MISSING_ELEMENT"], 0);
        assert!(report.to_score().incomplete);
    }
}

// crates/devdesc-rs-quality/src/diff/mod.rs

//! Path-aligned structural comparison of an original document tree with its
//! reconstruction.
//!
//! Children are matched by identity key, never by position, so a reordered
//! but otherwise intact list only produces an `ORDER_CHANGED` record. Every
//! record carries a weight; the fidelity score is
//! `100 * (1 - weighted / original node count)`, clamped to `[0, 100]`.

mod keys;

pub use keys::DiffConfig;

use devdesc_rs::error::{DevDescError, DiffErrorKind, ErrorContext, Result};
use devdesc_rs::{DiffCategory, DiffCounts, DiffRecord, DocNode};
use keys::{is_cosmetic, keyed_children};
use std::collections::{HashMap, HashSet};

/// All differences between two trees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeDiff {
    pub records: Vec<DiffRecord>,
    /// Node count of the original tree.
    pub expected_nodes: usize,
}

impl TreeDiff {
    pub fn counts(&self) -> DiffCounts {
        DiffCounts::from_records(&self.records)
    }

    pub fn weighted(&self) -> f64 {
        self.records.iter().map(|r| r.weight).sum()
    }

    pub fn score(&self) -> f64 {
        if self.expected_nodes == 0 {
            return if self.records.is_empty() { 100.0 } else { 0.0 };
        }
        let score = 100.0 * (1.0 - self.weighted() / self.expected_nodes as f64);
        score.clamp(0.0, 100.0)
    }
}

/// Compares `original` with `reconstructed`.
///
/// # Errors
/// `DiffError::FormatMismatch` when the roots differ, which means the two
/// trees are not the same kind of document.
pub fn diff_trees(original: &DocNode, reconstructed: &DocNode, config: &DiffConfig) -> Result<TreeDiff> {
    if original.name != reconstructed.name {
        return Err(DevDescError::diff(
            ErrorContext::new(original.name.as_str()),
            DiffErrorKind::FormatMismatch {
                original: original.name.clone(),
                reconstructed: reconstructed.name.clone(),
            },
        ));
    }
    let mut walker = Walker {
        config,
        records: Vec::new(),
    };
    walker.node(&format!("/{}", original.name), original, reconstructed);
    Ok(TreeDiff {
        records: walker.records,
        expected_nodes: original.node_count(),
    })
}

struct Walker<'a> {
    config: &'a DiffConfig,
    records: Vec<DiffRecord>,
}

impl Walker<'_> {
    fn push(
        &mut self,
        category: DiffCategory,
        path: String,
        expected: Option<&str>,
        actual: Option<&str>,
        weight: f64,
    ) {
        self.records.push(DiffRecord {
            category,
            path,
            expected: expected.map(str::to_string),
            actual: actual.map(str::to_string),
            weight,
        });
    }

    fn subtree_weight(&self, node: &DocNode) -> f64 {
        if self.config.weight_subtrees {
            node.node_count() as f64
        } else {
            1.0
        }
    }

    fn value_weight(&self, expected: &str, actual: &str) -> f64 {
        if is_cosmetic(expected, actual) {
            self.config.cosmetic_weight
        } else {
            1.0
        }
    }

    fn node(&mut self, path: &str, original: &DocNode, rebuilt: &DocNode) {
        self.attributes(path, original, rebuilt);

        match (&original.text, &rebuilt.text) {
            (Some(expected), Some(actual)) if expected != actual => {
                let weight = self.value_weight(expected, actual);
                self.push(
                    DiffCategory::ValueChanged,
                    path.to_string(),
                    Some(expected.as_str()),
                    Some(actual.as_str()),
                    weight,
                );
            }
            (Some(expected), None) => {
                self.push(DiffCategory::ValueChanged, path.to_string(), Some(expected.as_str()), None, 1.0);
            }
            (None, Some(actual)) => {
                self.push(DiffCategory::ValueChanged, path.to_string(), None, Some(actual.as_str()), 1.0);
            }
            _ => {}
        }

        self.children(path, original, rebuilt);
    }

    fn attributes(&mut self, path: &str, original: &DocNode, rebuilt: &DocNode) {
        for (name, expected) in &original.attributes {
            let attr_path = format!("{}/@{}", path, name);
            match rebuilt.attr(name) {
                None => self.push(DiffCategory::MissingElement, attr_path, Some(expected.as_str()), None, 1.0),
                Some(actual) if actual != expected.as_str() => {
                    let weight = self.value_weight(expected, actual);
                    self.push(DiffCategory::ValueChanged, attr_path, Some(expected.as_str()), Some(actual), weight);
                }
                Some(_) => {}
            }
        }
        for (name, actual) in &rebuilt.attributes {
            if original.attr(name).is_none() {
                self.push(
                    DiffCategory::ExtraElement,
                    format!("{}/@{}", path, name),
                    None,
                    Some(actual.as_str()),
                    1.0,
                );
            }
        }
    }

    fn children(&mut self, path: &str, original: &DocNode, rebuilt: &DocNode) {
        let expected = keyed_children(original, self.config);
        let actual = keyed_children(rebuilt, self.config);
        let actual_index: HashMap<&str, usize> = actual
            .iter()
            .enumerate()
            .map(|(i, (key, _))| (key.as_str(), i))
            .collect();
        let expected_keys: HashSet<&str> = expected.iter().map(|(key, _)| key.as_str()).collect();

        // Matched keys in original order, with their position in the rebuild.
        let mut matched: Vec<(&str, usize)> = Vec::new();
        for (key, child) in &expected {
            let child_path = format!("{}/{}", path, key);
            match actual_index.get(key.as_str()) {
                Some(&i) => {
                    matched.push((key.as_str(), i));
                    self.node(&child_path, child, actual[i].1);
                }
                None => {
                    let weight = self.subtree_weight(child);
                    self.push(DiffCategory::MissingElement, child_path, Some(child.name.as_str()), None, weight);
                }
            }
        }
        for (key, child) in &actual {
            if !expected_keys.contains(key.as_str()) {
                let weight = self.subtree_weight(child);
                self.push(
                    DiffCategory::ExtraElement,
                    format!("{}/{}", path, key),
                    None,
                    Some(child.name.as_str()),
                    weight,
                );
            }
        }

        if self.config.check_order {
            let mut rebuilt_order = matched.clone();
            rebuilt_order.sort_by_key(|(_, i)| *i);
            if let Some((want, got)) = matched
                .iter()
                .zip(&rebuilt_order)
                .find(|(a, b)| a.0 != b.0)
            {
                let weight = self.config.order_weight;
                self.push(DiffCategory::OrderChanged, path.to_string(), Some(want.0), Some(got.0), weight);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(children: usize) -> DocNode {
        (0..children).fold(DocNode::new("Root"), |root, i| {
            root.with_child(DocNode::new(format!("E{}", i)))
        })
    }

    #[test]
    fn test_identical_trees_score_100() {
        let tree = DocNode::new("IODevice")
            .with_attr("xmlns", "x")
            .with_child(DocNode::new("Variable").with_attr("id", "V_A").with_text("1"));
        let diff = diff_trees(&tree, &tree.clone(), &DiffConfig::default()).unwrap();
        assert!(diff.records.is_empty());
        assert_eq!(diff.score(), 100.0);
    }

    #[test]
    fn test_removing_5_of_50_elements_scores_90() {
        let original = flat(49);
        assert_eq!(original.node_count(), 50);
        let mut rebuilt = original.clone();
        rebuilt.children.drain(10..15);

        let diff = diff_trees(&original, &rebuilt, &DiffConfig::default()).unwrap();
        assert_eq!(diff.counts().missing_element, 5);
        assert_eq!(diff.counts().total(), 5);
        assert!((diff.score() - 90.0).abs() < 1e-9);
        assert_eq!(diff.records[0].path, "/Root/E10");
    }

    #[test]
    fn test_reordering_is_informational() {
        let original = DocNode::new("Root")
            .with_child(DocNode::new("Event").with_attr("code", "2"))
            .with_child(DocNode::new("Event").with_attr("code", "1"));
        let mut rebuilt = original.clone();
        rebuilt.children.reverse();

        let diff = diff_trees(&original, &rebuilt, &DiffConfig::default()).unwrap();
        assert_eq!(diff.records.len(), 1);
        assert_eq!(diff.records[0].category, DiffCategory::OrderChanged);
        assert_eq!(diff.records[0].expected.as_deref(), Some("Event[code=2]"));
        assert_eq!(diff.score(), 100.0);

        let unchecked = DiffConfig {
            check_order: false,
            ..DiffConfig::default()
        };
        assert!(diff_trees(&original, &rebuilt, &unchecked).unwrap().records.is_empty());
    }

    #[test]
    fn test_values_attributes_and_subtrees() {
        let original = DocNode::new("Root")
            .with_attr("v", "0x10")
            .with_attr("gone", "x")
            .with_child(DocNode::new("Name").with_text("Flow sensor"))
            .with_child(DocNode::new("Block").with_attr("id", "B").with_child(DocNode::new("Leaf")));
        let rebuilt = DocNode::new("Root")
            .with_attr("v", "16")
            .with_attr("new", "y")
            .with_child(DocNode::new("Name").with_text("Flow meter"));

        let diff = diff_trees(&original, &rebuilt, &DiffConfig::default()).unwrap();
        let by_path: Vec<(DiffCategory, &str, f64)> = diff
            .records
            .iter()
            .map(|r| (r.category, r.path.as_str(), r.weight))
            .collect();
        assert_eq!(
            by_path,
            vec![
                (DiffCategory::ValueChanged, "/Root/@v", 0.1),
                (DiffCategory::MissingElement, "/Root/@gone", 1.0),
                (DiffCategory::ExtraElement, "/Root/@new", 1.0),
                (DiffCategory::ValueChanged, "/Root/Name", 1.0),
                (DiffCategory::MissingElement, "/Root/Block[id=B]", 3.0),
            ]
        );
        // 1 root + 2 attributes + Name + Block, its id and Leaf
        assert_eq!(diff.expected_nodes, 7);
        let expected = 100.0 * (1.0 - 6.1 / 7.0);
        assert!((diff.score() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped_and_roots_must_match() {
        let original = DocNode::new("Root");
        let rebuilt = flat(20);
        let diff = diff_trees(&original, &rebuilt, &DiffConfig::default()).unwrap();
        assert_eq!(diff.score(), 0.0);

        let err = diff_trees(&DocNode::new("IODevice"), &DocNode::new("EDS"), &DiffConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DevDescError::Diff {
                kind: DiffErrorKind::FormatMismatch { .. },
                ..
            }
        ));
    }
}

// crates/devdesc-rs-quality/src/ingest/select.rs

//! Canonical revision selection.
//!
//! Candidates are grouped by `(format, vendor id, device id)`. Within a group
//! the highest revision key wins; equal keys are decided by the configured
//! [`TieBreak`].

use devdesc_rs::document::{DeviceDocument, DocumentFormat, revision_key};
use devdesc_rs_eds::eds_revision_key;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The file extracted last wins.
    #[default]
    LastExtracted,
    /// The file extracted first wins.
    FirstExtracted,
    /// The lexicographically greatest file name wins.
    FileName,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    pub tie_break: TieBreak,
}

/// Revision key of an IODD: `DocumentInfo@version`, else the profile
/// revision, else the identity revision.
pub fn iodd_revision_key(doc: &DeviceDocument) -> Vec<u32> {
    let raw = doc
        .property("DocumentInfo", "version")
        .or_else(|| doc.property("ProfileHeader", "ProfileRevision"))
        .unwrap_or(doc.identity.revision.as_str());
    revision_key(raw)
}

/// A parsed document competing for its device slot.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub file_name: &'a str,
    /// Extraction order.
    pub order: usize,
    pub document: &'a DeviceDocument,
}

impl Candidate<'_> {
    pub fn revision_key(&self) -> Vec<u32> {
        match self.document.format {
            DocumentFormat::Iodd => iodd_revision_key(self.document),
            DocumentFormat::Eds => eds_revision_key(self.file_name, self.document),
        }
    }
}

/// Outcome for one device: the index of the winner and of every candidate
/// it superseded, as positions in the input slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub winner: usize,
    pub superseded: Vec<usize>,
}

fn tie_break(policy: TieBreak, a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    match policy {
        TieBreak::LastExtracted => a.order.cmp(&b.order),
        TieBreak::FirstExtracted => b.order.cmp(&a.order),
        TieBreak::FileName => a.file_name.cmp(b.file_name),
    }
}

/// One selection per device, in order of the device's first candidate.
pub fn select_canonical(candidates: &[Candidate<'_>], policy: &SelectionPolicy) -> Vec<Selection> {
    let mut groups: BTreeMap<(DocumentFormat, u32, u32), Vec<usize>> = BTreeMap::new();
    let mut first_seen: Vec<(DocumentFormat, u32, u32)> = Vec::new();
    for (i, c) in candidates.iter().enumerate() {
        let identity = &c.document.identity;
        let group = (c.document.format, identity.vendor_id, identity.device_id);
        let members = groups.entry(group).or_default();
        if members.is_empty() {
            first_seen.push(group);
        }
        members.push(i);
    }

    let keys: Vec<Vec<u32>> = candidates.iter().map(Candidate::revision_key).collect();
    first_seen
        .iter()
        .filter_map(|group| groups.get(group))
        .filter_map(|members| {
            let winner = members.iter().copied().max_by(|&a, &b| {
                keys[a]
                    .cmp(&keys[b])
                    .then_with(|| tie_break(policy.tie_break, &candidates[a], &candidates[b]))
            })?;
            let superseded = members.iter().copied().filter(|&i| i != winner).collect();
            Some(Selection { winner, superseded })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devdesc_rs::document::DocumentProperty;

    fn iodd(device_id: u32, version: &str) -> DeviceDocument {
        let mut doc = DeviceDocument::new(DocumentFormat::Iodd);
        doc.identity.vendor_id = 888;
        doc.identity.device_id = device_id;
        doc.identity.revision = version.to_string();
        doc.properties
            .push(DocumentProperty::new("DocumentInfo", "version", version));
        doc
    }

    fn candidates<'a>(docs: &'a [(&'a str, DeviceDocument)]) -> Vec<Candidate<'a>> {
        docs.iter()
            .enumerate()
            .map(|(order, (name, document))| Candidate {
                file_name: name,
                order,
                document,
            })
            .collect()
    }

    #[test]
    fn test_highest_revision_wins_per_device() {
        let docs = vec![
            ("v1.xml", iodd(1, "V1.0")),
            ("other.xml", iodd(2, "V1.0")),
            ("v3.xml", iodd(1, "V3.0")),
            ("v2.xml", iodd(1, "V2.10")),
        ];
        let selections = select_canonical(&candidates(&docs), &SelectionPolicy::default());
        assert_eq!(
            selections,
            vec![
                Selection {
                    winner: 2,
                    superseded: vec![0, 3]
                },
                Selection {
                    winner: 1,
                    superseded: vec![]
                },
            ]
        );
    }

    #[test]
    fn test_tie_break_policies() {
        let docs = vec![
            ("b-20240101.xml", iodd(1, "V1.0")),
            ("c-20230101.xml", iodd(1, "V1.0")),
            ("a-20250101.xml", iodd(1, "V1.0")),
        ];
        let c = candidates(&docs);
        let winner = |tie_break| select_canonical(&c, &SelectionPolicy { tie_break })[0].winner;
        assert_eq!(winner(TieBreak::LastExtracted), 2);
        assert_eq!(winner(TieBreak::FirstExtracted), 0);
        assert_eq!(winner(TieBreak::FileName), 1);
    }

    #[test]
    fn test_iodd_revision_falls_back_to_profile_revision() {
        let mut doc = DeviceDocument::new(DocumentFormat::Iodd);
        doc.identity.revision = "V9".into();
        doc.properties
            .push(DocumentProperty::new("ProfileHeader", "ProfileRevision", "1.1"));
        assert_eq!(iodd_revision_key(&doc), vec![1, 1]);
        doc.properties.clear();
        assert_eq!(iodd_revision_key(&doc), vec![9]);
    }
}

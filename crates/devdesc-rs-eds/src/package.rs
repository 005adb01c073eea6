// crates/devdesc-rs-eds/src/package.rs

//! Picks the canonical EDS file when a package ships several revisions of
//! the same device.
//!
//! The revision of a file is read from, in order of preference:
//! 1. a numeric version suffix in the file name (`FC300_V3.1.eds`),
//! 2. `[Device] MajRev` / `MinRev`,
//! 3. `[File] Revision`.

use crate::layout::{DEVICE, FILE};
use devdesc_rs::document::{DeviceDocument, revision_key};
use std::path::Path;

/// One parsed EDS file of a package.
#[derive(Debug, Clone, Copy)]
pub struct EdsCandidate<'a> {
    pub file_name: &'a str,
    pub document: &'a DeviceDocument,
}

/// The version encoded at the end of a file name, if any.
///
/// The last `_`, `-` or space separated part of the stem counts when it is
/// digits and dots, optionally led by `v`, `V`, `r`, `R` or `rev`.
pub fn filename_version(file_name: &str) -> Option<Vec<u32>> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let last = stem.rsplit(['_', '-', ' ']).next()?;
    let lower = last.to_ascii_lowercase();
    let digits = lower
        .strip_prefix("rev")
        .or_else(|| lower.strip_prefix('v'))
        .or_else(|| lower.strip_prefix('r'))
        .unwrap_or(&lower);
    let well_formed = !digits.is_empty()
        && digits.starts_with(|c: char| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.');
    well_formed.then(|| revision_key(digits))
}

/// Revision key of an EDS file, see the module docs for the precedence.
pub fn eds_revision_key(file_name: &str, doc: &DeviceDocument) -> Vec<u32> {
    if let Some(version) = filename_version(file_name) {
        return version;
    }
    if let Some(major) = doc.property(DEVICE, "MajRev") {
        let minor = doc.property(DEVICE, "MinRev").unwrap_or("0");
        return revision_key(&format!("{}.{}", major, minor));
    }
    doc.property(FILE, "Revision")
        .map(revision_key)
        .unwrap_or_default()
}

/// Index of the canonical candidate: the highest revision key, the later
/// candidate on a tie. `None` for an empty slice.
pub fn select_canonical(candidates: &[EdsCandidate<'_>]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (eds_revision_key(c.file_name, c.document), i))
        .max()
        .map(|(_, i)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devdesc_rs::document::{DocumentFormat, DocumentProperty};

    fn doc_with(props: &[(&str, &str, &str)]) -> DeviceDocument {
        let mut doc = DeviceDocument::new(DocumentFormat::Eds);
        doc.properties = props
            .iter()
            .map(|(s, k, v)| DocumentProperty::new(s, k, *v))
            .collect();
        doc
    }

    #[test]
    fn test_filename_version() {
        assert_eq!(filename_version("FC300_V3.1.eds"), Some(vec![3, 1]));
        assert_eq!(filename_version("dir/Acme-FC300-rev2.eds"), Some(vec![2]));
        assert_eq!(filename_version("FC300 1.10.eds"), Some(vec![1, 10]));
        assert_eq!(filename_version("FC300.eds"), None);
        assert_eq!(filename_version("Acme_FC300_final.eds"), None);
    }

    #[test]
    fn test_revision_key_precedence() {
        let doc = doc_with(&[("Device", "MajRev", "2"), ("Device", "MinRev", "4"), ("File", "Revision", "9.9")]);
        assert_eq!(eds_revision_key("FC300_V3.1.eds", &doc), vec![3, 1]);
        assert_eq!(eds_revision_key("FC300.eds", &doc), vec![2, 4]);
        let file_only = doc_with(&[("File", "Revision", "1.7")]);
        assert_eq!(eds_revision_key("FC300.eds", &file_only), vec![1, 7]);
    }

    #[test]
    fn test_select_canonical_prefers_highest_then_latest() {
        let v1 = doc_with(&[("Device", "MajRev", "1")]);
        let v3 = doc_with(&[("Device", "MajRev", "3")]);
        let candidates = [
            EdsCandidate { file_name: "a.eds", document: &v1 },
            EdsCandidate { file_name: "b.eds", document: &v3 },
            EdsCandidate { file_name: "c.eds", document: &v1 },
        ];
        assert_eq!(select_canonical(&candidates), Some(1));

        let tie = [
            EdsCandidate { file_name: "a.eds", document: &v3 },
            EdsCandidate { file_name: "b.eds", document: &v3 },
        ];
        assert_eq!(select_canonical(&tie), Some(1));
        assert_eq!(select_canonical(&[]), None);
    }
}

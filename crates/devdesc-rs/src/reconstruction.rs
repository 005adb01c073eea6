// crates/devdesc-rs/src/reconstruction.rs

//! Output of the reconstruction builders.

use crate::error::{DevDescError, ErrorContext, Result};

/// A rebuilt document. Sections that could not be rebuilt are left out of
/// `bytes` and listed in `incomplete_sections`, with the cause in `errors`.
#[derive(Debug)]
pub struct Reconstruction {
    pub bytes: Vec<u8>,
    pub incomplete_sections: Vec<String>,
    pub errors: Vec<DevDescError>,
}

impl Reconstruction {
    pub fn is_complete(&self) -> bool {
        self.incomplete_sections.is_empty()
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Collects per-section failures while a builder runs.
#[derive(Debug)]
pub struct SectionLog {
    device_key: String,
    incomplete_sections: Vec<String>,
    errors: Vec<DevDescError>,
}

impl SectionLog {
    pub fn new(device_key: impl Into<String>) -> Self {
        Self {
            device_key: device_key.into(),
            incomplete_sections: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Error for a row that a mandatory section needs but cannot find.
    pub fn missing(&self, section: &str, detail: impl Into<String>) -> DevDescError {
        DevDescError::reconstruction(
            ErrorContext::new(section).with_device(self.device_key.clone()),
            section,
            detail,
        )
    }

    /// Keeps the value of a section that built, or records the failure and
    /// returns `None` so the caller can omit the section.
    pub fn section<T>(&mut self, section: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                if !self.incomplete_sections.iter().any(|s| s == section) {
                    self.incomplete_sections.push(section.to_string());
                }
                self.errors.push(err.with_device(&self.device_key));
                None
            }
        }
    }

    /// Like [`SectionLog::section`] for items of a list: a failing item is
    /// dropped, marking the whole section incomplete.
    pub fn items<T>(
        &mut self,
        section: &str,
        results: impl IntoIterator<Item = Result<T>>,
    ) -> Vec<T> {
        results
            .into_iter()
            .filter_map(|r| self.section(section, r))
            .collect()
    }

    pub fn finish(self, bytes: Vec<u8>) -> Reconstruction {
        Reconstruction {
            bytes,
            incomplete_sections: self.incomplete_sections,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failing_item_marks_section_once() {
        let mut log = SectionLog::new("iodd:1:2:V1");
        let a: Result<u32> = Ok(1);
        let b: Result<u32> = Err(log.missing("EventCollection", "no row for event 16912"));
        let c: Result<u32> = Err(log.missing("EventCollection", "no row for event 16913"));
        let kept = log.items("EventCollection", [a, b, c]);
        assert_eq!(kept, vec![1]);
        let rec = log.finish(b"<IODevice/>".to_vec());
        assert_eq!(rec.incomplete_sections, vec!["EventCollection".to_string()]);
        assert_eq!(rec.errors.len(), 2);
        assert!(!rec.is_complete());
        assert_eq!(rec.as_str(), Some("<IODevice/>"));
    }
}

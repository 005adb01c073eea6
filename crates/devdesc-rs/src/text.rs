// crates/devdesc-rs/src/text.rs

//! The per-device multi-language text pool.
//!
//! All display strings of a document are owned by this pool; entities hold
//! only a [`TextRef`]. Languages keep their document order and every language
//! keeps its entry order so the collection can be emitted again unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A reference into the text pool (the document's `textId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextRef(pub String);

impl TextRef {
    pub fn new(id: impl Into<String>) -> Self {
        TextRef(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TextRef {
    fn from(id: &str) -> Self {
        TextRef(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub id: String,
    pub value: String,
}

/// All entries of one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTexts {
    pub code: String,
    pub primary: bool,
    pub entries: Vec<TextEntry>,
    index: BTreeMap<String, usize>,
}

impl LanguageTexts {
    pub fn new(code: impl Into<String>, primary: bool) -> Self {
        Self {
            code: code.into(),
            primary,
            entries: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Inserts or replaces an entry; replacing keeps the original position.
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<String>) {
        let id = id.into();
        let value = value.into();
        match self.index.get(&id) {
            Some(&pos) => self.entries[pos].value = value,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push(TextEntry { id, value });
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.index
            .get(id)
            .map(|&pos| self.entries[pos].value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPool {
    pub languages: Vec<LanguageTexts>,
}

impl TextPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the language block, creating it at the end if needed.
    pub fn language_mut(&mut self, code: &str, primary: bool) -> &mut LanguageTexts {
        let pos = match self.languages.iter().position(|l| l.code == code) {
            Some(pos) => pos,
            None => {
                self.languages.push(LanguageTexts::new(code, primary));
                self.languages.len() - 1
            }
        };
        &mut self.languages[pos]
    }

    pub fn insert(&mut self, lang: &str, id: impl Into<String>, value: impl Into<String>) {
        let primary = self.languages.is_empty();
        self.language_mut(lang, primary).insert(id, value);
    }

    pub fn primary(&self) -> Option<&LanguageTexts> {
        self.languages
            .iter()
            .find(|l| l.primary)
            .or_else(|| self.languages.first())
    }

    pub fn primary_code(&self) -> Option<&str> {
        self.primary().map(|l| l.code.as_str())
    }

    /// `true` if any language defines `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.languages.iter().any(|l| l.index.contains_key(id))
    }

    /// Resolves `id` walking the fallback chain: the requested language, then
    /// the primary language, then any language that defines it.
    pub fn resolve(&self, id: &str, lang: Option<&str>) -> Option<&str> {
        if let Some(lang) = lang {
            if let Some(value) = self
                .languages
                .iter()
                .find(|l| l.code == lang)
                .and_then(|l| l.get(id))
            {
                return Some(value);
            }
        }
        if let Some(value) = self.primary().and_then(|l| l.get(id)) {
            return Some(value);
        }
        self.languages.iter().find_map(|l| l.get(id))
    }

    pub fn len(&self) -> usize {
        self.languages.iter().map(|l| l.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> TextPool {
        let mut pool = TextPool::new();
        pool.language_mut("en", true).insert("T_Name", "Sensor");
        pool.language_mut("en", true).insert("T_Only_En", "english");
        pool.language_mut("de", false).insert("T_Name", "Sensor DE");
        pool.language_mut("de", false).insert("T_Only_De", "deutsch");
        pool
    }

    #[test]
    fn test_resolve_requested_language_first() {
        assert_eq!(pool().resolve("T_Name", Some("de")), Some("Sensor DE"));
    }

    #[test]
    fn test_resolve_falls_back_to_primary() {
        assert_eq!(pool().resolve("T_Only_En", Some("de")), Some("english"));
        assert_eq!(pool().resolve("T_Name", Some("fr")), Some("Sensor"));
    }

    #[test]
    fn test_resolve_falls_back_to_any_language() {
        assert_eq!(pool().resolve("T_Only_De", None), Some("deutsch"));
        assert_eq!(pool().resolve("T_Missing", None), None);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut pool = pool();
        pool.insert("en", "T_Name", "Renamed");
        let en = pool.primary().unwrap();
        assert_eq!(en.entries[0].id, "T_Name");
        assert_eq!(en.entries[0].value, "Renamed");
        assert_eq!(pool.len(), 4);
    }
}

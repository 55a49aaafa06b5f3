//! INI document reading.
//!
//! Understands the common `configparser` dialect:
//! ```text
//! ; comment
//! [section]
//! key = value
//! other: value
//!     continued on the next line
//! ```
//! Keys are case-insensitive and stored lowercased. Entries in a `[DEFAULT]`
//! section are visible from every other section.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, NormalizedPath, Result, io};

/// Name of the section whose entries apply to every section.
pub const DEFAULT_SECTION: &str = "DEFAULT";

static SECTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(?P<name>[^\]]+)\]\s*$").expect("Invalid section regex"));

static ENTRY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>[^=:\s][^=:]*?)\s*[=:]\s*(?P<value>.*)$").expect("Invalid entry regex")
});

/// A single `key = value` entry and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniEntry {
    pub value: String,
    /// File the entry was read from, if it came from disk.
    pub path: Option<NormalizedPath>,
    /// 1-based line of the key.
    pub line: usize,
}

/// Parsed contents of one or more INI files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: BTreeMap<String, BTreeMap<String, IniEntry>>,
    loaded: Vec<NormalizedPath>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse INI text. `path` is only used for error messages and provenance.
    pub fn parse(content: &str, path: Option<&NormalizedPath>) -> Result<Self> {
        let mut doc = Self::new();
        let mut section: Option<String> = None;
        let mut last_key: Option<String> = None;

        let parse_error = |line: usize, message: String| Error::IniParse {
            path: path.map(|p| p.to_native()).unwrap_or_default(),
            line,
            message,
        };

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();
            let trimmed = line.trim_start();

            if trimmed.is_empty() {
                last_key = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            // Indented line continues the previous value
            if trimmed.len() != line.len() {
                if let (Some(section), Some(key)) = (&section, &last_key) {
                    if let Some(entry) = doc
                        .sections
                        .get_mut(section)
                        .and_then(|entries| entries.get_mut(key))
                    {
                        if !entry.value.is_empty() {
                            entry.value.push('\n');
                        }
                        entry.value.push_str(trimmed);
                        continue;
                    }
                }
            }

            if let Some(caps) = SECTION_REGEX.captures(trimmed) {
                let name = caps["name"].trim().to_string();
                doc.sections.entry(name.clone()).or_default();
                section = Some(name);
                last_key = None;
                continue;
            }

            let Some(caps) = ENTRY_REGEX.captures(trimmed) else {
                return Err(parse_error(
                    line_no,
                    format!("expected `[section]` or `key = value`, found {trimmed:?}"),
                ));
            };
            let Some(current) = &section else {
                return Err(parse_error(
                    line_no,
                    "entry appears before any [section] header".to_string(),
                ));
            };

            let key = caps["key"].trim().to_lowercase();
            let entry = IniEntry {
                value: caps["value"].trim().to_string(),
                path: path.cloned(),
                line: line_no,
            };
            doc.sections
                .entry(current.clone())
                .or_default()
                .insert(key.clone(), entry);
            last_key = Some(key);
        }

        if let Some(path) = path {
            doc.loaded.push(path.clone());
        }
        Ok(doc)
    }

    /// Read every existing file in `paths`, in order. Entries from later
    /// files replace entries from earlier ones; missing files are skipped.
    pub fn read_paths<'a>(paths: impl IntoIterator<Item = &'a NormalizedPath>) -> Result<Self> {
        let mut doc = Self::new();
        for path in paths {
            match io::read_text_if_exists(path)? {
                Some(content) => {
                    tracing::debug!(%path, "Reading INI file");
                    doc.merge(Self::parse(&content, Some(path))?);
                }
                None => tracing::debug!(%path, "INI file not found, skipping"),
            }
        }
        Ok(doc)
    }

    /// Overlay `other` on top of this document.
    pub fn merge(&mut self, other: IniDocument) {
        for (section, entries) in other.sections {
            self.sections.entry(section).or_default().extend(entries);
        }
        self.loaded.extend(other.loaded);
    }

    /// Look up a key, falling back to the `[DEFAULT]` section.
    pub fn get(&self, section: &str, key: &str) -> Option<&IniEntry> {
        let key = key.to_lowercase();
        self.sections
            .get(section)
            .and_then(|entries| entries.get(&key))
            .or_else(|| {
                self.sections
                    .get(DEFAULT_SECTION)
                    .and_then(|entries| entries.get(&key))
            })
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Entries declared directly in `section` (not inherited from DEFAULT).
    pub fn entries(&self, section: &str) -> impl Iterator<Item = (&str, &IniEntry)> {
        self.sections
            .get(section)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Files that contributed to this document, in read order.
    pub fn loaded_paths(&self) -> &[NormalizedPath] {
        &self.loaded
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_both_separators() {
        let doc = IniDocument::parse("[app]\nxini = 50\ncolor: blue\n", None).unwrap();
        assert_eq!(doc.get("app", "xini").unwrap().value, "50");
        assert_eq!(doc.get("app", "color").unwrap().value, "blue");
        assert_eq!(doc.get("app", "color").unwrap().line, 3);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let doc = IniDocument::parse("[app]\nXArg = 2\n", None).unwrap();
        assert_eq!(doc.get("app", "xarg").unwrap().value, "2");
        assert_eq!(doc.get("app", "XARG").unwrap().value, "2");
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let doc = IniDocument::parse("# top\n[app]\n; note\n\nkey = v\n", None).unwrap();
        assert_eq!(doc.entries("app").count(), 1);
    }

    #[test]
    fn indented_lines_continue_values() {
        let doc = IniDocument::parse("[app]\nkey = first\n    second\n", None).unwrap();
        assert_eq!(doc.get("app", "key").unwrap().value, "first\nsecond");
    }

    #[test]
    fn default_section_is_inherited() {
        let doc = IniDocument::parse("[DEFAULT]\ngini = 10\n[app]\n", None).unwrap();
        assert_eq!(doc.get("app", "gini").unwrap().value, "10");
        assert!(doc.entries("app").next().is_none());
    }

    #[test]
    fn entry_before_section_is_an_error() {
        let err = IniDocument::parse("key = v\n", None).unwrap_err();
        assert!(matches!(err, Error::IniParse { line: 1, .. }));
    }

    #[test]
    fn garbage_line_is_an_error() {
        let err = IniDocument::parse("[app]\n???\n", None).unwrap_err();
        assert!(matches!(err, Error::IniParse { line: 2, .. }));
    }

    #[test]
    fn merge_overrides_per_key() {
        let mut base = IniDocument::parse("[app]\na = 1\nb = 2\n", None).unwrap();
        base.merge(IniDocument::parse("[app]\nb = 3\n", None).unwrap());
        assert_eq!(base.get("app", "a").unwrap().value, "1");
        assert_eq!(base.get("app", "b").unwrap().value, "3");
    }
}

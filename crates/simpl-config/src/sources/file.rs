//! INI files.

use std::collections::BTreeSet;

use simpl_fs::{IniDocument, NormalizedPath};

use super::{ExtractContext, Extraction, Source, SourceAdapter, coerce_scalar_source};
use crate::{Error, Result};

/// Reads options from INI files on a search path.
///
/// Files are read in order with later files overriding earlier ones. An
/// option is looked up in its own `file_section` first, then in the section
/// named after the program. Keys in those sections that no option reads are
/// rejected so that typos do not go unnoticed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSource {
    paths: Vec<NormalizedPath>,
}

impl FileSource {
    pub fn new(paths: Vec<NormalizedPath>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[NormalizedPath] {
        &self.paths
    }

    fn check_unknown_keys(doc: &IniDocument, ctx: &ExtractContext<'_>) -> Result<()> {
        let known: BTreeSet<String> = ctx
            .options
            .iter()
            .map(|o| o.name().to_lowercase())
            .collect();
        let sections: BTreeSet<&str> = ctx
            .options
            .iter()
            .filter_map(|o| o.section())
            .chain(std::iter::once(ctx.program))
            .collect();

        for section in sections {
            for (key, entry) in doc.entries(section) {
                if !known.contains(key) {
                    return Err(Error::UnknownFileKey {
                        path: entry
                            .path
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_default(),
                        section: section.to_string(),
                        key: key.to_string(),
                        line: entry.line,
                    });
                }
            }
        }
        Ok(())
    }
}

impl SourceAdapter for FileSource {
    fn extract(&self, ctx: &ExtractContext<'_>) -> Result<Extraction> {
        let mut extraction = Extraction::new();
        let doc = IniDocument::read_paths(&self.paths)?;
        if doc.is_empty() {
            return Ok(extraction);
        }
        Self::check_unknown_keys(&doc, ctx)?;

        for (index, option) in ctx.options.iter().enumerate() {
            let name = option.name();
            let mut entry = None;

            if let Some(section) = option.section() {
                if doc.has_section(section) {
                    entry = doc.get(section, &name);
                } else {
                    tracing::warn!(
                        option = %option.display_name(),
                        %section,
                        "INI section not found in any file, falling back to [{}]",
                        ctx.program
                    );
                }
            }
            let entry = entry.or_else(|| doc.get(ctx.program, &name));

            if let Some(entry) = entry {
                let origin = Source::File {
                    path: entry.path.clone(),
                };
                tracing::debug!(identity = %option.identity(), source = %origin, "Found value in INI file");
                let value = coerce_scalar_source(option, &entry.value, &origin)?;
                extraction.insert(option.identity(), index, value, origin);
            }
        }
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::ConfigOption;
    use crate::types;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> NormalizedPath {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        NormalizedPath::new(path)
    }

    fn extract(paths: Vec<NormalizedPath>, options: &[ConfigOption]) -> Result<Extraction> {
        FileSource::new(paths).extract(&ExtractContext {
            options,
            program: "app",
        })
    }

    #[test]
    fn option_section_is_consulted_first() {
        let dir = TempDir::new().unwrap();
        let ini = write(&dir, "app.ini", "[app]\nxini = 1\n[custom]\nxini = 50\n");
        let options = [ConfigOption::new(["--xini"])
            .file_section("custom")
            .coerce(types::integer())];

        let extraction = extract(vec![ini], &options).unwrap();

        assert_eq!(extraction.get("xini"), Some(&json!(50)));
    }

    #[test]
    fn missing_key_in_option_section_falls_back_to_program_section() {
        let dir = TempDir::new().unwrap();
        let ini = write(&dir, "app.ini", "[app]\nxini = 1\n[custom]\n");
        let options = [ConfigOption::new(["--xini"]).file_section("custom")];

        let extraction = extract(vec![ini], &options).unwrap();

        assert_eq!(extraction.get("xini"), Some(&json!("1")));
    }

    #[test]
    fn default_section_values_are_inherited() {
        let dir = TempDir::new().unwrap();
        let ini = write(&dir, "app.ini", "[DEFAULT]\ngini = 10\n[app]\n");
        let options = [ConfigOption::new(["--gini"]).coerce(types::integer())];

        let extraction = extract(vec![ini], &options).unwrap();

        assert_eq!(extraction.get("gini"), Some(&json!(10)));
    }

    #[test]
    fn unknown_key_in_program_section_is_rejected() {
        let dir = TempDir::new().unwrap();
        let ini = write(&dir, "app.ini", "[app]\nxini = 1\nxinni = 2\n");
        let options = [ConfigOption::new(["--xini"])];

        let err = extract(vec![ini], &options).unwrap_err();

        match err {
            Error::UnknownFileKey { key, section, line, .. } => {
                assert_eq!(key, "xinni");
                assert_eq!(section, "app");
                assert_eq!(line, 3);
            }
            other => panic!("expected UnknownFileKey, got {other:?}"),
        }
    }

    #[test]
    fn unrelated_sections_are_ignored() {
        let dir = TempDir::new().unwrap();
        let ini = write(&dir, "app.ini", "[other-tool]\nanything = 1\n[app]\nxini = 2\n");
        let options = [ConfigOption::new(["--xini"])];

        let extraction = extract(vec![ini], &options).unwrap();

        assert_eq!(extraction.len(), 1);
    }

    #[test]
    fn missing_files_yield_nothing() {
        let dir = TempDir::new().unwrap();
        let options = [ConfigOption::new(["--xini"])];
        let extraction = extract(vec![NormalizedPath::new(dir.path().join("nope.ini"))], &options)
            .unwrap();
        assert!(extraction.is_empty());
    }

    #[test]
    fn later_paths_override_earlier_paths() {
        let dir = TempDir::new().unwrap();
        let low = write(&dir, "low.ini", "[app]\nxini = low\n");
        let high = write(&dir, "high.ini", "[app]\nxini = high\n");
        let options = [ConfigOption::new(["--xini"])];

        let extraction = extract(vec![low, high.clone()], &options).unwrap();

        assert_eq!(extraction.get("xini"), Some(&json!("high")));
        assert_eq!(
            extraction.values["xini"].source,
            Source::File { path: Some(high) }
        );
    }
}

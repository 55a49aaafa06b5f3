//! Configuration sources.
//!
//! Each source turns one medium into a partial mapping from destination to
//! value. The resolver merges them in precedence order:
//!
//! 1. Defaults declared on the options
//! 2. INI files
//! 3. Secret store
//! 4. Environment variables
//! 5. Command-line arguments

mod cli;
mod defaults;
mod env;
mod file;
mod secrets;

pub use cli::{CliSource, DEFAULT_FROMFILE_PREFIX};
pub use defaults::DefaultSource;
pub use env::EnvSource;
pub use file::FileSource;
pub use secrets::SecretSource;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use simpl_fs::NormalizedPath;

use crate::option::ConfigOption;
use crate::{Error, Result};

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Default,
    File { path: Option<NormalizedPath> },
    SecretStore { namespace: String },
    Environment { var: String },
    CommandLine,
}

impl Source {
    /// Short label used in provenance reports.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Default => "default",
            Source::File { .. } => "ini-file",
            Source::SecretStore { .. } => "secret-store",
            Source::Environment { .. } => "environment",
            Source::CommandLine => "command-line",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File { path: Some(path) } => write!(f, "ini-file {path}"),
            Source::SecretStore { namespace } => write!(f, "secret-store ({namespace})"),
            Source::Environment { var } => write!(f, "environment ${var}"),
            other => f.write_str(other.label()),
        }
    }
}

/// A value one source supplied, and which options wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct Supplied {
    pub value: Value,
    pub source: Source,
    /// Indices of the options that wrote this destination within the source
    pub writers: Vec<usize>,
}

/// Everything one source produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub values: BTreeMap<String, Supplied>,
    /// Command-line tokens no option claimed
    pub pass_thru_args: Vec<String>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value. A second option writing the same destination replaces
    /// the value and is added to the writers.
    pub fn insert(&mut self, identity: String, writer: usize, value: Value, source: Source) {
        match self.values.get_mut(&identity) {
            Some(existing) => {
                existing.value = value;
                existing.source = source;
                if !existing.writers.contains(&writer) {
                    existing.writers.push(writer);
                }
            }
            None => {
                self.values.insert(
                    identity,
                    Supplied {
                        value,
                        source,
                        writers: vec![writer],
                    },
                );
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<&Value> {
        self.values.get(identity).map(|s| &s.value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Plain destination to value mapping.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(k, s)| (k.clone(), s.value.clone()))
            .collect()
    }
}

/// What every source gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub options: &'a [ConfigOption],
    pub program: &'a str,
}

/// A medium that can supply option values.
pub trait SourceAdapter {
    /// Produce values for the options this source knows about.
    ///
    /// An absent medium yields an empty extraction; only a medium that is
    /// present but malformed for a declared option is an error.
    fn extract(&self, ctx: &ExtractContext<'_>) -> Result<Extraction>;
}

/// Run the option's coercion over a raw value, attributing failures.
pub(crate) fn coerce(option: &ConfigOption, raw: &str, origin: &Source) -> Result<Value> {
    option
        .coercion()
        .apply(raw)
        .map_err(|message| Error::InvalidValue {
            option: option.display_name(),
            value: raw.to_string(),
            origin: origin.clone(),
            message,
        })
}

/// Coerce a value read from a non-CLI medium, wrapping it in a list for
/// options that collect repeated values.
pub(crate) fn coerce_scalar_source(
    option: &ConfigOption,
    raw: &str,
    origin: &Source,
) -> Result<Value> {
    let value = coerce(option, raw, origin)?;
    Ok(match (option.kind(), value) {
        (crate::option::ArgKind::Append, Value::Array(items)) => Value::Array(items),
        (crate::option::ArgKind::Append, other) => Value::Array(vec![other]),
        (_, other) => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_writer_replaces_value_and_is_recorded() {
        let mut extraction = Extraction::new();
        extraction.insert("key".into(), 0, Value::from("a"), Source::CommandLine);
        extraction.insert("key".into(), 1, Value::from("b"), Source::CommandLine);

        let supplied = &extraction.values["key"];
        assert_eq!(supplied.value, Value::from("b"));
        assert_eq!(supplied.writers, vec![0, 1]);
    }

    #[test]
    fn source_display_includes_detail() {
        let env = Source::Environment {
            var: "APP_XENV".into(),
        };
        assert_eq!(env.to_string(), "environment $APP_XENV");
        assert_eq!(env.label(), "environment");
        assert_eq!(Source::CommandLine.to_string(), "command-line");
    }
}

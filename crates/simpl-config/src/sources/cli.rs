//! Command-line arguments, the highest-precedence source.

use clap::parser::ValueSource;
use serde_json::Value;

use super::{ExtractContext, Extraction, Source, SourceAdapter, coerce};
use crate::argv;
use crate::command::{build_command, help_flag_enabled};
use crate::option::ArgKind;
use crate::{Error, Result};

/// Prefix marking a token as an argument file (`@args.txt`).
pub const DEFAULT_FROMFILE_PREFIX: char = '@';

/// Parses an argument vector whose first element is the program name.
///
/// Only options given explicitly on the command line are reported; backend
/// defaults never leak into the extraction. Tokens no option claims, and
/// everything after `--`, end up in `pass_thru_args` unless `strict` is set,
/// in which case unclaimed tokens are an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliSource {
    argv: Vec<String>,
    strict: bool,
    fromfile_prefix: Option<char>,
    help: bool,
}

impl CliSource {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            strict: false,
            fromfile_prefix: Some(DEFAULT_FROMFILE_PREFIX),
            help: true,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// `None` disables argument files.
    pub fn fromfile_prefix(mut self, prefix: Option<char>) -> Self {
        self.fromfile_prefix = prefix;
        self
    }

    /// Whether `-h/--help` is recognized.
    pub fn help(mut self, help: bool) -> Self {
        self.help = help;
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl SourceAdapter for CliSource {
    fn extract(&self, ctx: &ExtractContext<'_>) -> Result<Extraction> {
        let program = self
            .argv
            .first()
            .cloned()
            .unwrap_or_else(|| ctx.program.to_string());
        let tokens = self.argv.iter().skip(1).cloned().collect();

        let (before, after) = argv::split_pass_thru(tokens);
        let before = argv::expand_arg_files(before, self.fromfile_prefix)?;
        let parts = argv::partition(&before, ctx.options, help_flag_enabled(ctx.options, self.help));

        if self.strict && !parts.unclaimed.is_empty() {
            return Err(Error::UnrecognizedArguments {
                args: parts.unclaimed,
            });
        }

        let (command, _) = build_command(ctx.program, ctx.options, true, self.help)?;
        let matches =
            command.try_get_matches_from(std::iter::once(program).chain(parts.claimed))?;

        let mut extraction = Extraction::new();
        for (index, option) in ctx.options.iter().enumerate() {
            let id = option.arg_id();
            if matches.value_source(&id) != Some(ValueSource::CommandLine) {
                continue;
            }

            let raw: Vec<String> = match option.kind() {
                ArgKind::Set | ArgKind::Append => matches
                    .get_raw(&id)
                    .into_iter()
                    .flatten()
                    .map(|v| v.to_string_lossy().into_owned())
                    .collect(),
                _ => Vec::new(),
            };
            let value = match option.kind() {
                ArgKind::Set => match raw.last() {
                    Some(last) => coerce(option, last, &Source::CommandLine)?,
                    None => continue,
                },
                ArgKind::Append => Value::Array(
                    raw.iter()
                        .map(|r| coerce(option, r, &Source::CommandLine))
                        .collect::<Result<_>>()?,
                ),
                ArgKind::SetTrue => Value::Bool(true),
                ArgKind::SetFalse => Value::Bool(false),
                ArgKind::Count => Value::from(matches.get_count(&id)),
            };

            tracing::debug!(identity = %option.identity(), "Found value on command line");
            extraction.insert(option.identity(), index, value, Source::CommandLine);
        }

        extraction.pass_thru_args = after;
        extraction.pass_thru_args.extend(parts.unclaimed);
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::ConfigOption;
    use crate::types;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn options() -> Vec<ConfigOption> {
        vec![
            ConfigOption::new(["-k", "--key"]).group("secret").mutually_exclusive(true),
            ConfigOption::new(["--key-file"])
                .dest("key")
                .group("secret")
                .mutually_exclusive(true),
            ConfigOption::new(["--retries"])
                .coerce(types::integer())
                .default_value(3),
            ConfigOption::new(["-v", "--verbose"]).action(ArgKind::Count),
            ConfigOption::new(["--tag"]).action(ArgKind::Append),
            ConfigOption::new(["--no-color"]).dest("color").action(ArgKind::SetFalse),
        ]
    }

    fn extract(source: CliSource) -> Result<Extraction> {
        let options = options();
        source.extract(&ExtractContext {
            options: &options,
            program: "app",
        })
    }

    #[test]
    fn only_explicit_values_are_reported() {
        let extraction = extract(CliSource::new(["app", "--key", "abc"])).unwrap();
        assert_eq!(extraction.get("key"), Some(&json!("abc")));
        assert_eq!(extraction.get("retries"), None);
        assert_eq!(extraction.len(), 1);
    }

    #[test]
    fn actions_produce_typed_values() {
        let extraction = extract(CliSource::new([
            "app", "-vv", "--tag", "a", "--tag", "b", "--no-color", "--retries", "5",
        ]))
        .unwrap();
        assert_eq!(extraction.get("verbose"), Some(&json!(2)));
        assert_eq!(extraction.get("tag"), Some(&json!(["a", "b"])));
        assert_eq!(extraction.get("color"), Some(&json!(false)));
        assert_eq!(extraction.get("retries"), Some(&json!(5)));
    }

    #[test]
    fn aliases_record_every_writer() {
        let extraction = extract(CliSource::new(["app", "--key", "a", "--key-file", "b"])).unwrap();
        assert_eq!(extraction.values["key"].writers.len(), 2);
    }

    #[test]
    fn unclaimed_and_separated_tokens_pass_through() {
        let extraction =
            extract(CliSource::new(["app", "--bogus", "--key", "a", "--", "ls", "-l"])).unwrap();
        assert_eq!(extraction.pass_thru_args, vec!["ls", "-l", "--bogus"]);
        assert_eq!(extraction.get("key"), Some(&json!("a")));
    }

    #[test]
    fn strict_mode_rejects_unclaimed_tokens() {
        let err = extract(CliSource::new(["app", "--bogus"]).strict(true)).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedArguments { args } if args == vec!["--bogus"]));
    }

    #[test]
    fn bad_value_names_the_option() {
        let err = extract(CliSource::new(["app", "--retries", "many"])).unwrap_err();
        match err {
            Error::InvalidValue { option, origin, .. } => {
                assert_eq!(option, "--retries");
                assert_eq!(origin, Source::CommandLine);
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn help_request_surfaces_as_display_error() {
        let err = extract(CliSource::new(["app", "--help"])).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Display);
    }

    #[test]
    fn help_can_be_disabled() {
        let extraction = extract(CliSource::new(["app", "--help"]).help(false)).unwrap();
        assert_eq!(extraction.pass_thru_args, vec!["--help"]);
    }

    #[test]
    fn arg_files_are_expanded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("args.txt");
        std::fs::write(&path, "--key fromfile\n").unwrap();
        let extraction =
            extract(CliSource::new(["app".to_string(), format!("@{}", path.display())])).unwrap();
        assert_eq!(extraction.get("key"), Some(&json!("fromfile")));
    }
}

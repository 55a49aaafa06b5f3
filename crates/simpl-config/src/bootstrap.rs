//! Bootstrap layer that finds extra INI files before the main resolution.
//!
//! The bootstrap looks only at the command line and the environment, never
//! validates and never fails on arguments it does not know, so it can run
//! ahead of the primary resolver without interfering with it.

use serde_json::Value;
use simpl_fs::NormalizedPath;

use crate::option::{ArgKind, ConfigOption};
use crate::sources::{CliSource, EnvSource, ExtractContext, SourceAdapter};
use crate::types;
use crate::Result;

pub const INI_GROUP: &str = "initialization (metaconfig) arguments";
pub const INI_GROUP_DESCRIPTION: &str = "evaluated first and can be used to source an entire config";

/// The standard `--ini PATH` option. May be given several times.
pub fn ini_option() -> ConfigOption {
    ConfigOption::new(["--ini"])
        .coerce(types::normalized_path())
        .action(ArgKind::Append)
        .metavar("PATH")
        .help("Source some or all of the options from this INI file")
        .group(INI_GROUP)
        .group_description(INI_GROUP_DESCRIPTION)
}

/// Resolves the options that name INI files.
#[derive(Debug, Clone)]
pub struct BootstrapResolver {
    options: Vec<ConfigOption>,
}

impl Default for BootstrapResolver {
    fn default() -> Self {
        Self::new(vec![ini_option()])
    }
}

impl BootstrapResolver {
    /// Every option given here is read as one or more INI paths.
    pub fn new(options: Vec<ConfigOption>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &[ConfigOption] {
        &self.options
    }

    /// Bootstrap options to append to `primary` so the primary parse accepts
    /// them. An option whose name or flags the primary list already uses is
    /// left out; the primary declaration wins.
    pub fn options_for(&self, primary: &[ConfigOption]) -> Vec<ConfigOption> {
        self.options
            .iter()
            .filter(|option| {
                let collides = primary.iter().any(|p| {
                    p.name() == option.name() || p.flags().any(|f| option.flags().any(|g| f == g))
                });
                if collides {
                    tracing::debug!(
                        option = %option.display_name(),
                        "Bootstrap option shadowed by a primary declaration"
                    );
                }
                !collides
            })
            .cloned()
            .collect()
    }

    /// INI paths named on the command line or, failing that, in the
    /// environment. Command-line values replace environment values.
    pub fn discover(
        &self,
        program: &str,
        argv: &[String],
        env: &EnvSource,
        fromfile_prefix: Option<char>,
    ) -> Result<Vec<NormalizedPath>> {
        let ctx = ExtractContext {
            options: &self.options,
            program,
        };
        let cli = CliSource::new(argv.iter().cloned())
            .help(false)
            .fromfile_prefix(fromfile_prefix)
            .extract(&ctx)?;
        let from_env = env.extract(&ctx)?;

        let mut paths = Vec::new();
        for option in &self.options {
            let identity = option.identity();
            let Some(value) = cli.get(&identity).or_else(|| from_env.get(&identity)) else {
                continue;
            };
            collect_paths(value, &mut paths);
        }
        tracing::debug!(count = paths.len(), "Bootstrap discovered INI files");
        Ok(paths)
    }
}

fn collect_paths(value: &Value, out: &mut Vec<NormalizedPath>) {
    match value {
        Value::String(path) => out.push(NormalizedPath::new(path)),
        Value::Array(items) => items.iter().for_each(|item| collect_paths(item, out)),
        _ => {}
    }
}

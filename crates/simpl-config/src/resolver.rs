//! Resolver that merges every source into a [`Config`].
//!
//! Values are layered from lowest to highest precedence:
//! defaults, INI files, secret store, environment, command line. A later
//! layer only replaces the destinations it actually supplied.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use clap::Command;
use serde_json::Value;
use simpl_fs::NormalizedPath;

use crate::bootstrap::BootstrapResolver;
use crate::command::{build_command, check_declarations};
use crate::config::Config;
use crate::option::ConfigOption;
use crate::registry::GroupRegistry;
use crate::secrets::{NoSecretStore, SecretStore};
use crate::sources::{
    CliSource, DEFAULT_FROMFILE_PREFIX, DefaultSource, EnvSource, ExtractContext, Extraction,
    FileSource, SecretSource, Source, SourceAdapter,
};
use crate::validate::validate;
use crate::Result;

/// Builder for [`Resolver`].
pub struct ResolverBuilder {
    program: Option<String>,
    about: Option<String>,
    options: Vec<ConfigOption>,
    ini_paths: Vec<NormalizedPath>,
    argv: Option<Vec<String>>,
    env: Option<EnvSource>,
    secret_store: Option<Arc<dyn SecretStore>>,
    secret_namespace: Option<String>,
    strict: bool,
    help: bool,
    fromfile_prefix: Option<char>,
    bootstrap: Option<BootstrapResolver>,
    working_dir: Option<NormalizedPath>,
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self {
            program: None,
            about: None,
            options: Vec::new(),
            ini_paths: Vec::new(),
            argv: None,
            env: None,
            secret_store: None,
            secret_namespace: None,
            strict: false,
            help: true,
            fromfile_prefix: Some(DEFAULT_FROMFILE_PREFIX),
            bootstrap: Some(BootstrapResolver::default()),
            working_dir: None,
        }
    }
}

impl ResolverBuilder {
    /// Program name used for env prefixes, the INI section and the implicit
    /// `{program}.ini`. Defaults to the file stem of `argv[0]`.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Text shown at the top of help output.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn option(mut self, option: ConfigOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = ConfigOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn ini_path(mut self, path: impl Into<NormalizedPath>) -> Self {
        self.ini_paths.push(path.into());
        self
    }

    pub fn ini_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<NormalizedPath>,
    {
        self.ini_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Argument vector including the program name. Defaults to the process
    /// arguments.
    pub fn argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv = Some(argv.into_iter().map(Into::into).collect());
        self
    }

    /// Environment to read. Defaults to a snapshot of the process
    /// environment taken at build time.
    pub fn env(mut self, env: EnvSource) -> Self {
        self.env = Some(env);
        self
    }

    pub fn secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.secret_store = Some(store);
        self
    }

    /// Namespace for secret lookups. Defaults to the program name.
    pub fn secret_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.secret_namespace = Some(namespace.into());
        self
    }

    /// Reject command-line tokens no option claims.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Provide `-h/--help`. On by default.
    pub fn help(mut self, help: bool) -> Self {
        self.help = help;
        self
    }

    pub fn fromfile_prefix(mut self, prefix: Option<char>) -> Self {
        self.fromfile_prefix = prefix;
        self
    }

    pub fn bootstrap(mut self, bootstrap: BootstrapResolver) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    /// Skip the bootstrap layer and its `--ini` option.
    pub fn without_bootstrap(mut self) -> Self {
        self.bootstrap = None;
        self
    }

    /// Directory searched for the implicit `{program}.ini`. Defaults to the
    /// current directory.
    pub fn working_dir(mut self, dir: impl Into<NormalizedPath>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Check the declarations and build the resolver.
    pub fn build(self) -> Result<Resolver> {
        let argv = self
            .argv
            .unwrap_or_else(|| std::env::args_os().map(|a| a.to_string_lossy().into_owned()).collect());
        let program = self
            .program
            .or_else(|| {
                argv.first()
                    .and_then(|arg0| Path::new(arg0).file_stem())
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "config".to_string());

        let mut options = self.options;
        if let Some(bootstrap) = &self.bootstrap {
            let extra = bootstrap.options_for(&options);
            options.extend(extra);
        }
        check_declarations(&options)?;
        let (_, registry) = build_command(&program, &options, false, self.help)?;

        let working_dir = match self.working_dir {
            Some(dir) => dir,
            None => NormalizedPath::expand(".")?,
        };

        tracing::debug!(%program, options = options.len(), "Built resolver");
        Ok(Resolver {
            program,
            about: self.about,
            options,
            registry,
            ini_paths: self.ini_paths,
            argv,
            env: self.env.unwrap_or_else(EnvSource::from_process),
            secret_store: self.secret_store.unwrap_or_else(|| Arc::new(NoSecretStore)),
            secret_namespace: self.secret_namespace,
            strict: self.strict,
            help: self.help,
            fromfile_prefix: self.fromfile_prefix,
            bootstrap: self.bootstrap,
            working_dir,
        })
    }
}

/// Resolves declared options against every source.
///
/// A resolver owns its options and inputs; [`Resolver::resolve`] may be
/// called any number of times and always gives the same result.
pub struct Resolver {
    program: String,
    about: Option<String>,
    options: Vec<ConfigOption>,
    registry: GroupRegistry,
    ini_paths: Vec<NormalizedPath>,
    argv: Vec<String>,
    env: EnvSource,
    secret_store: Arc<dyn SecretStore>,
    secret_namespace: Option<String>,
    strict: bool,
    help: bool,
    fromfile_prefix: Option<char>,
    bootstrap: Option<BootstrapResolver>,
    working_dir: NormalizedPath,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("program", &self.program)
            .field("options", &self.options.len())
            .field("ini_paths", &self.ini_paths)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Declared options, including any the bootstrap layer appended.
    pub fn options(&self) -> &[ConfigOption] {
        &self.options
    }

    fn ctx(&self) -> ExtractContext<'_> {
        ExtractContext {
            options: &self.options,
            program: &self.program,
        }
    }

    pub fn defaults(&self) -> Result<Extraction> {
        DefaultSource.extract(&self.ctx())
    }

    pub fn parse_cli(&self) -> Result<Extraction> {
        CliSource::new(self.argv.iter().cloned())
            .strict(self.strict)
            .help(self.help)
            .fromfile_prefix(self.fromfile_prefix)
            .extract(&self.ctx())
    }

    pub fn parse_env(&self) -> Result<Extraction> {
        self.env.extract(&self.ctx())
    }

    pub fn parse_secrets(&self) -> Result<Extraction> {
        let mut source = SecretSource::new(Arc::clone(&self.secret_store));
        if let Some(namespace) = &self.secret_namespace {
            source = source.with_namespace(namespace.clone());
        }
        source.extract(&self.ctx())
    }

    pub fn parse_ini(&self) -> Result<Extraction> {
        FileSource::new(self.ini_search_path()?).extract(&self.ctx())
    }

    /// `{program}.ini` in the working directory.
    pub fn default_ini(&self) -> NormalizedPath {
        self.working_dir.join(&format!("{}.ini", self.program))
    }

    /// INI files to read, lowest precedence first: the implicit
    /// `{program}.ini` when it exists and is not listed elsewhere, the
    /// configured paths, then paths found by the bootstrap layer.
    pub fn ini_search_path(&self) -> Result<Vec<NormalizedPath>> {
        let discovered = match &self.bootstrap {
            Some(bootstrap) => {
                bootstrap.discover(&self.program, &self.argv, &self.env, self.fromfile_prefix)?
            }
            None => Vec::new(),
        };

        let mut paths = Vec::new();
        let implicit = self.default_ini();
        if implicit.is_file() && !self.ini_paths.contains(&implicit) && !discovered.contains(&implicit)
        {
            tracing::debug!(path = %implicit, "Using implicit INI file");
            paths.push(implicit);
        }
        paths.extend(self.ini_paths.iter().cloned());
        paths.extend(discovered);
        tracing::debug!(?paths, "INI search path");
        Ok(paths)
    }

    /// Backend command in its strict form, as used for help and usage.
    pub fn command(&self) -> Result<Command> {
        let (command, _) = build_command(&self.program, &self.options, false, self.help)?;
        Ok(match &self.about {
            Some(about) => command.about(about.clone()),
            None => command,
        })
    }

    pub fn render_help(&self) -> Result<String> {
        Ok(self.command()?.render_help().to_string())
    }

    /// Merge every source and validate the result.
    pub fn resolve(&self) -> Result<Config> {
        // The command line goes first so help and usage errors are not
        // masked by problems in files
        let cli = self.parse_cli()?;
        let defaults = self.defaults()?;
        let file = self.parse_ini()?;
        let secrets = self.parse_secrets()?;
        let env = self.parse_env()?;

        let mut values: BTreeMap<String, Value> = BTreeMap::new();
        let mut sources: BTreeMap<String, Source> = BTreeMap::new();
        let mut supplied: Vec<BTreeSet<usize>> = Vec::new();

        for extraction in [&defaults, &file, &secrets, &env, &cli] {
            let mut writers = BTreeSet::new();
            for (identity, entry) in &extraction.values {
                if entry.source != Source::Default {
                    writers.extend(entry.writers.iter().copied());
                }
                tracing::debug!(%identity, source = %entry.source, "Merged value");
                values.insert(identity.clone(), entry.value.clone());
                sources.insert(identity.clone(), entry.source.clone());
            }
            if !writers.is_empty() {
                supplied.push(writers);
            }
        }

        validate(&self.options, &self.registry, &values, &supplied)?;
        Ok(Config::from_parts(values, sources, cli.pass_thru_args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types;

    fn resolver(argv: &[&str]) -> Resolver {
        Resolver::builder()
            .program("app")
            .argv(argv.iter().copied())
            .env(EnvSource::default())
            .working_dir(NormalizedPath::new("/nonexistent-simpl-dir"))
            .option(ConfigOption::new(["--retries"]).coerce(types::integer()).default_value(3))
            .build()
            .unwrap()
    }

    #[test]
    fn program_defaults_to_argv0_stem() {
        let resolver = Resolver::builder()
            .argv(["/usr/bin/my-tool", "--x"])
            .env(EnvSource::default())
            .build()
            .unwrap();
        assert_eq!(resolver.program(), "my-tool");
    }

    #[test]
    fn bootstrap_ini_option_is_appended() {
        let resolver = resolver(&["app"]);
        assert!(resolver.options().iter().any(|o| o.name() == "ini"));
    }

    #[test]
    fn resolve_records_provenance() {
        let config = resolver(&["app", "--retries", "5"]).resolve().unwrap();
        assert_eq!(config.get_i64("retries"), Some(5));
        assert_eq!(config.source("retries"), Some(&Source::CommandLine));
        assert_eq!(config.source("ini"), Some(&Source::Default));
    }

    #[test]
    fn help_mentions_declared_options() {
        let help = resolver(&["app"]).render_help().unwrap();
        assert!(help.contains("--retries"), "help: {help}");
        assert!(help.contains("initialization (metaconfig) arguments"), "help: {help}");
    }

    #[test]
    fn definition_errors_surface_at_build() {
        let err = Resolver::builder()
            .program("app")
            .argv(["app"])
            .option(ConfigOption::new(["--more"]).mutually_exclusive(true))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Definition);
    }
}

//! Declarative option model.
//!
//! A [`ConfigOption`] describes one configurable value: the command-line
//! names it answers to, how raw text is coerced, its default, and the
//! engine-level bindings (environment variable, INI section, groups) the
//! argument backend never sees.

use clap::{Arg, ArgAction, Command};
use serde_json::Value;

use crate::registry::GroupRegistry;
use crate::types::{self, Coercion};
use crate::{Error, Result};

/// What the command line does with an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgKind {
    /// Takes one value; repeated use keeps the last
    #[default]
    Set,
    /// Flag storing `true`, defaulting to `false`
    SetTrue,
    /// Flag storing `false`, defaulting to `true`
    SetFalse,
    /// Takes one value per occurrence and collects them into a list
    Append,
    /// Counts occurrences
    Count,
}

impl ArgKind {
    pub fn takes_value(self) -> bool {
        matches!(self, ArgKind::Set | ArgKind::Append)
    }
}

/// Settings passed through to the argument backend untouched.
#[derive(Debug, Clone, Default)]
pub struct ArgSettings {
    pub help: Option<String>,
    pub metavar: Option<String>,
    pub kind: ArgKind,
    pub hidden: bool,
}

/// One configurable value and the places it may come from.
#[derive(Debug, Clone)]
pub struct ConfigOption {
    names: Vec<String>,
    dest: Option<String>,
    coercion: Option<Coercion>,
    default: Option<Value>,
    required: bool,
    env: Option<String>,
    file_section: Option<String>,
    group: Option<String>,
    group_description: Option<String>,
    mutually_exclusive: bool,
    settings: ArgSettings,
}

impl ConfigOption {
    /// Declare an option from its command-line names, e.g. `["-k", "--key"]`,
    /// or a single positional name such as `["target"]`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            dest: None,
            coercion: None,
            default: None,
            required: false,
            env: None,
            file_section: None,
            group: None,
            group_description: None,
            mutually_exclusive: false,
            settings: ArgSettings::default(),
        }
    }

    /// Store the value under `dest` instead of the derived name.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn coerce(mut self, coercion: Coercion) -> Self {
        self.coercion = Some(coercion);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Environment variable consulted before `{PROGRAM}_{NAME}`.
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }

    /// INI section consulted before the program's own section.
    pub fn file_section(mut self, section: impl Into<String>) -> Self {
        self.file_section = Some(section.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn group_description(mut self, description: impl Into<String>) -> Self {
        self.group_description = Some(description.into());
        self
    }

    /// At most one member of the group may be supplied. The group is the
    /// explicit `group`, or the destination when no group is given.
    pub fn mutually_exclusive(mut self, mutually_exclusive: bool) -> Self {
        self.mutually_exclusive = mutually_exclusive;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.settings.help = Some(help.into());
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.settings.metavar = Some(metavar.into());
        self
    }

    pub fn action(mut self, kind: ArgKind) -> Self {
        self.settings.kind = kind;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.settings.hidden = hidden;
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names starting with `-`.
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|n| n.starts_with('-'))
    }

    pub fn is_positional(&self) -> bool {
        self.flags().next().is_none()
    }

    /// Key used for environment, INI and secret lookups: the first long
    /// flag without dashes (`--key-file` gives `key_file`), else the
    /// positional name, else the first short flag.
    pub fn name(&self) -> String {
        let long = self.names.iter().find(|n| n.starts_with("--"));
        let positional = self.names.iter().find(|n| !n.starts_with('-'));
        let chosen = long
            .or(positional)
            .or_else(|| self.names.first())
            .map(String::as_str)
            .unwrap_or_default();
        chosen.trim_start_matches('-').replace('-', "_")
    }

    /// Destination the resolved value is stored under.
    pub fn identity(&self) -> String {
        self.dest.clone().unwrap_or_else(|| self.name())
    }

    pub fn explicit_dest(&self) -> Option<&str> {
        self.dest.as_deref()
    }

    /// How the option is shown in messages: its flags joined with `/`.
    pub fn display_name(&self) -> String {
        if self.is_positional() {
            self.name()
        } else {
            self.flags().collect::<Vec<_>>().join("/")
        }
    }

    /// Explicit coercion, or the one implied by the action.
    pub fn coercion(&self) -> Coercion {
        match (&self.coercion, self.settings.kind) {
            (Some(c), _) => c.clone(),
            (None, ArgKind::SetTrue | ArgKind::SetFalse) => types::boolean(),
            (None, ArgKind::Count) => types::integer(),
            (None, _) => types::string(),
        }
    }

    /// Declared default, or the one implied by the action.
    pub fn default(&self) -> Option<Value> {
        match (&self.default, self.settings.kind) {
            (Some(v), _) => Some(v.clone()),
            (None, ArgKind::SetTrue) => Some(Value::Bool(false)),
            (None, ArgKind::SetFalse) => Some(Value::Bool(true)),
            (None, _) => None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn env_var(&self) -> Option<&str> {
        self.env.as_deref()
    }

    /// Environment variables to consult, in order.
    pub fn env_names(&self, program: &str) -> Vec<String> {
        let derived = format!("{}_{}", env_prefix(program), self.name().to_uppercase());
        self.env
            .iter()
            .cloned()
            .chain(std::iter::once(derived))
            .collect()
    }

    pub fn section(&self) -> Option<&str> {
        self.file_section.as_deref()
    }

    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.group_description.as_deref()
    }

    pub fn is_mutually_exclusive(&self) -> bool {
        self.mutually_exclusive
    }

    pub fn kind(&self) -> ArgKind {
        self.settings.kind
    }

    /// Check that the declaration itself is well formed.
    pub fn validate(&self) -> Result<()> {
        if self.names.is_empty() || self.names.iter().any(|n| n.trim_start_matches('-').is_empty())
        {
            return Err(Error::InvalidOption {
                option: format!("{:?}", self.names),
                message: "every option needs at least one non-empty name".into(),
            });
        }
        if self.is_positional() && self.names.len() > 1 {
            return Err(Error::InvalidOption {
                option: self.names.join(", "),
                message: "a positional option takes exactly one name".into(),
            });
        }
        if let Some(name) = self.names.iter().find(|n| !n.starts_with('-')) {
            if !self.is_positional() {
                return Err(Error::InvalidOption {
                    option: self.display_name(),
                    message: format!("cannot mix flags with positional name {name:?}"),
                });
            }
        }
        for short in self.flags().filter(|f| !f.starts_with("--")) {
            if short.chars().count() != 2 {
                return Err(Error::InvalidOption {
                    option: self.display_name(),
                    message: format!("short flag {short:?} must be a single character"),
                });
            }
        }
        if self.is_positional() && !matches!(self.kind(), ArgKind::Set | ArgKind::Append) {
            return Err(Error::InvalidOption {
                option: self.display_name(),
                message: "positional options must take a value".into(),
            });
        }
        Ok(())
    }

    /// Backend argument id. Names are unique per resolver.
    pub(crate) fn arg_id(&self) -> String {
        self.name()
    }

    /// Register this option with the argument backend.
    ///
    /// Engine-level settings are stripped or translated: the environment
    /// variable shows up in help, plain groups become help headings and
    /// mutual exclusion is recorded in `registry` and mirrored as a backend
    /// group. In `permissive` mode nothing is marked required.
    pub fn declare(
        &self,
        index: usize,
        command: Command,
        registry: &mut GroupRegistry,
        permissive: bool,
    ) -> Result<Command> {
        let mut arg = Arg::new(self.arg_id());

        let mut longs = self.flags().filter(|f| f.starts_with("--"));
        let mut shorts = self
            .flags()
            .filter(|f| !f.starts_with("--"))
            .filter_map(|f| f.chars().nth(1));
        if let Some(long) = longs.next() {
            arg = arg.long(long.trim_start_matches('-').to_string());
        }
        for alias in longs {
            arg = arg.visible_alias(alias.trim_start_matches('-').to_string());
        }
        if let Some(short) = shorts.next() {
            arg = arg.short(short);
        }
        for alias in shorts {
            arg = arg.visible_short_alias(alias);
        }

        arg = match self.settings.kind {
            ArgKind::Set => arg.action(ArgAction::Set).num_args(1),
            ArgKind::Append if self.is_positional() => arg.action(ArgAction::Append).num_args(1..),
            ArgKind::Append => arg.action(ArgAction::Append).num_args(1),
            ArgKind::SetTrue => arg.action(ArgAction::SetTrue),
            ArgKind::SetFalse => arg.action(ArgAction::SetFalse),
            ArgKind::Count => arg.action(ArgAction::Count),
        };
        if self.settings.kind.takes_value() {
            arg = if self.is_positional() {
                arg.allow_negative_numbers(true)
            } else {
                arg.allow_hyphen_values(true)
            };
        }

        let help = match (&self.settings.help, &self.env) {
            (Some(help), Some(env)) => Some(format!("{help} (or set {env})")),
            (Some(help), None) => Some(help.clone()),
            (None, Some(env)) => Some(format!("(or set {env})")),
            (None, None) => None,
        };
        if let Some(help) = help {
            arg = arg.help(help);
        }
        if let Some(metavar) = &self.settings.metavar {
            arg = arg.value_name(metavar.clone());
        }
        // Defaults are only shown in help; they are merged by the resolver
        if !permissive && !self.required && self.settings.kind.takes_value() {
            match &self.default {
                Some(Value::String(s)) => arg = arg.default_value(s.clone()),
                Some(Value::Null) | None => {}
                Some(other) => arg = arg.default_value(other.to_string()),
            }
        }
        arg = arg.hide(self.settings.hidden);

        let membership = registry.register(index, self)?;
        if let Some(heading) = membership.heading {
            arg = arg.help_heading(heading);
        }
        if !permissive && self.required && membership.mutex.is_none() {
            arg = arg.required(true);
        }

        Ok(command.arg(arg))
    }
}

/// `my-app` gives `MY_APP`.
pub fn env_prefix(program: &str) -> String {
    program
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

//! Declaration checks and the argument backend command.

use std::collections::{BTreeMap, BTreeSet};

use clap::Command;

use crate::option::{ArgKind, ConfigOption};
use crate::registry::GroupRegistry;
use crate::{Error, Result};

/// Reject option lists that cannot be resolved unambiguously.
pub fn check_declarations(options: &[ConfigOption]) -> Result<()> {
    let mut names = BTreeSet::new();
    let mut flags = BTreeSet::new();
    let mut identities: BTreeMap<String, &ConfigOption> = BTreeMap::new();

    for option in options {
        option.validate()?;

        if !names.insert(option.name()) {
            return Err(Error::DuplicateOption {
                name: option.name(),
            });
        }
        for flag in option.flags() {
            if !flags.insert(flag.to_string()) {
                return Err(Error::DuplicateOption {
                    name: flag.to_string(),
                });
            }
        }

        let identity = option.identity();
        match identities.get(&identity) {
            Some(first) if !first.coercion().kind().is_compatible(option.coercion().kind()) => {
                return Err(Error::ConflictingCoercion {
                    identity,
                    first: first.display_name(),
                    first_kind: first.coercion().kind().to_string(),
                    second: option.display_name(),
                    second_kind: option.coercion().kind().to_string(),
                });
            }
            Some(_) => {}
            None => {
                identities.insert(identity, option);
            }
        }
    }

    let positionals: Vec<&ConfigOption> = options.iter().filter(|o| o.is_positional()).collect();
    if let Some((_, earlier)) = positionals.split_last() {
        if let Some(multi) = earlier.iter().find(|o| o.kind() == ArgKind::Append) {
            return Err(Error::InvalidOption {
                option: multi.display_name(),
                message: "only the last positional option may collect several values".into(),
            });
        }
    }
    let mut seen_optional = false;
    for option in positionals {
        if option.is_required() && seen_optional {
            return Err(Error::InvalidOption {
                option: option.display_name(),
                message: "a required positional option cannot follow an optional one".into(),
            });
        }
        seen_optional |= !option.is_required();
    }
    Ok(())
}

/// Whether the backend should provide `-h/--help`.
pub(crate) fn help_flag_enabled(options: &[ConfigOption], help: bool) -> bool {
    help && !options
        .iter()
        .any(|o| o.flags().any(|f| f == "-h" || f == "--help"))
}

/// Build the backend command for `options`.
///
/// `permissive` builds the command used for parsing: nothing is required
/// and groups never reject combinations, since values may still arrive from
/// other sources. The strict form is used for help and usage output.
pub fn build_command(
    program: &str,
    options: &[ConfigOption],
    permissive: bool,
    help: bool,
) -> Result<(Command, GroupRegistry)> {
    let mut registry = GroupRegistry::new();
    let mut command = Command::new(program.to_string())
        .args_override_self(true)
        .disable_version_flag(true);
    if !help_flag_enabled(options, help) {
        command = command.disable_help_flag(true);
    }

    for (index, option) in options.iter().enumerate() {
        command = option.declare(index, command, &mut registry, permissive)?;
    }
    let command = registry.apply(command, permissive);
    Ok((command, registry))
}

//! Group registry built once per declaration pass.
//!
//! Display groups only affect help headings. Mutual-exclusion groups are
//! keyed by the option's `group`, or by its destination when no group is
//! given, and remember whether any member asked to be required.

use std::collections::BTreeMap;

use clap::{ArgGroup, Command};

use crate::option::ConfigOption;
use crate::{Error, Result};

/// A set of options of which at most one (or exactly one) may be supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutexGroup {
    pub name: String,
    /// Set when any member was declared required.
    pub required: bool,
    /// Indices into the resolver's option list.
    pub members: Vec<usize>,
}

/// How one option was placed in groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    pub heading: Option<String>,
    pub mutex: Option<String>,
}

#[derive(Debug, Default)]
pub struct GroupRegistry {
    descriptions: BTreeMap<String, String>,
    mutex: BTreeMap<String, MutexGroup>,
    by_option: BTreeMap<usize, String>,
    arg_ids: BTreeMap<usize, String>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` (at `index` in the option list) in its groups.
    pub fn register(&mut self, index: usize, option: &ConfigOption) -> Result<Membership> {
        self.arg_ids.insert(index, option.arg_id());

        let display = option.group_name().map(str::to_string);
        if let (Some(group), Some(description)) = (&display, option.description()) {
            self.descriptions
                .entry(group.clone())
                .or_insert_with(|| description.to_string());
        }

        let mut membership = Membership {
            heading: display.clone(),
            mutex: None,
        };

        if option.is_mutually_exclusive() {
            let name = display
                .or_else(|| option.explicit_dest().map(str::to_string))
                .ok_or_else(|| Error::NoGroupForOption {
                    option: option.display_name(),
                })?;
            let group = self.mutex.entry(name.clone()).or_insert_with(|| MutexGroup {
                name: name.clone(),
                ..MutexGroup::default()
            });
            // A required member makes the whole group require one member
            group.required |= option.is_required();
            if !group.members.contains(&index) {
                group.members.push(index);
            }
            self.by_option.insert(index, name.clone());
            membership.heading.get_or_insert_with(|| name.clone());
            membership.mutex = Some(name);
        }

        if let Some(heading) = &membership.heading {
            if let Some(description) = self.descriptions.get(heading) {
                membership.heading = Some(format!("{heading} ({description})"));
            }
        }
        Ok(membership)
    }

    /// Mutual-exclusion group the option at `index` belongs to.
    pub fn mutex_for(&self, index: usize) -> Option<&MutexGroup> {
        self.by_option.get(&index).and_then(|name| self.mutex.get(name))
    }

    pub fn mutex_groups(&self) -> impl Iterator<Item = &MutexGroup> {
        self.mutex.values()
    }

    /// Mirror the mutual-exclusion groups on the backend command.
    ///
    /// Group ids are prefixed so they never collide with argument ids. The
    /// backend only enforces them in strict mode; the resolver validates
    /// the merged result in every mode.
    pub fn apply(&self, mut command: Command, permissive: bool) -> Command {
        for group in self.mutex.values() {
            let ids: Vec<String> = group
                .members
                .iter()
                .filter_map(|idx| self.arg_ids.get(idx).cloned())
                .collect();
            command = command.group(
                ArgGroup::new(format!("group:{}", group.name))
                    .args(ids)
                    .multiple(permissive)
                    .required(group.required && !permissive),
            );
        }
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutex_group_defaults_to_dest() {
        let mut registry = GroupRegistry::new();
        let more = ConfigOption::new(["--more"]).mutually_exclusive(true).dest("more");
        let less = ConfigOption::new(["--less"]).mutually_exclusive(true).dest("more");
        registry.register(0, &more).unwrap();
        registry.register(1, &less).unwrap();

        let group = registry.mutex_for(1).unwrap();
        assert_eq!(group.name, "more");
        assert_eq!(group.members, vec![0, 1]);
    }

    #[test]
    fn mutex_without_group_or_dest_is_a_definition_error() {
        let mut registry = GroupRegistry::new();
        let opt = ConfigOption::new(["--more"]).mutually_exclusive(true);
        let err = registry.register(0, &opt).unwrap_err();
        assert!(matches!(err, Error::NoGroupForOption { .. }));
    }

    #[test]
    fn required_member_makes_group_required() {
        let mut registry = GroupRegistry::new();
        let key = ConfigOption::new(["--key"])
            .group("secret")
            .mutually_exclusive(true)
            .required(true);
        let key_file = ConfigOption::new(["--key-file"])
            .group("secret")
            .mutually_exclusive(true);
        registry.register(0, &key).unwrap();
        registry.register(1, &key_file).unwrap();

        assert!(registry.mutex_for(1).unwrap().required);
        assert_eq!(registry.mutex_groups().count(), 1);
    }

    #[test]
    fn plain_group_only_sets_heading() {
        let mut registry = GroupRegistry::new();
        let opt = ConfigOption::new(["--this"])
            .group("things")
            .group_description("grouped for help");
        let membership = registry.register(0, &opt).unwrap();

        assert_eq!(membership.heading.as_deref(), Some("things (grouped for help)"));
        assert!(membership.mutex.is_none());
        assert!(registry.mutex_for(0).is_none());
    }
}

//! Checks run on the merged result.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::option::ConfigOption;
use crate::registry::GroupRegistry;
use crate::{Error, Result};

/// Validate merged `values`.
///
/// `supplied` holds, per non-default source, the indices of the options
/// that wrote a value. Members of one mutex group conflict only when the
/// same source supplies more than one of them; across sources the higher
/// precedence value has already won.
pub fn validate(
    options: &[ConfigOption],
    registry: &GroupRegistry,
    values: &BTreeMap<String, Value>,
    supplied: &[BTreeSet<usize>],
) -> Result<()> {
    let populated = |option: &ConfigOption| -> bool {
        values
            .get(&option.identity())
            .is_some_and(|v| !v.is_null())
    };

    for (index, option) in options.iter().enumerate() {
        if option.is_required() && registry.mutex_for(index).is_none() && !populated(option) {
            return Err(Error::MissingRequired {
                name: option.name(),
            });
        }
    }

    for group in registry.mutex_groups() {
        let members: Vec<&ConfigOption> = group
            .members
            .iter()
            .filter_map(|&idx| options.get(idx))
            .collect();

        for writers in supplied {
            let given: Vec<String> = group
                .members
                .iter()
                .filter(|idx| writers.contains(*idx))
                .filter_map(|&idx| options.get(idx))
                .map(ConfigOption::display_name)
                .collect();
            if given.len() > 1 {
                return Err(Error::MutuallyExclusive {
                    group: group.name.clone(),
                    options: given,
                });
            }
        }

        if group.required && !members.iter().any(|&o| populated(o)) {
            return Err(Error::MissingOneOf {
                group: group.name.clone(),
                options: members.iter().map(|o| o.display_name()).collect(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup(options: &[ConfigOption]) -> GroupRegistry {
        let mut registry = GroupRegistry::new();
        for (index, option) in options.iter().enumerate() {
            registry.register(index, option).unwrap();
        }
        registry
    }

    fn key_options(required: bool) -> Vec<ConfigOption> {
        vec![
            ConfigOption::new(["--key"])
                .group("secret")
                .mutually_exclusive(true)
                .required(required),
            ConfigOption::new(["--key-file"])
                .dest("key")
                .group("secret")
                .mutually_exclusive(true),
        ]
    }

    #[test]
    fn required_option_must_be_populated() {
        let options = [ConfigOption::new(["--region"]).required(true)];
        let registry = setup(&options);
        let values = BTreeMap::from([("region".to_string(), Value::Null)]);

        let err = validate(&options, &registry, &values, &[]).unwrap_err();

        assert_eq!(err.to_string(), "'region' is required. See --help for more info.");
    }

    #[test]
    fn two_supplied_members_conflict() {
        let options = key_options(false);
        let registry = setup(&options);
        let values = BTreeMap::from([("key".to_string(), json!("b"))]);

        let err = validate(&options, &registry, &values, &[BTreeSet::from([0, 1])]).unwrap_err();

        assert_eq!(
            err.to_string(),
            "--key and --key-file are mutually exclusive. See --help for more info."
        );
    }

    #[test]
    fn members_from_different_sources_do_not_conflict() {
        let options = key_options(false);
        let registry = setup(&options);
        let values = BTreeMap::from([("key".to_string(), json!("pem"))]);

        validate(
            &options,
            &registry,
            &values,
            &[BTreeSet::from([0]), BTreeSet::from([1])],
        )
        .unwrap();
    }

    #[test]
    fn required_group_needs_one_member() {
        let options = key_options(true);
        let registry = setup(&options);
        let values = BTreeMap::from([("key".to_string(), Value::Null)]);

        let err = validate(&options, &registry, &values, &[]).unwrap_err();

        assert_eq!(
            err.to_string(),
            "One of --key, --key-file required. See --help for more info."
        );
    }

    #[test]
    fn required_group_satisfied_by_one_member() {
        let options = key_options(true);
        let registry = setup(&options);
        let values = BTreeMap::from([("key".to_string(), json!("a"))]);

        validate(&options, &registry, &values, &[BTreeSet::from([1])]).unwrap();
    }
}

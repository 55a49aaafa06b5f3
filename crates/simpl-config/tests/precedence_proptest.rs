//! Property tests for source precedence.

use std::fs;

use proptest::prelude::*;
use simpl_config::{ConfigOption, EnvSource, Resolver, types};
use simpl_fs::NormalizedPath;
use tempfile::TempDir;

fn resolve_port(
    default: i64,
    file: Option<i64>,
    env: Option<i64>,
    cli: Option<i64>,
) -> Option<i64> {
    let dir = TempDir::new().unwrap();
    if let Some(value) = file {
        fs::write(dir.path().join("app.ini"), format!("[app]\nport = {value}\n")).unwrap();
    }
    let mut argv = vec!["app".to_string()];
    if let Some(value) = cli {
        argv.push(format!("--port={value}"));
    }
    let env = match env {
        Some(value) => EnvSource::from_map([("APP_PORT", value.to_string())]),
        None => EnvSource::default(),
    };

    Resolver::builder()
        .program("app")
        .argv(argv)
        .env(env)
        .working_dir(NormalizedPath::new(dir.path()))
        .option(
            ConfigOption::new(["--port"])
                .coerce(types::integer())
                .default_value(default),
        )
        .build()
        .unwrap()
        .resolve()
        .unwrap()
        .get_i64("port")
}

proptest! {
    #[test]
    fn highest_supplied_source_wins(
        default in any::<i64>(),
        file in proptest::option::of(any::<i64>()),
        env in proptest::option::of(any::<i64>()),
        cli in proptest::option::of(any::<i64>()),
    ) {
        let expected = cli.or(env).or(file).unwrap_or(default);
        prop_assert_eq!(resolve_port(default, file, env, cli), Some(expected));
    }

    #[test]
    fn defaults_resolve_unchanged(
        values in proptest::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,12}", 0..6)
    ) {
        let dir = TempDir::new().unwrap();
        let options = values
            .iter()
            .map(|(name, value)| ConfigOption::new([format!("--{name}")]).default_value(value.as_str()));

        let config = Resolver::builder()
            .program("app")
            .argv(["app"])
            .env(EnvSource::default())
            .working_dir(NormalizedPath::new(dir.path()))
            .without_bootstrap()
            .options(options)
            .build()
            .unwrap()
            .resolve()
            .unwrap();

        prop_assert_eq!(config.len(), values.len());
        for (name, value) in &values {
            prop_assert_eq!(config.get_str(name), Some(value.as_str()));
        }
    }
}

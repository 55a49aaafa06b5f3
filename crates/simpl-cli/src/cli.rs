//! Option declarations for the demo command.

use simpl_config::{ArgKind, ConfigOption, types};

pub const PROGRAM: &str = "simpl";

pub const ABOUT: &str = "Resolve settings from the command line, environment, INI files and a \
                         secret store, then print them with their sources";

/// Where secrets are read from unless `--secrets` says otherwise.
pub fn default_secrets_path() -> Option<String> {
    dirs::config_dir().map(|dir| {
        dir.join(PROGRAM)
            .join("secrets.toml")
            .to_string_lossy()
            .into_owned()
    })
}

/// `--secrets PATH`, discovered ahead of the main resolution.
pub fn secrets_option() -> ConfigOption {
    ConfigOption::new(["--secrets"])
        .coerce(types::normalized_path())
        .metavar("PATH")
        .help("TOML file with one [namespace] table of secrets")
}

pub fn options() -> Vec<ConfigOption> {
    vec![
        ConfigOption::new(["target"])
            .default_value("all")
            .help("What to operate on"),
        ConfigOption::new(["-v", "--verbose"])
            .action(ArgKind::SetTrue)
            .help("Show where every value came from"),
        ConfigOption::new(["--json"])
            .action(ArgKind::SetTrue)
            .help("Print the resolved values as JSON"),
        ConfigOption::new(["-r", "--retries"])
            .coerce(types::integer())
            .default_value(3)
            .metavar("N")
            .help("Number of attempts"),
        ConfigOption::new(["--endpoint"])
            .env("SIMPL_API_URL")
            .metavar("URL")
            .help("Service endpoint"),
        ConfigOption::new(["--token"])
            .group("credentials")
            .group_description("give at most one")
            .mutually_exclusive(true)
            .help("API token"),
        ConfigOption::new(["--token-file"])
            .dest("token")
            .coerce(types::read_from())
            .group("credentials")
            .mutually_exclusive(true)
            .metavar("PATH")
            .help("Read the API token from a file"),
        ConfigOption::new(["--password"]).hidden(true),
        ConfigOption::new(["--tags"])
            .coerce(types::comma_separated_strings())
            .metavar("A,B")
            .help("Comma separated tags"),
        secrets_option(),
    ]
}

//! simpl-config demo command
//!
//! Resolves its own settings through simpl-config and prints them, which
//! makes it handy for checking how a given mix of flags, variables and INI
//! files is merged.

mod cli;
mod error;

use std::sync::Arc;

use colored::Colorize;
use serde_json::{Value, json};
use simpl_config::{
    BootstrapResolver, Config, EnvSource, ErrorKind, Resolver, TomlSecretStore,
    hide_url_password,
};
use simpl_fs::NormalizedPath;
use tracing_subscriber::EnvFilter;

use error::{CliError, Result};

const LOG_ENV: &str = "SIMPL_LOG";
const REDACTED: &str = "*****";

fn main() {
    init_tracing();

    let argv: Vec<String> = std::env::args().collect();
    if let Err(e) = run(argv) {
        match e {
            CliError::Config(simpl_config::Error::Cli(clap_err)) => clap_err.exit(),
            e => {
                eprintln!("{}: {}", "error".red().bold(), e);
                std::process::exit(e.exit_code());
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second initialization is harmless; keep whichever came first
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn run(argv: Vec<String>) -> Result<()> {
    let env = EnvSource::from_process();

    let secrets = BootstrapResolver::new(vec![cli::secrets_option()])
        .discover(cli::PROGRAM, &argv, &env, Some('@'))?
        .pop()
        .map(|path| path.to_string())
        .or_else(cli::default_secrets_path);
    tracing::debug!(secrets = ?secrets, "Secret store file");

    let mut builder = Resolver::builder()
        .program(cli::PROGRAM)
        .about(cli::ABOUT)
        .argv(argv)
        .env(env)
        .options(cli::options());
    if let Some(path) = secrets {
        builder = builder.secret_store(Arc::new(TomlSecretStore::new(NormalizedPath::new(path))));
    }
    let resolver = builder.build()?;

    let config = match resolver.resolve() {
        Ok(config) => config,
        Err(e) if e.kind() == ErrorKind::Display => {
            print!("{}", resolver.render_help()?);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if config.get_bool("json").unwrap_or(false) {
        println!("{}", serde_json::to_string_pretty(&report(&config))?);
        return Ok(());
    }

    let shown = redacted(&config);
    println!("{shown}");
    if config.get_bool("verbose").unwrap_or(false) {
        for (key, source) in config.sources() {
            println!("  {:<12} {}", key.cyan(), source);
        }
    }
    if !config.pass_thru_args().is_empty() {
        println!("pass-through: {}", config.pass_thru_args().join(" "));
    }
    Ok(())
}

/// Copy of `config` safe to print: secrets masked, URL passwords hidden.
fn redacted(config: &Config) -> Config {
    let mut shown = config.clone();
    for key in ["token", "password"] {
        if config.is_set(key) {
            shown.insert(key, REDACTED);
        }
    }
    if let Some(endpoint) = config.get_str("endpoint") {
        shown.insert("endpoint", hide_url_password(endpoint));
    }
    shown
}

fn report(config: &Config) -> Value {
    let shown = redacted(config);
    let sources: serde_json::Map<String, Value> = config
        .sources()
        .iter()
        .map(|(key, source)| (key.clone(), Value::from(source.label())))
        .collect();
    json!({
        "values": shown.into_values(),
        "sources": sources,
        "pass_thru_args": config.pass_thru_args(),
    })
}

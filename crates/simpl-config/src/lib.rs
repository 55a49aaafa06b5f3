//! Multi-source configuration resolution
//!
//! Options are declared once and resolved from several sources, merged in
//! precedence order (lowest first):
//!
//! 1. Declared defaults
//! 2. INI files (`{program}.ini`, configured paths, `--ini` paths)
//! 3. A secret store
//! 4. Environment variables (`env`, then `{PROGRAM}_{NAME}`)
//! 5. Command-line arguments
//!
//! ```no_run
//! use simpl_config::{ConfigOption, Resolver, types};
//!
//! let config = Resolver::builder()
//!     .program("app")
//!     .option(ConfigOption::new(["--retries"]).coerce(types::integer()).default_value(3))
//!     .option(ConfigOption::new(["-k", "--key"]).required(true).env("APP_KEY"))
//!     .build()?
//!     .resolve()?;
//! let retries = config.get_i64("retries");
//! # Ok::<(), simpl_config::Error>(())
//! ```

pub mod argv;
pub mod bootstrap;
pub mod command;
pub mod config;
pub mod error;
pub mod option;
pub mod registry;
pub mod resolver;
pub mod secrets;
pub mod sources;
pub mod types;
pub mod validate;

pub use bootstrap::{BootstrapResolver, ini_option};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use option::{ArgKind, ArgSettings, ConfigOption};
pub use registry::{GroupRegistry, MutexGroup};
pub use resolver::{Resolver, ResolverBuilder};
pub use secrets::{
    MemorySecretStore, NoSecretStore, SecretStore, SecretStoreError, TomlSecretStore,
    hide_url_password,
};
pub use serde_json::Value;
pub use sources::{EnvSource, Extraction, Source};
pub use types::{Coercion, ValueKind};

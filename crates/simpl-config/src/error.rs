//! Error types for simpl-config

use crate::sources::Source;

/// Result type for simpl-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification used to pick an exit status and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The option declarations themselves are wrong. A programming mistake.
    Definition,
    /// The user supplied missing, conflicting or malformed values.
    UserInput,
    /// Not a failure: the backend wants to display help text.
    Display,
}

/// Errors that can occur while declaring options or resolving a configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Mutually exclusive option with neither a group nor a destination
    #[error("{option} is mutually exclusive and requires either a 'group' or a 'dest'")]
    NoGroupForOption { option: String },

    #[error("Invalid option {option}: {message}")]
    InvalidOption { option: String, message: String },

    #[error("Option {name:?} is declared more than once")]
    DuplicateOption { name: String },

    /// Two options write the same destination with incompatible value kinds
    #[error(
        "Options {first} and {second} both write {identity:?} but coerce to {first_kind} and {second_kind}"
    )]
    ConflictingCoercion {
        identity: String,
        first: String,
        first_kind: String,
        second: String,
        second_kind: String,
    },

    #[error("'{name}' is required. See --help for more info.")]
    MissingRequired { name: String },

    #[error("{} are mutually exclusive. See --help for more info.", .options.join(" and "))]
    MutuallyExclusive { group: String, options: Vec<String> },

    #[error("One of {} required. See --help for more info.", .options.join(", "))]
    MissingOneOf { group: String, options: Vec<String> },

    #[error("Invalid value {value:?} for {option} from {origin}: {message}")]
    InvalidValue {
        option: String,
        value: String,
        origin: Source,
        message: String,
    },

    /// A key in a config file that no declared option reads
    #[error("Unknown key {key:?} in section [{section}] of {path} (line {line})")]
    UnknownFileKey {
        path: String,
        section: String,
        key: String,
        line: usize,
    },

    #[error("Unrecognized arguments: {}", .args.join(" "))]
    UnrecognizedArguments { args: Vec<String> },

    #[error("Argument file {path} includes itself")]
    ArgFileCycle { path: String },

    #[error("Cannot convert configuration: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// Argument parsing failure or help/version display from the backend
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// Filesystem error from simpl-fs
    #[error(transparent)]
    Fs(#[from] simpl_fs::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoGroupForOption { .. }
            | Error::InvalidOption { .. }
            | Error::DuplicateOption { .. }
            | Error::ConflictingCoercion { .. } => ErrorKind::Definition,
            Error::Cli(e) if !e.use_stderr() => ErrorKind::Display,
            _ => ErrorKind::UserInput,
        }
    }

    /// Process exit status appropriate for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Cli(e) => e.exit_code(),
            _ => match self.kind() {
                ErrorKind::Definition => 70,
                ErrorKind::UserInput => 2,
                ErrorKind::Display => 0,
            },
        }
    }
}

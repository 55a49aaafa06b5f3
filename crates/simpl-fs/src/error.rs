//! Error types for simpl-fs

use std::path::PathBuf;

/// Result type for simpl-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in simpl-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse INI file {path} at line {line}: {message}")]
    IniParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Could not determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the file simply was not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

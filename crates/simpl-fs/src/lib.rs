//! Filesystem helpers for simpl-config
//!
//! Provides normalized path handling, text reads with path-aware errors and
//! the INI document reader used by the file source.

pub mod error;
pub mod ini;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use ini::{IniDocument, IniEntry};
pub use path::NormalizedPath;

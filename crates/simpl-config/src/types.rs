//! Value coercions applied to raw strings from every source.
//!
//! A [`Coercion`] turns the text found on the command line, in the
//! environment, in an INI file or in the secret store into a typed
//! [`Value`]. Each coercion declares the [`ValueKind`] it produces so that
//! options aliasing one destination can be checked for compatibility.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use simpl_fs::{NormalizedPath, io};

type CoerceFn = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// The shape of value a coercion produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    List,
    Map,
    /// Custom coercions that may produce anything
    Any,
}

impl ValueKind {
    /// Whether values of both kinds may share one destination.
    pub fn is_compatible(self, other: ValueKind) -> bool {
        self == other || self == ValueKind::Any || other == ValueKind::Any
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Any => "any",
        };
        f.write_str(name)
    }
}

/// A named conversion from raw text to a [`Value`].
#[derive(Clone)]
pub struct Coercion {
    name: &'static str,
    kind: ValueKind,
    func: Arc<CoerceFn>,
}

impl Coercion {
    pub fn new<F>(name: &'static str, kind: ValueKind, func: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name,
            kind,
            func: Arc::new(func),
        }
    }

    pub fn apply(&self, raw: &str) -> Result<Value, String> {
        (self.func)(raw)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coercion")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Default for Coercion {
    fn default() -> Self {
        string()
    }
}

/// Keep the raw text.
pub fn string() -> Coercion {
    Coercion::new("string", ValueKind::String, |raw| Ok(Value::from(raw)))
}

pub fn integer() -> Coercion {
    Coercion::new("integer", ValueKind::Integer, |raw| {
        raw.trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("invalid integer value: {raw:?}"))
    })
}

pub fn float() -> Coercion {
    Coercion::new("float", ValueKind::Float, |raw| {
        raw.trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("invalid float value: {raw:?}"))
    })
}

/// Accepts `true/false`, `yes/no`, `on/off` and `1/0`, case-insensitively.
pub fn boolean() -> Coercion {
    Coercion::new("boolean", ValueKind::Boolean, |raw| {
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(format!("invalid boolean value: {raw:?}")),
        }
    })
}

/// Treat the raw text as a path and read the file's contents.
pub fn read_from() -> Coercion {
    Coercion::new("read_from", ValueKind::String, |raw| {
        let path = NormalizedPath::expand(raw).map_err(|e| e.to_string())?;
        if !path.exists() {
            return Err(format!("{path} is not a valid path."));
        }
        tracing::debug!(%path, "Reading option value from file");
        io::read_text(&path)
            .map(Value::from)
            .map_err(|e| e.to_string())
    })
}

/// Expand `~`, anchor relative paths at the working directory and normalize.
pub fn normalized_path() -> Coercion {
    Coercion::new("normalized_path", ValueKind::String, |raw| {
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        NormalizedPath::expand(raw)
            .map(|p| Value::from(p.as_str()))
            .map_err(|e| e.to_string())
    })
}

/// `a,b,c` becomes `["a", "b", "c"]`.
pub fn comma_separated_strings() -> Coercion {
    Coercion::new("comma_separated_strings", ValueKind::List, |raw| {
        Ok(Value::Array(raw.split(',').map(Value::from).collect()))
    })
}

/// `k=v,k2=v2` becomes `{"k": "v", "k2": "v2"}`.
pub fn comma_separated_pairs() -> Coercion {
    Coercion::new("comma_separated_pairs", ValueKind::Map, |raw| {
        let mut pairs = BTreeMap::new();
        for pair in raw.split(',') {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, found {pair:?}"))?;
            pairs.insert(key.to_string(), Value::from(value));
        }
        Ok(Value::Object(pairs.into_iter().collect()))
    })
}

/// Strip surrounding single quotes and turn literal `\n` into newlines,
/// for PEM keys passed through the environment.
pub fn parse_key_format() -> Coercion {
    Coercion::new("parse_key_format", ValueKind::String, |raw| {
        Ok(Value::from(raw.trim_matches('\'').replace("\\n", "\n")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("yes", true)]
    #[case("On", true)]
    #[case("1", true)]
    #[case("FALSE", false)]
    #[case("off", false)]
    fn boolean_accepts_common_spellings(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(boolean().apply(raw).unwrap(), Value::Bool(expected));
    }

    #[test]
    fn integer_rejects_garbage() {
        assert_eq!(integer().apply(" 42 ").unwrap(), json!(42));
        assert!(integer().apply("4x2").is_err());
    }

    #[test]
    fn float_parses_numbers() {
        assert_eq!(float().apply("2.5").unwrap(), json!(2.5));
        assert!(float().apply("NaN").is_err());
    }

    #[test]
    fn comma_separated_values() {
        assert_eq!(
            comma_separated_strings().apply("a,b").unwrap(),
            json!(["a", "b"])
        );
        assert_eq!(
            comma_separated_pairs().apply("a=1,b=2").unwrap(),
            json!({"a": "1", "b": "2"})
        );
        assert!(comma_separated_pairs().apply("a").is_err());
    }

    #[test]
    fn key_format_unescapes_newlines() {
        assert_eq!(
            parse_key_format().apply("'line1\\nline2'").unwrap(),
            json!("line1\nline2")
        );
    }

    #[test]
    fn read_from_missing_file_is_an_error() {
        let err = read_from().apply("/definitely/not/here.pem").unwrap_err();
        assert!(err.contains("is not a valid path"), "got: {err}");
    }

    #[test]
    fn read_from_returns_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.pem");
        std::fs::write(&path, "secret-key").unwrap();
        let value = read_from().apply(path.to_str().unwrap()).unwrap();
        assert_eq!(value, json!("secret-key"));
    }

    #[test]
    fn kinds_are_compatible_with_any() {
        assert!(ValueKind::String.is_compatible(ValueKind::Any));
        assert!(!ValueKind::String.is_compatible(ValueKind::Integer));
    }
}

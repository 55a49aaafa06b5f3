//! The resolved configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;
use crate::sources::Source;

/// Resolved values keyed by destination, with where each value came from.
///
/// A `Config` may be modified after resolution. Changes are not validated
/// again, and inserted values carry no provenance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: BTreeMap<String, Value>,
    sources: BTreeMap<String, Source>,
    pass_thru_args: Vec<String>,
}

static NULL: Value = Value::Null;

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        values: BTreeMap<String, Value>,
        sources: BTreeMap<String, Source>,
        pass_thru_args: Vec<String>,
    ) -> Self {
        Self {
            values,
            sources,
            pass_thru_args,
        }
    }

    /// Build a config directly, without resolving anything.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Present and not null.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        self.sources.remove(&key);
        self.values.insert(key, value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.sources.remove(key);
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Where the value for `key` came from.
    pub fn source(&self, key: &str) -> Option<&Source> {
        self.sources.get(key)
    }

    /// Provenance of every resolved value.
    pub fn sources(&self) -> &BTreeMap<String, Source> {
        &self.sources
    }

    /// Command-line tokens no option claimed, and everything after `--`.
    pub fn pass_thru_args(&self) -> &[String] {
        &self.pass_thru_args
    }

    /// Convert into a caller-defined struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let map: serde_json::Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl Index<&str> for Config {
    type Output = Value;

    /// Missing keys index to `null`.
    fn index(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&NULL)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<Config")?;
        for (idx, (key, value)) in self.values.iter().enumerate() {
            f.write_str(if idx == 0 { " " } else { ", " })?;
            match value {
                Value::String(s) => write!(f, "{key}={s}")?,
                other => write!(f, "{key}={other}")?,
            }
        }
        f.write_str(">")
    }
}

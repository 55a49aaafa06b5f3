//! Environment variables.

use std::collections::BTreeMap;

use super::{ExtractContext, Extraction, Source, SourceAdapter, coerce_scalar_source};
use crate::Result;

/// Reads `env`-bound variables, falling back to `{PROGRAM}_{NAME}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSource {
    vars: BTreeMap<String, String>,
}

impl EnvSource {
    /// Snapshot of the process environment. Variables that are not valid
    /// UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_map<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, var: &str) -> Option<&str> {
        self.vars.get(var).map(String::as_str)
    }
}

impl SourceAdapter for EnvSource {
    fn extract(&self, ctx: &ExtractContext<'_>) -> Result<Extraction> {
        let mut extraction = Extraction::new();
        for (index, option) in ctx.options.iter().enumerate() {
            let hit = option
                .env_names(ctx.program)
                .into_iter()
                .find_map(|var| self.get(&var).map(|raw| (var.clone(), raw.to_string())));

            if let Some((var, raw)) = hit {
                tracing::debug!(identity = %option.identity(), %var, "Found value in environment");
                let origin = Source::Environment { var };
                let value = coerce_scalar_source(option, &raw, &origin)?;
                extraction.insert(option.identity(), index, value, origin);
            }
        }
        Ok(extraction)
    }
}

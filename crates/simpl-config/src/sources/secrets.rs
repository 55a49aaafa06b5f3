//! Secret store lookups.

use std::sync::Arc;

use super::{ExtractContext, Extraction, Source, SourceAdapter, coerce_scalar_source};
use crate::Result;
use crate::secrets::{SecretStore, SecretStoreError};

/// Looks every option up in a [`SecretStore`] under `namespace` (the program
/// name by default). Best-effort: an unreachable or failing store yields
/// nothing.
#[derive(Clone)]
pub struct SecretSource {
    store: Arc<dyn SecretStore>,
    namespace: Option<String>,
}

impl SecretSource {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl std::fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretSource")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl SourceAdapter for SecretSource {
    fn extract(&self, ctx: &ExtractContext<'_>) -> Result<Extraction> {
        let namespace = self.namespace.as_deref().unwrap_or(ctx.program);
        let mut extraction = Extraction::new();

        for (index, option) in ctx.options.iter().enumerate() {
            let secret = match self.store.get_secret(namespace, &option.name()) {
                Ok(Some(secret)) if !secret.is_empty() => secret,
                Ok(_) => continue,
                Err(SecretStoreError::Unavailable(reason)) => {
                    tracing::debug!(%reason, "Secret store unavailable, skipping");
                    return Ok(Extraction::new());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Secret store lookup failed, skipping");
                    return Ok(Extraction::new());
                }
            };

            // Never log the secret itself
            tracing::debug!(identity = %option.identity(), %namespace, "Found value in secret store");
            let origin = Source::SecretStore {
                namespace: namespace.to_string(),
            };
            let value = coerce_scalar_source(option, &secret, &origin)?;
            extraction.insert(option.identity(), index, value, origin);
        }
        Ok(extraction)
    }
}

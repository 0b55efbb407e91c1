//! Provider Registry: maps stable provider IDs to constructors, a
//! compile-time registration table in place of runtime module
//! enumeration.

use super::{EmbeddingProvider, ProviderError};
use std::sync::Arc;

#[cfg(feature = "hosted")]
use super::hosted::model_dimension;

/// Metadata about a registered provider, available without constructing it
/// — `model list`/`model desc` need this without paying for model load or
/// requiring credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

const LOCAL_INFO: ProviderInfo = ProviderInfo {
    id: "local",
    label: "local",
    description: "Single-process local model, loaded once and cached for the life of the run.",
};

#[cfg(feature = "hosted")]
const HOSTED_IDS: &[&str] = &[
    "text-embedding-3-small",
    "text-embedding-3-large",
    "text-embedding-ada-002",
];

/// Compile-time registration table from stable ID to provider constructor.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// All registered provider IDs with their metadata, for `model list`.
    pub fn list() -> Vec<ProviderInfo> {
        let mut out = vec![LOCAL_INFO];
        #[cfg(feature = "hosted")]
        for id in HOSTED_IDS {
            out.push(ProviderInfo {
                id,
                label: id,
                description: "Hosted text-embedding API with per-item, per-batch, and aggregate token limits.",
            });
        }
        out
    }

    /// Metadata for one provider ID, for `model desc`. Returns `None` on an
    /// unknown ID rather than erroring — the CLI façade turns that into the
    /// friendly "no model found" message, not a fatal error.
    pub fn describe(id: &str) -> Option<ProviderInfo> {
        Self::list().into_iter().find(|info| info.id == id)
    }

    /// Construct the provider for `id`. This is the only place an unknown
    /// ID becomes a hard error — `embed`/`search`/`model test` all resolve
    /// a real provider before doing anything else.
    pub fn resolve(id: &str) -> Result<Arc<dyn EmbeddingProvider>, ProviderError> {
        match id {
            "local" => Ok(Arc::new(super::LocalEmbeddingProvider::new_standard())),
            #[cfg(feature = "hosted")]
            other if model_dimension(other).is_some() => {
                let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
                    ProviderError::Request(
                        "OPENAI_API_KEY must be set to use a hosted provider".to_string(),
                    )
                })?;
                let provider = super::HostedEmbeddingProvider::new(other.to_string(), api_key)?;
                Ok(Arc::new(provider))
            }
            other => Err(ProviderError::Request(format!(
                "unknown provider id '{other}'"
            ))),
        }
    }
}

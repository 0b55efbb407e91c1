//! The Embedding Provider capability: a uniform surface every embedding
//! backend (local model, hosted API) satisfies.

mod local;
mod registry;

#[cfg(feature = "hosted")]
mod hosted;

pub use local::LocalEmbeddingProvider;
pub use registry::ProviderRegistry;

#[cfg(feature = "hosted")]
pub use hosted::HostedEmbeddingProvider;

use async_trait::async_trait;
use thiserror::Error;

/// Errors the Embedding Provider capability can return. All are
/// non-retriable at the provider layer; the engine surfaces them as a
/// batch-fatal `WorkerFailure`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// A single input exceeded the provider's per-item limit (e.g. tokens).
    #[error("input exceeds provider limit of {limit}")]
    InputTooLarge { limit: usize },

    /// More items were submitted than the provider's MAX_BATCH_SIZE.
    #[error("batch of {actual} items exceeds provider limit of {limit}")]
    BatchTooLarge { limit: usize, actual: usize },

    /// An aggregate limit (e.g. total tokens per request) was exceeded.
    #[error("aggregate usage {actual} exceeds provider budget of {limit}")]
    BudgetExceeded { limit: usize, actual: usize },

    /// Transport/request-level failure talking to a hosted provider.
    #[error("provider request failed: {0}")]
    Request(String),
}

/// One (primary-key value, text) pair read by a worker for encoding.
pub type TextRow = (String, String);

/// One (primary-key value, embedding) pair produced by a provider.
pub type EmbeddingRow = (String, Vec<f32>);

/// Uniform capability surface every embedding backend satisfies.
///
/// Implementations encapsulate their own rate/size limits; the engine never
/// inspects provider internals beyond this trait.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable human name.
    fn label(&self) -> &str;

    /// Free-text description.
    fn description(&self) -> &str;

    /// Declared output dimensionality; constant for the life of the process.
    fn dimension(&self) -> usize;

    /// Encode a single string. May fail with `InputTooLarge`.
    async fn encode_one(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Encode a batch, preserving input order. May fail with
    /// `InputTooLarge`, `BatchTooLarge`, or `BudgetExceeded`.
    async fn encode_batch(
        &self,
        batch_index: u64,
        rows: &[TextRow],
        verbose: bool,
    ) -> Result<Vec<EmbeddingRow>, ProviderError>;
}

//! A local, single-process provider standing in for a cached
//! sentence-transformer model: load once, reuse across the run, no
//! per-item or batch-size limit beyond available memory.

use super::{EmbeddingProvider, EmbeddingRow, ProviderError, TextRow};
use async_trait::async_trait;

/// Default output dimensionality, matching common sentence-transformer
/// checkpoints (e.g. `all-MiniLM-L6-v2`).
pub const DEFAULT_DIMENSION: usize = 384;

/// Deterministic local provider. Computes a stable hash-derived unit vector
/// per input instead of running a real model, so the engine's concurrency
/// and retry paths can be exercised without any external dependency.
#[derive(Debug, Clone)]
pub struct LocalEmbeddingProvider {
    dimension: usize,
}

impl LocalEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn new_standard() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        let hash = text
            .bytes()
            .fold(1u32, |acc, b| acc.wrapping_add(b as u32).wrapping_mul(31));
        let base_value = ((hash % 100) + 1) as f32 / 100.0;

        for (i, val) in embedding.iter_mut().enumerate() {
            let dimension_factor = ((i + 1) as f32) / (self.dimension as f32);
            *val = base_value * dimension_factor * (if i % 2 == 0 { 1.0 } else { -1.0 });
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in embedding.iter_mut() {
                *val /= norm;
            }
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    fn label(&self) -> &str {
        "local"
    }

    fn description(&self) -> &str {
        "Single-process local model, loaded once and cached for the life of the run."
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(self.embed_one(text))
    }

    async fn encode_batch(
        &self,
        batch_index: u64,
        rows: &[TextRow],
        verbose: bool,
    ) -> Result<Vec<EmbeddingRow>, ProviderError> {
        let mut out = Vec::with_capacity(rows.len());
        for (i, (key, text)) in rows.iter().enumerate() {
            if verbose {
                let preview: String = text.chars().take(40).collect();
                println!(
                    "[INFO] (batch {batch_index}, {}/{}) Updating vector for row id {key}: '{preview}'",
                    i + 1,
                    rows.len()
                );
            }
            out.push((key.clone(), self.embed_one(text)));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dimension_matches_standard_default() {
        let provider = LocalEmbeddingProvider::new_standard();
        assert_eq!(provider.dimension(), DEFAULT_DIMENSION);
    }

    #[tokio::test]
    async fn test_embeddings_are_normalized() {
        let provider = LocalEmbeddingProvider::new_standard();
        let v = provider.encode_one("hello world").await.unwrap();
        assert_eq!(v.len(), DEFAULT_DIMENSION);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_encode_is_deterministic() {
        let provider = LocalEmbeddingProvider::new_standard();
        let a = provider.encode_one("same text").await.unwrap();
        let b = provider.encode_one("same text").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_encode_batch_preserves_order_and_keys() {
        let provider = LocalEmbeddingProvider::new_standard();
        let rows = vec![
            ("1".to_string(), "a".to_string()),
            ("2".to_string(), "b".to_string()),
            ("3".to_string(), "c".to_string()),
        ];
        let result = provider.encode_batch(0, &rows, false).await.unwrap();
        let keys: Vec<&str> = result.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["1", "2", "3"]);
    }
}

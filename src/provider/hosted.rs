//! A hosted text-embedding API provider (OpenAI-text-embed style),
//! enforcing the per-item, per-batch, and aggregate limits a real hosted
//! provider imposes.

use super::{EmbeddingProvider, EmbeddingRow, ProviderError, TextRow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Per-string token limit.
pub const PER_STRING_TOKEN_LIMIT: usize = 8191;
/// Maximum number of strings in a single request.
pub const MAX_BATCH_SIZE: usize = 2048;
/// Maximum aggregate tokens across one request.
pub const TOTAL_TOKENS_PER_REQUEST: usize = 300_000;

/// Declared dimensionality per hosted model name.
pub fn model_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        "text-embedding-ada-002" => Some(1536),
        _ => None,
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Hosted API provider. One instance per engine run, cached for its
/// lifetime (same contract as the local provider).
pub struct HostedEmbeddingProvider {
    model: String,
    dimension: usize,
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
    tokenizer: Arc<CoreBPE>,
}

impl HostedEmbeddingProvider {
    pub fn new(model: String, api_key: String) -> Result<Self, ProviderError> {
        let dimension = model_dimension(&model)
            .ok_or_else(|| ProviderError::Request(format!("unknown hosted model '{model}'")))?;
        let tokenizer = tiktoken_rs::cl100k_base()
            .map_err(|e| ProviderError::Request(format!("failed to load tokenizer: {e}")))?;
        Ok(Self {
            model,
            dimension,
            api_key,
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            client: reqwest::Client::new(),
            tokenizer: Arc::new(tokenizer),
        })
    }

    fn token_count(&self, text: &str) -> usize {
        self.tokenizer.encode_with_special_tokens(text).len()
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "hosted provider returned {status}: {text}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let mut ordered = vec![Vec::new(); texts.len()];
        for datum in parsed.data {
            if datum.index < ordered.len() {
                ordered[datum.index] = datum.embedding;
            }
        }
        Ok(ordered)
    }
}

#[async_trait]
impl EmbeddingProvider for HostedEmbeddingProvider {
    fn label(&self) -> &str {
        &self.model
    }

    fn description(&self) -> &str {
        "Hosted text-embedding API with per-item, per-batch, and aggregate token limits."
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let tokens = self.token_count(text);
        if tokens > PER_STRING_TOKEN_LIMIT {
            return Err(ProviderError::InputTooLarge {
                limit: PER_STRING_TOKEN_LIMIT,
            });
        }
        let texts = vec![text.to_string()];
        let mut embeddings = self.request_embeddings(&texts).await?;
        Ok(embeddings.remove(0))
    }

    async fn encode_batch(
        &self,
        batch_index: u64,
        rows: &[TextRow],
        verbose: bool,
    ) -> Result<Vec<EmbeddingRow>, ProviderError> {
        if rows.len() > MAX_BATCH_SIZE {
            return Err(ProviderError::BatchTooLarge {
                limit: MAX_BATCH_SIZE,
                actual: rows.len(),
            });
        }

        let mut total_tokens = 0usize;
        for (_, text) in rows {
            let tokens = self.token_count(text);
            if tokens > PER_STRING_TOKEN_LIMIT {
                return Err(ProviderError::InputTooLarge {
                    limit: PER_STRING_TOKEN_LIMIT,
                });
            }
            total_tokens += tokens;
        }
        if total_tokens > TOTAL_TOKENS_PER_REQUEST {
            return Err(ProviderError::BudgetExceeded {
                limit: TOTAL_TOKENS_PER_REQUEST,
                actual: total_tokens,
            });
        }

        if verbose {
            for (i, (key, text)) in rows.iter().enumerate() {
                let preview: String = text.chars().take(40).collect();
                println!(
                    "[INFO] (batch {batch_index}, {}/{}) Updating vector for row id {key}: '{preview}'",
                    i + 1,
                    rows.len()
                );
            }
        }

        let texts: Vec<String> = rows.iter().map(|(_, text)| text.clone()).collect();
        let embeddings = self.request_embeddings(&texts).await?;
        Ok(rows
            .iter()
            .zip(embeddings)
            .map(|((key, _), vector)| (key.clone(), vector))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dimension_known_models() {
        assert_eq!(model_dimension("text-embedding-3-small"), Some(1536));
        assert_eq!(model_dimension("text-embedding-3-large"), Some(3072));
        assert_eq!(model_dimension("text-embedding-ada-002"), Some(1536));
    }

    #[test]
    fn test_model_dimension_unknown_model() {
        assert_eq!(model_dimension("not-a-real-model"), None);
    }

    #[test]
    fn test_hosted_provider_limit_constants() {
        assert_eq!(PER_STRING_TOKEN_LIMIT, 8191);
        assert_eq!(MAX_BATCH_SIZE, 2048);
        assert_eq!(TOTAL_TOKENS_PER_REQUEST, 300_000);
    }
}

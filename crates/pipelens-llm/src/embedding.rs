//! Ollama embedding model
//!
//! Calls `POST {endpoint}/api/embeddings` with `{"model", "prompt"}` and reads
//! the `embedding` array from the reply.

use crate::LlmError;
use async_trait::async_trait;
use pipelens_domain::traits::EmbeddingModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Default timeout for embedding requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Remote embedding model served by Ollama
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingModel {
    endpoint: String,
    model: String,
    dimension: usize,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbeddingModel {
    /// Create a model producing `dimension`-sized vectors
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Other`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimension,
            client,
        })
    }

    /// Model name sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingModel for OllamaEmbeddingModel {
    type Error = LlmError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        let url = format!("{}/api/embeddings", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    LlmError::Communication(format!("Request failed: {}", e))
                }
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        let reply: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse embedding: {}", e)))?;

        if reply.embedding.len() != self.dimension {
            return Err(LlmError::InvalidResponse(format!(
                "Expected {} dimensions, got {}",
                self.dimension,
                reply.embedding.len()
            )));
        }

        Ok(reply.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let model = OllamaEmbeddingModel::new("http://localhost:11434/", DEFAULT_EMBEDDING_MODEL, 768)
            .unwrap();
        assert_eq!(model.endpoint, "http://localhost:11434");
        assert_eq!(model.model(), "nomic-embed-text");
        assert_eq!(model.dimension(), 768);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let model = OllamaEmbeddingModel::new("http://127.0.0.1:9", "m", 4).unwrap();
        assert!(matches!(
            model.embed("text").await,
            Err(LlmError::Communication(_))
        ));
    }
}

//! Runtime selection of embedding and index backends

use crate::config::{EmbeddingConfig, IndexConfig, ServerConfig};
use async_trait::async_trait;
use pipelens_domain::traits::{EmbeddingModel, RawMatch, VectorIndex, VectorRecord};
use pipelens_domain::MatchFilter;
use pipelens_llm::{LlmError, OllamaEmbeddingModel};
use pipelens_store::{EmbeddingError, HashEmbeddingModel, IndexError, MemoryIndex, PineconeIndex};
use thiserror::Error;

/// Errors from whichever embedding backend is configured
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// In-process model error
    #[error(transparent)]
    Hash(#[from] EmbeddingError),

    /// Remote model error
    #[error(transparent)]
    Ollama(#[from] LlmError),
}

/// The configured embedding model
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    /// Token-hashing model
    Hash(HashEmbeddingModel),
    /// Ollama embedding endpoint
    Ollama(OllamaEmbeddingModel),
}

impl AnyEmbedder {
    /// Build the embedder described by `config`
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbedderError> {
        Ok(match config {
            EmbeddingConfig::Hash { dimension } => AnyEmbedder::Hash(HashEmbeddingModel::new(*dimension)),
            EmbeddingConfig::Ollama {
                endpoint,
                model,
                dimension,
            } => AnyEmbedder::Ollama(OllamaEmbeddingModel::new(endpoint.as_str(), model.as_str(), *dimension)?),
        })
    }
}

#[async_trait]
impl EmbeddingModel for AnyEmbedder {
    type Error = EmbedderError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        match self {
            AnyEmbedder::Hash(model) => Ok(model.embed(text).await?),
            AnyEmbedder::Ollama(model) => Ok(model.embed(text).await?),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            AnyEmbedder::Hash(model) => model.dimension(),
            AnyEmbedder::Ollama(model) => model.dimension(),
        }
    }
}

/// The configured vector index
#[derive(Debug, Clone)]
pub enum AnyIndex {
    /// In-process index
    Memory(MemoryIndex),
    /// Hosted index
    Pinecone(PineconeIndex),
}

impl AnyIndex {
    /// Build the index described by `config`
    ///
    /// The in-process index takes its dimension from the embedder.
    pub fn from_config(config: &ServerConfig) -> Result<Self, IndexError> {
        Ok(match &config.index {
            IndexConfig::Memory => AnyIndex::Memory(MemoryIndex::new(config.embedding.dimension())),
            IndexConfig::Pinecone {
                url,
                api_key,
                namespace,
            } => {
                let key = api_key.clone().unwrap_or_default();
                let index = PineconeIndex::new(url.as_str(), key)?;
                AnyIndex::Pinecone(match namespace {
                    Some(ns) => index.with_namespace(ns.as_str()),
                    None => index,
                })
            }
        })
    }

    /// Backend name for logs and health output
    pub fn name(&self) -> &'static str {
        match self {
            AnyIndex::Memory(_) => "memory",
            AnyIndex::Pinecone(_) => "pinecone",
        }
    }
}

#[async_trait]
impl VectorIndex for AnyIndex {
    type Error = IndexError;

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, Self::Error> {
        match self {
            AnyIndex::Memory(index) => index.upsert(records).await,
            AnyIndex::Pinecone(index) => index.upsert(records).await,
        }
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &MatchFilter,
    ) -> Result<Vec<RawMatch>, Self::Error> {
        match self {
            AnyIndex::Memory(index) => index.query(vector, top_k, filter).await,
            AnyIndex::Pinecone(index) => index.query(vector, top_k, filter).await,
        }
    }

    async fn count(&self) -> Result<usize, Self::Error> {
        match self {
            AnyIndex::Memory(index) => index.count().await,
            AnyIndex::Pinecone(index) => index.count().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_index_follows_embedding_dimension() {
        let config = ServerConfig {
            embedding: EmbeddingConfig::Hash { dimension: 32 },
            ..ServerConfig::default()
        };
        let embedder = AnyEmbedder::from_config(&config.embedding).unwrap();
        let index = AnyIndex::from_config(&config).unwrap();

        assert_eq!(embedder.dimension(), 32);
        assert_eq!(index.name(), "memory");

        let record = VectorRecord {
            id: "a".to_string(),
            values: embedder.embed("npm ERR!").await.unwrap(),
            metadata: Default::default(),
        };
        assert_eq!(index.upsert(vec![record]).await.unwrap(), 1);
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[test]
    fn test_pinecone_backend() {
        let config = ServerConfig {
            index: IndexConfig::Pinecone {
                url: "https://logs.svc.pinecone.io/".to_string(),
                api_key: Some("k".to_string()),
                namespace: Some("ci".to_string()),
            },
            ..ServerConfig::default()
        };
        match AnyIndex::from_config(&config).unwrap() {
            AnyIndex::Pinecone(index) => assert_eq!(index.host(), "https://logs.svc.pinecone.io"),
            other => panic!("Expected pinecone index, got {:?}", other),
        }
    }
}

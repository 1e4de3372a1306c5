//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the retrieval core and the
//! services it talks to. Implementations live in other crates
//! (`pipelens-store`, `pipelens-llm`) and are passed in explicitly, never
//! reached through globals.

use crate::matching::{MatchFilter, Metadata};
use async_trait::async_trait;
use std::sync::Arc;

/// A raw match record as returned by an index, before normalization
pub type RawMatch = serde_json::Value;

/// Trait for text embedding models
///
/// The same model must be used at ingestion and at query time; the core
/// does not verify embedding-space consistency.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Error type for embedding operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate an embedding vector for the given text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;

    /// Dimension of the vectors produced
    fn dimension(&self) -> usize;
}

/// A vector with its id and metadata, ready to be written to an index
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Record id (the chunk id)
    pub id: String,
    /// Embedding values
    pub values: Vec<f32>,
    /// Non-text chunk attributes
    pub metadata: Metadata,
}

/// Trait for vector index services
///
/// Implemented by the infrastructure layer (pipelens-store)
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Error type for index operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert or replace records by id, returning how many were written
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, Self::Error>;

    /// Nearest-neighbor search returning raw match records, closest first
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &MatchFilter,
    ) -> Result<Vec<RawMatch>, Self::Error>;

    /// Number of records currently stored
    async fn count(&self) -> Result<usize, Self::Error>;
}

/// A single generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Complete prompt text
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum number of output tokens
    pub max_tokens: u32,
}

/// Trait for generation backends
///
/// `generate` returns the raw reply body, either one JSON document or a
/// newline-delimited stream of JSON fragments. Turning it into answer text is
/// the response extractor's job.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Error type for transport failures
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send the request and return the raw reply body
    async fn generate(&self, request: &GenerationRequest) -> Result<String, Self::Error>;

    /// Short backend description for logs and health output
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: EmbeddingModel + ?Sized> EmbeddingModel for Arc<T> {
    type Error = T::Error;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        (**self).embed(text).await
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

#[async_trait]
impl<T: VectorIndex + ?Sized> VectorIndex for Arc<T> {
    type Error = T::Error;

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, Self::Error> {
        (**self).upsert(records).await
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &MatchFilter,
    ) -> Result<Vec<RawMatch>, Self::Error> {
        (**self).query(vector, top_k, filter).await
    }

    async fn count(&self) -> Result<usize, Self::Error> {
        (**self).count().await
    }
}

#[async_trait]
impl<T: GenerationBackend + ?Sized> GenerationBackend for Arc<T> {
    type Error = T::Error;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, Self::Error> {
        (**self).generate(request).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

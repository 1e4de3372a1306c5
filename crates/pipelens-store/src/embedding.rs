//! Embedding Model for Text Vectorization
//!
//! This module provides text-to-vector conversion for semantic search over
//! log chunks.
//!
//! # Architecture
//!
//! - **HashEmbeddingModel**: Token-hashing bag-of-words embeddings. Needs no
//!   model files, and texts that share vocabulary land close together, which
//!   is enough for keyword-heavy build logs and for tests.
//! - Remote models (e.g. Ollama's embedding endpoint) live in `pipelens-llm`.
//!
//! # Examples
//!
//! ```rust
//! use pipelens_store::embedding::HashEmbeddingModel;
//! use pipelens_domain::traits::EmbeddingModel;
//!
//! # tokio_test::block_on(async {
//! let model = HashEmbeddingModel::new(384);
//! let embedding = model.embed("npm ERR! test failed").await.unwrap();
//! assert_eq!(embedding.len(), 384);
//!
//! // Same text always produces same embedding
//! let embedding2 = model.embed("npm ERR! test failed").await.unwrap();
//! assert_eq!(embedding, embedding2);
//! # });
//! ```

use async_trait::async_trait;
use pipelens_domain::traits::EmbeddingModel;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Default embedding dimension (matches common small sentence encoders)
pub const DEFAULT_DIMENSION: usize = 384;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid model configuration
    #[error("Invalid embedding configuration: {0}")]
    InvalidConfig(String),

    /// Network or API communication error
    #[error("Embedding service communication error: {0}")]
    Communication(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Token-hashing embedding model
///
/// Each lowercase alphanumeric token is hashed into one of `dimension`
/// buckets with a hash-derived sign, then the vector is normalized to unit
/// length. The result is:
///
/// - **Deterministic**: Same text always produces same embedding
/// - **Normalized**: All vectors have unit length (for cosine similarity)
/// - **Lexically similar**: Shared tokens raise cosine similarity
#[derive(Debug, Clone)]
pub struct HashEmbeddingModel {
    dimension: usize,
}

impl HashEmbeddingModel {
    /// Create a new model producing `dimension`-sized vectors
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_token(token: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        hasher.finish()
    }

    /// Split text into lowercase alphanumeric tokens
    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    fn embed_sync(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "dimension must be greater than 0".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        let mut seen_token = false;

        for token in Self::tokens(text) {
            seen_token = true;
            let hash = Self::hash_token(&token);
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        // Token-free text (blank or punctuation-only lines) still needs a
        // non-zero vector; indexes reject all-zero embeddings.
        if !seen_token {
            let bucket = (Self::hash_token("") % self.dimension as u64) as usize;
            embedding[bucket] = 1.0;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }
}

impl Default for HashEmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingModel for HashEmbeddingModel {
    type Error = EmbeddingError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        self.embed_sync(text)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in `[-1, 1]`; 0.0 when either vector has zero magnitude
/// or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

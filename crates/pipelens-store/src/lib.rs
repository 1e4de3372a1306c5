//! Pipelens Storage Layer
//!
//! Vector storage and retrieval for log chunks.
//!
//! # Architecture
//!
//! - [`embedding`]: text-to-vector models
//! - [`memory`]: in-process vector index (brute-force cosine search)
//! - [`pinecone`]: client for a hosted Pinecone-compatible index
//! - [`normalize`]: coercion of raw match records into typed [`Match`]es
//! - [`retriever`]: question → embedding → index query → normalized matches
//!
//! # Examples
//!
//! ```
//! use pipelens_store::{HashEmbeddingModel, MemoryIndex, Retriever};
//! use pipelens_domain::MatchFilter;
//!
//! # tokio_test::block_on(async {
//! let retriever = Retriever::new(HashEmbeddingModel::new(64), MemoryIndex::new(64));
//! let matches = retriever
//!     .query("why did job 42 fail", 10, &MatchFilter::job("42"))
//!     .await
//!     .unwrap();
//! assert!(matches.is_empty());
//! # });
//! ```
//!
//! [`Match`]: pipelens_domain::Match

#![warn(missing_docs)]

pub mod embedding;
pub mod memory;
pub mod normalize;
pub mod pinecone;
pub mod retriever;

use thiserror::Error;

pub use embedding::{cosine_similarity, EmbeddingError, HashEmbeddingModel};
pub use memory::MemoryIndex;
pub use normalize::{coerce_value, normalize};
pub use pinecone::PineconeIndex;
pub use retriever::{RetrievalError, Retriever};

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Index service unreachable or request failed in transit
    #[error("Index communication error: {0}")]
    Communication(String),

    /// Index service answered with a non-success status
    #[error("Index returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Index response could not be decoded
    #[error("Invalid index response: {0}")]
    InvalidResponse(String),

    /// Internal index error
    #[error("Index error: {0}")]
    Internal(String),
}

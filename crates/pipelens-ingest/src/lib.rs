//! Pipelens Ingestion
//!
//! Turns raw CI/CD logs into annotated chunks and writes them to a vector
//! index.
//!
//! # Architecture
//!
//! ```text
//! log bytes → LogChunker → LogChunk[] → Indexer (embed + batched upsert) → VectorIndex
//! ```
//!
//! # Key Features
//!
//! - **Bounded windows**: line and character budgets, configurable overlap
//! - **Provenance**: job id, step name and outcome status read from markers in each span
//! - **Idempotent upsert**: chunk ids are derived from content, so re-ingestion replaces
//! - **Partial progress**: each batch commits independently
//!
//! # Example Usage
//!
//! ```
//! use pipelens_ingest::{IngestConfig, IngestPipeline};
//! use pipelens_store::{HashEmbeddingModel, MemoryIndex};
//!
//! # tokio_test::block_on(async {
//! let pipeline = IngestPipeline::new(
//!     IngestConfig::default(),
//!     HashEmbeddingModel::new(64),
//!     MemoryIndex::new(64),
//! )
//! .unwrap();
//!
//! let log = b"job_id: 42\nstep: test\nERROR: 3 tests failed\nexit code 1\n";
//! let report = pipeline.ingest_bytes(log, "ci.log").await.unwrap();
//!
//! println!("Upserted {} chunks", report.vectors_upserted);
//! assert_eq!(report.chunks_created, 1);
//! # });
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod indexer;
mod pipeline;


pub use chunking::{split_lines, LogChunker, STATUS_ERROR, STATUS_FAILED, STATUS_SUCCESS};
pub use config::{ChunkerConfig, IngestConfig};
pub use error::IngestError;
pub use indexer::Indexer;
pub use pipeline::{IngestPipeline, IngestReport};

//! Pipelens Domain Layer
//!
//! Core types and collaborator traits for CI/CD log triage. Every other
//! crate in the workspace depends on this one; it carries no I/O.
//!
//! ## Key Concepts
//!
//! - **LogChunk**: A bounded, metadata-tagged span of log lines (the unit of retrieval)
//! - **Match**: A scored, normalized reference to an indexed chunk
//! - **SynthesizedAnswer**: A root-cause explanation grounded in cited matches
//!
//! ## Architecture
//!
//! Collaborators that live outside the core (vector index, embedding model,
//! generation backend) are expressed as traits in [`traits`]. Implementations
//! live in `pipelens-store` and `pipelens-llm`, so tests can substitute them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod chunk;
pub mod matching;
pub mod traits;

// Re-exports for convenience
pub use answer::{EvidenceSnippet, EvidenceSummary, GeneratedAnswer, SynthesizedAnswer};
pub use chunk::{ChunkId, LogChunk};
pub use matching::{Match, MatchFilter, Metadata, MetadataKey, MetadataValue};

//! Pipelens Answer Synthesis
//!
//! Turns ranked log matches into a grounded answer.
//!
//! # Strategies
//!
//! - **Heuristic**: deterministic rules over previews and status tokens,
//!   producing a structured [`SynthesizedAnswer`](pipelens_domain::SynthesizedAnswer)
//! - **Generated**: a prompt restricted to the retrieved snippets is sent to a
//!   generation backend; the raw reply goes through the response extractor
//! - **Auto**: generation first, heuristic when generation is unavailable
//!
//! # Example Usage
//!
//! ```
//! use pipelens_domain::{Match, Metadata, MetadataKey};
//! use pipelens_llm::MockBackend;
//! use pipelens_synthesizer::{AnswerSynthesizer, Strategy, Synthesizer};
//!
//! # tokio_test::block_on(async {
//! let mut metadata = Metadata::new();
//! metadata.insert(MetadataKey::Preview, "2 tests failed");
//! metadata.insert(MetadataKey::StepName, "unit");
//! let matches = vec![Match { id: "c1".to_string(), score: 0.8, metadata }];
//!
//! let synthesizer = Synthesizer::<MockBackend>::new(Strategy::Heuristic, None).unwrap();
//! let synthesis = synthesizer.synthesize("what broke?", &matches).await.unwrap();
//! assert_eq!(synthesis.structured.unwrap().root_cause, "A step failed.");
//! # });
//! ```

#![warn(missing_docs)]

mod error;
mod generated;
mod heuristic;
mod prompt;
mod strategy;

pub use error::SynthesisError;
pub use generated::{GeneratedSynthesizer, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS};
pub use heuristic::{HeuristicSynthesizer, ERROR_STATUSES, FAILURE_STATUSES};
pub use prompt::PromptBuilder;
pub use strategy::{AnswerSynthesizer, Strategy, Synthesis, Synthesizer};

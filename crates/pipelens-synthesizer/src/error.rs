//! Error types for answer synthesis

use thiserror::Error;

/// Errors that can occur while synthesizing an answer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// The generation backend could not be reached, timed out, or answered
    /// only with errors
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

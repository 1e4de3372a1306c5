//! Error types for the CLI application.

use pipelens_ingest::IngestError;
use pipelens_server::{config::ConfigError, ServerError};
use pipelens_store::RetrievalError;
use pipelens_synthesizer::SynthesisError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be loaded
    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    /// Backend wiring or service error
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Ingestion failed
    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    /// Retrieval failed
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Answer synthesis failed
    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

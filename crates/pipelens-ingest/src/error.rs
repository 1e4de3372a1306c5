//! Error types for ingestion

use thiserror::Error;

/// Errors that can occur while ingesting logs
#[derive(Error, Debug)]
pub enum IngestError {
    /// The log file does not exist
    #[error("Log file not found: {0}")]
    SourceNotFound(String),

    /// The log file could not be read
    #[error("Failed to read log file: {0}")]
    Io(#[from] std::io::Error),

    /// A batch could not be embedded or written; earlier batches stay committed
    #[error("Batch {batch} failed after {committed} vectors were committed: {message}")]
    Batch {
        /// 1-based number of the failing batch
        batch: usize,
        /// Vectors committed by earlier batches
        committed: usize,
        /// Underlying embedding or index error
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Vectors that were durably written before the failure
    pub fn committed(&self) -> usize {
        match self {
            IngestError::Batch { committed, .. } => *committed,
            _ => 0,
        }
    }
}

//! File ingestion: read, chunk, embed, upsert

use crate::chunking::LogChunker;
use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::indexer::Indexer;
use pipelens_domain::traits::{EmbeddingModel, VectorIndex};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Outcome of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Source identifier stamped on every chunk
    pub source: String,
    /// Lines read
    pub lines: usize,
    /// Chunks produced by the chunker
    pub chunks_created: usize,
    /// Vectors the index acknowledged
    pub vectors_upserted: usize,
}

/// Reads a log, chunks it and writes the chunks to an index
pub struct IngestPipeline<E, I> {
    chunker: LogChunker,
    indexer: Indexer<E, I>,
    batch_size: usize,
}

impl<E, I> IngestPipeline<E, I>
where
    E: EmbeddingModel,
    I: VectorIndex,
{
    /// Create a pipeline
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the configuration is invalid.
    pub fn new(config: IngestConfig, embedder: E, index: I) -> Result<Self, IngestError> {
        config.validate().map_err(IngestError::Config)?;
        Ok(Self {
            chunker: LogChunker::new(config.chunker)?,
            indexer: Indexer::new(embedder, index),
            batch_size: config.batch_size,
        })
    }

    /// The index chunks are written to
    pub fn index(&self) -> &I {
        self.indexer.index()
    }

    /// Ingest the log file at `path`
    ///
    /// `source` defaults to the file name.
    ///
    /// # Errors
    ///
    /// - [`IngestError::SourceNotFound`] if the file does not exist
    /// - [`IngestError::Io`] if it cannot be read
    /// - [`IngestError::Batch`] if a batch fails to embed or write
    pub async fn ingest_file(
        &self,
        path: &Path,
        source: Option<&str>,
    ) -> Result<IngestReport, IngestError> {
        if !tokio::fs::try_exists(path).await? {
            return Err(IngestError::SourceNotFound(path.display().to_string()));
        }

        let bytes = tokio::fs::read(path).await?;
        let source = match source {
            Some(s) => s.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        };

        self.ingest_bytes(&bytes, &source).await
    }

    /// Ingest raw log bytes under `source`
    pub async fn ingest_bytes(&self, bytes: &[u8], source: &str) -> Result<IngestReport, IngestError> {
        let lines = crate::chunking::split_lines(bytes);
        let chunks = self.chunker.chunk(&lines, source);
        info!(
            "Chunked {} lines from '{}' into {} chunks",
            lines.len(),
            source,
            chunks.len()
        );

        let vectors_upserted = self.indexer.upsert(&chunks, self.batch_size).await?;

        Ok(IngestReport {
            source: source.to_string(),
            lines: lines.len(),
            chunks_created: chunks.len(),
            vectors_upserted,
        })
    }
}

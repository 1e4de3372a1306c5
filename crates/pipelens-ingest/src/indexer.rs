//! Batched embedding and index writes

use crate::error::IngestError;
use pipelens_domain::traits::{EmbeddingModel, VectorIndex, VectorRecord};
use pipelens_domain::LogChunk;
use tracing::{debug, info};

/// Embeds chunks and writes them to an index in batches
///
/// Records are keyed by chunk id, so re-running over unchanged input
/// replaces records instead of duplicating them. Each batch is committed on
/// its own; a failure leaves earlier batches in place.
#[derive(Debug, Clone)]
pub struct Indexer<E, I> {
    embedder: E,
    index: I,
}

impl<E, I> Indexer<E, I>
where
    E: EmbeddingModel,
    I: VectorIndex,
{
    /// Create an indexer
    pub fn new(embedder: E, index: I) -> Self {
        Self { embedder, index }
    }

    /// The index records are written to
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Embed and write `chunks`, returning the number of vectors stored
    ///
    /// # Errors
    ///
    /// - [`IngestError::Config`] when `batch_size` is 0
    /// - [`IngestError::Batch`] for the first batch that fails to embed or
    ///   write, carrying the count already committed
    pub async fn upsert(&self, chunks: &[LogChunk], batch_size: usize) -> Result<usize, IngestError> {
        if batch_size == 0 {
            return Err(IngestError::Config("batch_size must be greater than 0".to_string()));
        }

        let batches = chunks.len().div_ceil(batch_size);
        let mut committed = 0;

        for (n, batch) in chunks.chunks(batch_size).enumerate() {
            let number = n + 1;
            let fail = |message: String| IngestError::Batch {
                batch: number,
                committed,
                message,
            };

            let mut records = Vec::with_capacity(batch.len());
            for chunk in batch {
                let values = self
                    .embedder
                    .embed(&chunk.text)
                    .await
                    .map_err(|e| fail(format!("embedding chunk {}: {}", chunk.id, e)))?;
                records.push(VectorRecord {
                    id: chunk.id.to_string(),
                    values,
                    metadata: chunk.metadata(),
                });
            }

            let written = self
                .index
                .upsert(records)
                .await
                .map_err(|e| fail(e.to_string()))?;
            committed += written;

            debug!("Committed batch {}/{} ({} vectors)", number, batches, written);
        }

        info!("Upserted {} vectors in {} batches", committed, batches);
        Ok(committed)
    }
}

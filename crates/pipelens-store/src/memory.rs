//! In-memory Vector Index
//!
//! Stores `(id, embedding, metadata)` records keyed by id and answers
//! nearest-neighbor queries by scanning every record with cosine similarity.
//!
//! # Architecture
//!
//! - Upsert replaces by id, so re-ingesting unchanged chunks never creates
//!   duplicate retrievable entries
//! - Metadata filters are applied before scoring
//! - Results are sorted by similarity (descending), ties broken by id so the
//!   ordering is deterministic
//!
//! Suitable for tests, the CLI, and small log corpora. Large deployments
//! point the server at a hosted index instead.

use crate::embedding::cosine_similarity;
use crate::IndexError;
use async_trait::async_trait;
use pipelens_domain::traits::{RawMatch, VectorIndex, VectorRecord};
use pipelens_domain::{MatchFilter, Metadata};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredVector {
    values: Vec<f32>,
    metadata: Metadata,
}

/// A thread-safe in-memory vector index
///
/// Clones share the same underlying storage.
///
/// # Examples
///
/// ```
/// use pipelens_store::MemoryIndex;
/// use pipelens_domain::traits::{VectorIndex, VectorRecord};
/// use pipelens_domain::{MatchFilter, Metadata};
///
/// # tokio_test::block_on(async {
/// let index = MemoryIndex::new(3);
/// let record = VectorRecord {
///     id: "chunk-1".to_string(),
///     values: vec![1.0, 0.0, 0.0],
///     metadata: Metadata::new(),
/// };
/// index.upsert(vec![record]).await.unwrap();
///
/// let results = index.query(&[1.0, 0.0, 0.0], 5, &MatchFilter::default()).await.unwrap();
/// assert_eq!(results[0]["id"], "chunk-1");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    /// Expected embedding dimension
    dimension: usize,

    /// Records keyed by id
    records: Arc<RwLock<HashMap<String, StoredVector>>>,
}

impl MemoryIndex {
    /// Create a new index for vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Embedding dimension accepted by this index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_dimension(&self, values: &[f32]) -> Result<(), IndexError> {
        if values.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: values.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    type Error = IndexError;

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, Self::Error> {
        // Validate the whole batch first so a bad record never leaves it half-written
        for record in &records {
            self.check_dimension(&record.values)?;
        }

        let mut stored = self
            .records
            .write()
            .map_err(|e| IndexError::Internal(format!("Index lock poisoned: {}", e)))?;

        let count = records.len();
        for record in records {
            stored.insert(
                record.id,
                StoredVector {
                    values: record.values,
                    metadata: record.metadata,
                },
            );
        }

        debug!("Upserted {} vectors ({} total)", count, stored.len());
        Ok(count)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &MatchFilter,
    ) -> Result<Vec<RawMatch>, Self::Error> {
        self.check_dimension(vector)?;

        let stored = self
            .records
            .read()
            .map_err(|e| IndexError::Internal(format!("Index lock poisoned: {}", e)))?;

        let mut scored: Vec<(&String, f32, &Metadata)> = stored
            .iter()
            .filter(|(_, v)| filter.accepts(&v.metadata))
            .map(|(id, v)| (id, cosine_similarity(vector, &v.values), &v.metadata))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(id, score, metadata)| {
                json!({
                    "id": id,
                    "score": score,
                    "metadata": metadata,
                })
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.len())
    }
}

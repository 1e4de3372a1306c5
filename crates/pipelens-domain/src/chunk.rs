//! Log chunks - the unit of retrieval

use crate::matching::{Metadata, MetadataKey, MetadataValue};
use std::fmt;
use uuid::Uuid;

/// Deterministic identifier for a log chunk
///
/// Derived with UUIDv5 from the chunk's source, starting line and text, so
/// re-ingesting identical input produces identical ids (idempotent upsert)
/// while changed content produces a new id generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkId(Uuid);

impl ChunkId {
    /// Derive the id for a span of `source` starting at `start_line`
    ///
    /// # Examples
    ///
    /// ```
    /// use pipelens_domain::ChunkId;
    ///
    /// let a = ChunkId::derive("ci.log", 0, "npm test\nERROR: 1 failing");
    /// let b = ChunkId::derive("ci.log", 0, "npm test\nERROR: 1 failing");
    /// assert_eq!(a, b);
    /// ```
    pub fn derive(source: &str, start_line: usize, text: &str) -> Self {
        let mut name = Vec::with_capacity(source.len() + text.len() + 24);
        name.extend_from_slice(source.as_bytes());
        name.push(0);
        name.extend_from_slice(start_line.to_string().as_bytes());
        name.push(0);
        name.extend_from_slice(text.as_bytes());
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, &name))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contiguous span of log lines selected for retrieval
///
/// Chunks are immutable once created; re-ingestion supersedes them.
#[derive(Debug, Clone, PartialEq)]
pub struct LogChunk {
    /// Stable identifier
    pub id: ChunkId,

    /// Raw span text (lines joined with `\n`), used to compute the embedding
    pub text: String,

    /// Cleaned, truncated excerpt of `text` shown to humans and the synthesizer
    pub preview: String,

    /// Job identifier found in the span, if any
    pub job_id: Option<String>,

    /// Step or stage name found in the span, if any
    pub step_name: Option<String>,

    /// Outcome token found in the span (e.g. `ERROR`, `FAILED`), if any
    pub status: Option<String>,

    /// Originating log identifier
    pub source: String,

    /// First line of the span (0-based)
    pub start_line: usize,

    /// One past the last line of the span
    pub end_line: usize,
}

impl LogChunk {
    /// Number of lines covered by this chunk
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line
    }

    /// Non-text attributes as index metadata
    ///
    /// Unset attributes are omitted rather than stored as empty strings.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(MetadataKey::Preview, MetadataValue::Text(self.preview.clone()));
        metadata.insert(MetadataKey::Source, MetadataValue::Text(self.source.clone()));
        if let Some(job_id) = &self.job_id {
            metadata.insert(MetadataKey::JobId, MetadataValue::Text(job_id.clone()));
        }
        if let Some(step_name) = &self.step_name {
            metadata.insert(MetadataKey::StepName, MetadataValue::Text(step_name.clone()));
        }
        if let Some(status) = &self.status {
            metadata.insert(MetadataKey::Status, MetadataValue::Text(status.clone()));
        }
        metadata
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the same span always gets the same id, another line another id
        #[test]
        fn test_chunk_id_stable_per_span(
            source in "[a-z0-9./_-]{1,24}",
            text in "[ -~\n]{0,120}",
            start in 0usize..10_000,
            shift in 1usize..100,
        ) {
            let id = ChunkId::derive(&source, start, &text);
            prop_assert_eq!(id, ChunkId::derive(&source, start, &text));
            prop_assert_ne!(id, ChunkId::derive(&source, start + shift, &text));
        }

        /// Property: moving a character between source and text changes the id
        #[test]
        fn test_chunk_id_fields_do_not_bleed(
            source in "[a-z]{1,12}",
            moved in "[a-z]",
            text in "[a-z ]{0,40}",
            start in 0usize..1_000,
        ) {
            let joined_source = format!("{}{}", source, moved);
            let joined_text = format!("{}{}", moved, text);
            prop_assert_ne!(
                ChunkId::derive(&joined_source, start, &text),
                ChunkId::derive(&source, start, &joined_text)
            );
        }
    }
}

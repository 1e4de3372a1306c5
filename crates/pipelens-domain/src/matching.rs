//! Scored matches and their primitive-typed metadata

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed metadata vocabulary carried by indexed chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataKey {
    /// Pipeline run identifier
    JobId,
    /// Step or stage name
    StepName,
    /// Outcome token
    Status,
    /// Human-readable excerpt
    Preview,
    /// Originating log identifier
    Source,
}

impl MetadataKey {
    /// Every key in the vocabulary
    pub const ALL: [MetadataKey; 5] = [
        MetadataKey::JobId,
        MetadataKey::StepName,
        MetadataKey::Status,
        MetadataKey::Preview,
        MetadataKey::Source,
    ];

    /// Wire name of the key
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKey::JobId => "job_id",
            MetadataKey::StepName => "step_name",
            MetadataKey::Status => "status",
            MetadataKey::Preview => "preview",
            MetadataKey::Source => "source",
        }
    }

    /// Look up a key by wire name; `None` for names outside the vocabulary
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A primitive metadata value
///
/// Nothing nested is representable here; the normalizer stringifies
/// structured values before they reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
}

impl MetadataValue {
    /// Render the value as text
    ///
    /// Whole numbers render without a fractional part, so a numeric job id
    /// of `42` reads as `"42"` rather than `"42.0"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pipelens_domain::MetadataValue;
    ///
    /// assert_eq!(MetadataValue::Number(42.0).to_text(), "42");
    /// assert_eq!(MetadataValue::Number(0.5).to_text(), "0.5");
    /// assert_eq!(MetadataValue::Bool(true).to_text(), "true");
    /// ```
    pub fn to_text(&self) -> String {
        match self {
            MetadataValue::Bool(b) => b.to_string(),
            MetadataValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            MetadataValue::Number(n) => n.to_string(),
            MetadataValue::Text(s) => s.clone(),
        }
    }

    /// Borrow the value if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

/// Metadata keyed by the fixed vocabulary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<MetadataKey, MetadataValue>);

impl Metadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one
    pub fn insert(&mut self, key: MetadataKey, value: impl Into<MetadataValue>) {
        self.0.insert(key, value.into());
    }

    /// Get a value
    pub fn get(&self, key: MetadataKey) -> Option<&MetadataValue> {
        self.0.get(&key)
    }

    /// Get a value rendered as text
    pub fn text(&self, key: MetadataKey) -> Option<String> {
        self.get(key).map(MetadataValue::to_text)
    }

    /// Number of keys present
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no keys are present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over present keys in vocabulary order
    pub fn iter(&self) -> impl Iterator<Item = (MetadataKey, &MetadataValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

/// A scored reference to a previously indexed chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Chunk id
    pub id: String,

    /// Similarity score (higher = closer)
    pub score: f64,

    /// Copy of the chunk's non-text attributes
    #[serde(default)]
    pub metadata: Metadata,
}

impl Match {
    /// Preview text, empty when absent
    pub fn preview(&self) -> String {
        self.metadata.text(MetadataKey::Preview).unwrap_or_default()
    }

    /// Job identifier, if present
    pub fn job_id(&self) -> Option<String> {
        self.metadata.text(MetadataKey::JobId)
    }

    /// Step name, if present
    pub fn step_name(&self) -> Option<String> {
        self.metadata.text(MetadataKey::StepName)
    }

    /// Status token, if present
    pub fn status(&self) -> Option<String> {
        self.metadata.text(MetadataKey::Status)
    }
}

/// Equality filter applied by the index at query time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    /// Restrict results to a single pipeline run
    pub job_id: Option<String>,
}

impl MatchFilter {
    /// Filter on a single job id
    pub fn job(job_id: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
        }
    }

    /// Whether the filter imposes no constraint
    pub fn is_empty(&self) -> bool {
        self.job_id.is_none()
    }

    /// Check whether a metadata record passes the filter
    pub fn accepts(&self, metadata: &Metadata) -> bool {
        match &self.job_id {
            Some(job_id) => metadata.text(MetadataKey::JobId).as_deref() == Some(job_id.as_str()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip_by_name() {
        for key in MetadataKey::ALL {
            assert_eq!(MetadataKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(MetadataKey::parse("values"), None);
    }

    #[test]
    fn test_metadata_serializes_as_flat_object() {
        let mut metadata = Metadata::new();
        metadata.insert(MetadataKey::JobId, "42");
        metadata.insert(MetadataKey::Preview, MetadataValue::Number(3.0));
        metadata.insert(MetadataKey::Status, MetadataValue::Bool(false));

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"job_id": "42", "status": false, "preview": 3.0})
        );
    }

    #[test]
    fn test_match_accessors() {
        let mut metadata = Metadata::new();
        metadata.insert(MetadataKey::JobId, MetadataValue::Number(42.0));
        metadata.insert(MetadataKey::StepName, "build");
        let m = Match {
            id: "a".to_string(),
            score: 0.9,
            metadata,
        };

        assert_eq!(m.job_id().as_deref(), Some("42"));
        assert_eq!(m.step_name().as_deref(), Some("build"));
        assert_eq!(m.status(), None);
        assert_eq!(m.preview(), "");
    }

    #[test]
    fn test_filter_accepts() {
        let mut metadata = Metadata::new();
        metadata.insert(MetadataKey::JobId, "42");

        assert!(MatchFilter::default().accepts(&metadata));
        assert!(MatchFilter::job("42").accepts(&metadata));
        assert!(!MatchFilter::job("43").accepts(&metadata));
        assert!(!MatchFilter::job("42").accepts(&Metadata::new()));
    }

    #[test]
    fn test_non_integral_numbers_keep_fraction() {
        assert_eq!(MetadataValue::Number(-1.25).to_text(), "-1.25");
        assert_eq!(MetadataValue::Number(-7.0).to_text(), "-7");
    }
}

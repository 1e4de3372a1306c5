//! Configuration for chunking and ingestion

use serde::{Deserialize, Serialize};

/// Window bounds and preview length used by the chunker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum lines per chunk
    pub max_lines: usize,

    /// Maximum characters per chunk (a single longer line still forms a chunk)
    pub max_chars: usize,

    /// Lines shared between consecutive chunks
    pub overlap_lines: usize,

    /// Maximum preview length (characters)
    pub preview_chars: usize,
}

impl ChunkerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_lines == 0 {
            return Err("max_lines must be greater than 0".to_string());
        }
        if self.max_chars == 0 {
            return Err("max_chars must be greater than 0".to_string());
        }
        if self.overlap_lines >= self.max_lines {
            return Err("overlap_lines must be smaller than max_lines".to_string());
        }
        if self.preview_chars == 0 {
            return Err("preview_chars must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_lines: 40,
            max_chars: 4_000,
            overlap_lines: 2,
            preview_chars: 300,
        }
    }
}

/// Configuration for a file ingestion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Records written per index call
    pub batch_size: usize,

    /// Chunker settings
    pub chunker: ChunkerConfig,
}

impl IngestConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        self.chunker.validate()
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            chunker: ChunkerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ChunkerConfig::default().validate().is_ok());
        assert!(IngestConfig::default().validate().is_ok());
    }

    #[test]
    fn test_overlap_must_leave_progress() {
        let config = ChunkerConfig {
            max_lines: 4,
            overlap_lines: 4,
            ..ChunkerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = IngestConfig {
            batch_size: 0,
            ..IngestConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err("batch_size must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = IngestConfig::from_toml(
            r#"
            batch_size = 100

            [chunker]
            max_lines = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.batch_size, 100);
        assert_eq!(config.chunker.max_lines, 10);
        assert_eq!(config.chunker.max_chars, 4_000);
        assert_eq!(config.chunker.preview_chars, 300);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = IngestConfig {
            batch_size: 7,
            chunker: ChunkerConfig {
                max_lines: 120,
                max_chars: 8_000,
                overlap_lines: 5,
                preview_chars: 500,
            },
        };
        let parsed = IngestConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}

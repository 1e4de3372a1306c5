//! Log chunking
//!
//! Lines are grouped into windows bounded by a line budget and a character
//! budget. A line is never split, so an over-long line forms a chunk of its
//! own. Consecutive windows share `overlap_lines` lines so an error message
//! is not cut off from the command that produced it.

use crate::config::ChunkerConfig;
use crate::error::IngestError;
use pipelens_domain::{ChunkId, LogChunk};
use regex::Regex;

/// Status assigned when a span carries an error marker
pub const STATUS_ERROR: &str = "ERROR";
/// Status assigned for `exit code 0`
pub const STATUS_SUCCESS: &str = "SUCCESS";
/// Status assigned for a non-zero exit code
pub const STATUS_FAILED: &str = "FAILED";

const GITHUB_ERROR_MARKER: &str = "##[error]";

/// Compiled structural marker patterns
#[derive(Debug, Clone)]
struct Markers {
    job: Regex,
    step: Regex,
    group: Regex,
    status: Regex,
    error_token: Regex,
    exit_code: Regex,
    ansi: Regex,
}

impl Markers {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            job: Regex::new(r"(?i)\bjob(?:[_\- ]id)?\s*[:=#]\s*([A-Za-z0-9_./\-]+)")?,
            step: Regex::new(
                r#"(?i)\b(?:step_name|step|stage)\s*[:=]\s*(?:"([^"]+)"|'([^']+)'|([^\s,;]+))"#,
            )?,
            group: Regex::new(r"##\[group\]\s*(.+)")?,
            status: Regex::new(r"(?i)\bstatus\s*[:=]\s*([A-Za-z_]+)")?,
            error_token: Regex::new(r"\bERROR\b")?,
            exit_code: Regex::new(r"(?i)\b(?:exit code|exited with code)\s*:?\s*(-?\d+)")?,
            ansi: Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]")?,
        })
    }

    fn is_error_line(&self, line: &str) -> bool {
        line.contains(GITHUB_ERROR_MARKER) || self.error_token.is_match(line)
    }

    fn job_id(&self, lines: &[String]) -> Option<String> {
        lines
            .iter()
            .find_map(|line| self.job.captures(line).map(|c| c[1].to_string()))
    }

    fn step_name(&self, lines: &[String]) -> Option<String> {
        lines.iter().find_map(|line| {
            if let Some(caps) = self.step.captures(line) {
                let value = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
                return Some(value.as_str().trim().to_string());
            }
            let caps = self.group.captures(line)?;
            let header = caps[1].trim();
            let header = header.strip_prefix("Run ").unwrap_or(header).trim();
            (!header.is_empty()).then(|| header.to_string())
        })
    }

    fn status(&self, lines: &[String]) -> Option<String> {
        if let Some(explicit) = lines
            .iter()
            .find_map(|line| self.status.captures(line).map(|c| c[1].to_uppercase()))
        {
            return Some(explicit);
        }

        if lines.iter().any(|line| self.is_error_line(line)) {
            return Some(STATUS_ERROR.to_string());
        }

        lines.iter().find_map(|line| {
            let caps = self.exit_code.captures(line)?;
            let code: i64 = caps[1].parse().ok()?;
            Some(if code == 0 { STATUS_SUCCESS } else { STATUS_FAILED }.to_string())
        })
    }

    /// Strip escape sequences and control characters, collapse whitespace
    fn clean(&self, text: &str) -> String {
        let stripped = self.ansi.replace_all(text, "");
        stripped
            .split(|c: char| c.is_whitespace() || c.is_control())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Splits log lines into annotated, overlapping chunks
#[derive(Debug, Clone)]
pub struct LogChunker {
    config: ChunkerConfig,
    markers: Markers,
}

impl LogChunker {
    /// Create a chunker
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the configuration is invalid.
    pub fn new(config: ChunkerConfig) -> Result<Self, IngestError> {
        config.validate().map_err(IngestError::Config)?;
        let markers = Markers::compile()
            .map_err(|e| IngestError::Config(format!("Invalid marker pattern: {}", e)))?;
        Ok(Self { config, markers })
    }

    /// The active configuration
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk an ordered sequence of lines
    ///
    /// # Examples
    ///
    /// ```
    /// use pipelens_ingest::{ChunkerConfig, LogChunker};
    ///
    /// let chunker = LogChunker::new(ChunkerConfig::default()).unwrap();
    /// let lines = ["job_id: 42", "step: build", "ERROR: compilation failed"];
    /// let chunks = chunker.chunk(&lines, "ci.log");
    ///
    /// assert_eq!(chunks.len(), 1);
    /// assert_eq!(chunks[0].job_id.as_deref(), Some("42"));
    /// assert_eq!(chunks[0].step_name.as_deref(), Some("build"));
    /// assert_eq!(chunks[0].status.as_deref(), Some("ERROR"));
    /// assert_eq!(chunks[0].preview, "ERROR: compilation failed");
    /// ```
    pub fn chunk<S: AsRef<str>>(&self, lines: &[S], source: &str) -> Vec<LogChunk> {
        let mut chunks = Vec::new();
        let total = lines.len();
        let mut start = 0;

        while start < total {
            let end = self.window_end(lines, start);
            let span: Vec<String> = lines[start..end]
                .iter()
                .map(|l| l.as_ref().to_string())
                .collect();
            chunks.push(self.annotate(span, source, start, end));

            if end >= total {
                break;
            }
            let overlap = self.config.overlap_lines.min(end - start - 1);
            start = end - overlap;
        }

        chunks
    }

    /// End (exclusive) of the window starting at `start`; always past `start`
    fn window_end<S: AsRef<str>>(&self, lines: &[S], start: usize) -> usize {
        let mut end = start;
        let mut chars = 0;

        while end < lines.len() && end - start < self.config.max_lines {
            // Joined text carries one separator per line after the first
            let len = lines[end].as_ref().chars().count() + usize::from(end > start);
            if end > start && chars + len > self.config.max_chars {
                break;
            }
            chars += len;
            end += 1;
        }

        end
    }

    fn annotate(&self, span: Vec<String>, source: &str, start: usize, end: usize) -> LogChunk {
        let text = span.join("\n");
        let preview_from = span
            .iter()
            .position(|line| self.markers.is_error_line(line))
            .unwrap_or(0);
        let preview = truncate_chars(
            &self.markers.clean(&span[preview_from..].join("\n")),
            self.config.preview_chars,
        );

        LogChunk {
            id: ChunkId::derive(source, start, &text),
            job_id: self.markers.job_id(&span),
            step_name: self.markers.step_name(&span),
            status: self.markers.status(&span),
            preview,
            text,
            source: source.to_string(),
            start_line: start,
            end_line: end,
        }
    }
}

/// Split raw bytes into lines, decoding each lossily
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    body.split(|b| *b == b'\n')
        .map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            String::from_utf8_lossy(line).into_owned()
        })
        .collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

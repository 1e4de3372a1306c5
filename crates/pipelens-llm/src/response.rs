//! Generation reply extraction
//!
//! Backends reply either with one JSON document (`{"response": "..."}`) or
//! with newline-delimited JSON fragments, each carrying an incremental piece
//! of the answer. [`extract_response`] handles both:
//!
//! 1. The whole body is parsed as one JSON object. If that succeeds its
//!    response field is authoritative.
//! 2. Otherwise each non-empty line is parsed on its own. Malformed lines are
//!    skipped; the response text of every parsed fragment is appended in order.
//!
//! The result is trimmed. Only a reply whose every parsed fragment is a
//! backend error (`{"error": "..."}`) fails; an empty reply is empty text.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Field names that may carry response text, in priority order
pub const RESPONSE_KEYS: [&str; 5] = ["response", "output", "text", "generated_text", "content"];

/// Separator used when a response field holds a list of fragments
pub const FRAGMENT_SEPARATOR: &str = "\n";

/// Errors that can occur while extracting a reply
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    /// The backend answered only with error documents
    #[error("Generation backend reported an error: {0}")]
    Backend(String),
}

/// Outcome of reading the response field from one JSON object
enum Fragment {
    Text(String),
    Error(String),
    Empty,
}

fn read_fragment(value: &Value) -> Fragment {
    let Some(object) = value.as_object() else {
        return Fragment::Empty;
    };

    for key in RESPONSE_KEYS {
        match object.get(key) {
            Some(Value::String(s)) => return Fragment::Text(s.clone()),
            Some(Value::Array(items)) => {
                let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                return Fragment::Text(parts.join(FRAGMENT_SEPARATOR));
            }
            _ => {}
        }
    }

    match object.get("error") {
        Some(Value::String(message)) => Fragment::Error(message.clone()),
        Some(other) if !other.is_null() => Fragment::Error(other.to_string()),
        _ => Fragment::Empty,
    }
}

/// Incremental, single-pass accumulator for streamed replies
///
/// Lines are consumed once, in order. Dropping the accumulator discards
/// whatever was gathered, which is what a cancelled request wants.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    parsed: usize,
    skipped: usize,
    errors: Vec<String>,
}

impl StreamAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line of the stream
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(value) => {
                self.parsed += 1;
                match read_fragment(&value) {
                    Fragment::Text(piece) => self.text.push_str(&piece),
                    Fragment::Error(message) => {
                        warn!("Generation stream carried an error fragment: {}", message);
                        self.errors.push(message);
                    }
                    Fragment::Empty => {}
                }
            }
            Err(e) => {
                self.skipped += 1;
                debug!("Skipping malformed stream line: {}", e);
            }
        }
    }

    /// Number of lines skipped as malformed so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Finish the stream and return the trimmed text
    pub fn finish(self) -> Result<String, ExtractError> {
        if self.parsed > 0 && self.errors.len() == self.parsed && self.text.trim().is_empty() {
            return Err(ExtractError::Backend(self.errors.join("; ")));
        }
        Ok(self.text.trim().to_string())
    }
}

/// Extract answer text from a raw generation reply
///
/// # Examples
///
/// ```
/// use pipelens_llm::extract_response;
///
/// assert_eq!(extract_response(r#"{"response": "X"}"#).unwrap(), "X");
///
/// let streamed = "{\"response\":\"a\"}\nnot json\n{\"response\":\"b\"}";
/// assert_eq!(extract_response(streamed).unwrap(), "ab");
///
/// assert_eq!(extract_response("").unwrap(), "");
/// ```
pub fn extract_response(raw: &str) -> Result<String, ExtractError> {
    if let Ok(document @ Value::Object(_)) = serde_json::from_str::<Value>(raw) {
        return match read_fragment(&document) {
            Fragment::Text(text) => Ok(text.trim().to_string()),
            Fragment::Error(message) => Err(ExtractError::Backend(message)),
            Fragment::Empty => Ok(String::new()),
        };
    }

    let mut accumulator = StreamAccumulator::new();
    for line in raw.lines() {
        accumulator.push_line(line);
    }
    if accumulator.skipped() > 0 {
        debug!("Skipped {} malformed lines in generation reply", accumulator.skipped());
    }
    accumulator.finish()
}

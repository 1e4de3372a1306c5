//! Synthesized answers and the evidence they cite

use crate::matching::Match;
use serde::{Deserialize, Serialize};

/// Root cause reported when no match supplies sufficient evidence
pub const UNKNOWN_ROOT_CAUSE: &str = "Unknown";

/// A grounded root-cause explanation
///
/// Every claim in `explanation` and `fix` traces back to an id in
/// `matches_used`. When evidence is insufficient the answer is the explicit
/// [`SynthesizedAnswer::insufficient_evidence`] state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedAnswer {
    /// Short classification
    pub root_cause: String,

    /// Free-text explanation
    pub explanation: String,

    /// Actionable suggestion
    #[serde(rename = "suggested_fix")]
    pub fix: String,

    /// Ordered ids of the matches cited
    pub matches_used: Vec<String>,
}

impl SynthesizedAnswer {
    /// The terminal "insufficient evidence" state
    pub fn insufficient_evidence(matches_used: Vec<String>) -> Self {
        Self {
            root_cause: UNKNOWN_ROOT_CAUSE.to_string(),
            explanation: "Not enough evidence found.".to_string(),
            fix: "Check CI/CD logs manually.".to_string(),
            matches_used,
        }
    }

    /// Whether this answer is the insufficient-evidence state
    pub fn is_insufficient(&self) -> bool {
        self.root_cause == UNKNOWN_ROOT_CAUSE
    }

    /// Render as plain text for the `answer` field of a query response
    pub fn render(&self) -> String {
        format!(
            "Root cause: {}\nExplanation: {}\nSuggested fix: {}",
            self.root_cause, self.explanation, self.fix
        )
    }
}

/// One retrieved snippet as presented to a reader of the evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    /// Match id
    pub snippet_id: String,
    /// Job identifier
    pub job: Option<String>,
    /// Step name
    pub step: Option<String>,
    /// Status token
    pub status: Option<String>,
    /// Preview text
    pub preview: String,
}

impl From<&Match> for EvidenceSnippet {
    fn from(m: &Match) -> Self {
        Self {
            snippet_id: m.id.clone(),
            job: m.job_id(),
            step: m.step_name(),
            status: m.status(),
            preview: m.preview(),
        }
    }
}

/// Structured summary of the evidence behind an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    /// The question asked
    pub question: String,
    /// How the snippets were obtained
    pub analysis: String,
    /// Retrieved snippets in rank order
    pub snippets: Vec<EvidenceSnippet>,
}

impl EvidenceSummary {
    /// Summarize ranked matches for a question
    pub fn from_matches(question: &str, matches: &[Match]) -> Self {
        Self {
            question: question.to_string(),
            analysis: "Retrieved top matching CI/CD log chunks by semantic similarity.".to_string(),
            snippets: matches.iter().map(EvidenceSnippet::from).collect(),
        }
    }
}

/// Output of the generation strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    /// Extracted answer text
    pub answer: String,
    /// Prompt that produced it
    pub prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{Metadata, MetadataKey};

    #[test]
    fn test_insufficient_evidence_state() {
        let answer = SynthesizedAnswer::insufficient_evidence(vec!["a".to_string()]);
        assert!(answer.is_insufficient());
        assert_eq!(answer.root_cause, "Unknown");
        assert_eq!(answer.matches_used, vec!["a"]);
    }

    #[test]
    fn test_render_contains_all_parts() {
        let answer = SynthesizedAnswer {
            root_cause: "A step failed.".to_string(),
            explanation: "Log suggests failure in step 'test'.".to_string(),
            fix: "Review error stack trace or command output.".to_string(),
            matches_used: vec![],
        };
        let text = answer.render();
        assert!(text.starts_with("Root cause: A step failed."));
        assert!(text.contains("step 'test'"));
        assert!(text.contains("Suggested fix: Review"));
    }

    #[test]
    fn test_fix_serializes_as_suggested_fix() {
        let answer = SynthesizedAnswer::insufficient_evidence(vec![]);
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["suggested_fix"], "Check CI/CD logs manually.");
        assert!(json.get("fix").is_none());
    }

    #[test]
    fn test_evidence_summary_preserves_order() {
        let mut metadata = Metadata::new();
        metadata.insert(MetadataKey::Preview, "ERROR: boom");
        let matches = vec![
            Match { id: "first".to_string(), score: 0.9, metadata },
            Match { id: "second".to_string(), score: 0.5, metadata: Metadata::new() },
        ];

        let summary = EvidenceSummary::from_matches("why?", &matches);
        assert_eq!(summary.question, "why?");
        assert_eq!(summary.snippets.len(), 2);
        assert_eq!(summary.snippets[0].snippet_id, "first");
        assert_eq!(summary.snippets[0].preview, "ERROR: boom");
        assert_eq!(summary.snippets[1].job, None);
    }
}

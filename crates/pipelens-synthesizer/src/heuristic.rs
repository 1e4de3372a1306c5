//! Evidence-based heuristic synthesis
//!
//! No generation involved: the answer is read off the previews and status
//! tokens of the retrieved matches, so it is deterministic and never cites
//! anything outside the evidence.

use pipelens_domain::{Match, SynthesizedAnswer};

/// Status tokens treated as error states (compared case-insensitively)
pub const ERROR_STATUSES: [&str; 1] = ["ERROR"];

/// Status tokens treated as a plain failure, e.g. a non-zero exit code
pub const FAILURE_STATUSES: [&str; 2] = ["FAILED", "FAILURE"];

const ERROR_ROOT_CAUSE: &str = "Error detected in pipeline.";
const ERROR_FIX: &str = "Inspect failing step's logs and validate configuration/tests.";
const FAILED_ROOT_CAUSE: &str = "A step failed.";
const FAILED_FIX: &str = "Review error stack trace or command output.";

/// Rule-based synthesizer over ranked matches
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSynthesizer;

impl HeuristicSynthesizer {
    /// Create a heuristic synthesizer
    pub fn new() -> Self {
        Self
    }

    /// Derive an answer from `matches`, highest-ranked evidence first
    ///
    /// Matches are examined in rank order and the first one carrying an
    /// error marker or a failure mention decides the answer; the error rule
    /// is checked first within each match. `matches_used` lists every match
    /// id in rank order.
    ///
    /// # Examples
    ///
    /// ```
    /// use pipelens_domain::{Match, Metadata, MetadataKey};
    /// use pipelens_synthesizer::HeuristicSynthesizer;
    ///
    /// let mut metadata = Metadata::new();
    /// metadata.insert(MetadataKey::Preview, "ERROR: exit 1");
    /// metadata.insert(MetadataKey::StepName, "build");
    /// metadata.insert(MetadataKey::JobId, "42");
    /// let matches = vec![Match { id: "c1".to_string(), score: 0.9, metadata }];
    ///
    /// let answer = HeuristicSynthesizer::new().synthesize_heuristic(&matches);
    /// assert_eq!(answer.root_cause, "Error detected in pipeline.");
    /// assert_eq!(answer.explanation, "Failure occurred in step 'build' of job '42'.");
    /// assert_eq!(answer.matches_used, vec!["c1"]);
    /// ```
    pub fn synthesize_heuristic(&self, matches: &[Match]) -> SynthesizedAnswer {
        let matches_used: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();

        for m in matches {
            if is_error_evidence(m) {
                return SynthesizedAnswer {
                    root_cause: ERROR_ROOT_CAUSE.to_string(),
                    explanation: format!(
                        "Failure occurred in step '{}' of job '{}'.",
                        describe(m.step_name()),
                        describe(m.job_id())
                    ),
                    fix: ERROR_FIX.to_string(),
                    matches_used,
                };
            }

            if is_failure_mention(m) {
                return SynthesizedAnswer {
                    root_cause: FAILED_ROOT_CAUSE.to_string(),
                    explanation: format!(
                        "Log suggests failure in step '{}'.",
                        describe(m.step_name())
                    ),
                    fix: FAILED_FIX.to_string(),
                    matches_used,
                };
            }
        }

        SynthesizedAnswer::insufficient_evidence(matches_used)
    }
}

fn status_in(m: &Match, statuses: &[&str]) -> bool {
    m.status()
        .is_some_and(|status| statuses.iter().any(|s| s.eq_ignore_ascii_case(status.trim())))
}

fn is_error_evidence(m: &Match) -> bool {
    m.preview().contains("ERROR") || status_in(m, &ERROR_STATUSES)
}

fn is_failure_mention(m: &Match) -> bool {
    m.preview().to_lowercase().contains("failed") || status_in(m, &FAILURE_STATUSES)
}

fn describe(attribute: Option<String>) -> String {
    attribute.unwrap_or_else(|| "unknown".to_string())
}

//! Prompt construction for grounded generation

use pipelens_domain::Match;

/// Builds the generation prompt from a question and its evidence
pub struct PromptBuilder<'a> {
    question: &'a str,
    matches: &'a [Match],
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(question: &'a str, matches: &'a [Match]) -> Self {
        Self { question, matches }
    }

    /// Build the complete prompt
    ///
    /// # Examples
    ///
    /// ```
    /// use pipelens_domain::{Match, Metadata, MetadataKey};
    /// use pipelens_synthesizer::PromptBuilder;
    ///
    /// let mut metadata = Metadata::new();
    /// metadata.insert(MetadataKey::Preview, "npm ERR! missing script: lint");
    /// let matches = vec![Match { id: "c7".to_string(), score: 0.8, metadata }];
    ///
    /// let prompt = PromptBuilder::new("Why did lint fail?", &matches).build();
    /// assert!(prompt.contains("ONLY"));
    /// assert!(prompt.contains("Why did lint fail?"));
    /// assert!(prompt.contains("[Snippet 1] id: c7"));
    /// ```
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Role and grounding rules
        prompt.push_str(GROUNDING_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. Answer structure
        prompt.push_str(ANSWER_STRUCTURE);
        prompt.push_str("\n\n");

        // 3. The question
        prompt.push_str("Question:\n");
        prompt.push_str(self.question.trim());
        prompt.push_str("\n\n");

        // 4. The evidence
        prompt.push_str("Relevant log snippets:\n");
        if self.matches.is_empty() {
            prompt.push_str("(none)\n");
        }
        for (i, m) in self.matches.iter().enumerate() {
            prompt.push_str(&format!(
                "[Snippet {}] id: {}\njob: {}\nstep: {}\nstatus: {}\npreview:\n{}\n\n",
                i + 1,
                m.id,
                field(m.job_id()),
                field(m.step_name()),
                field(m.status()),
                m.preview()
            ));
        }

        prompt.push_str("Answer:\n");
        prompt
    }
}

fn field(value: Option<String>) -> String {
    value.unwrap_or_else(|| "n/a".to_string())
}

const GROUNDING_INSTRUCTIONS: &str = "You are a CI/CD log analysis assistant.
Use ONLY the information in the log snippets below. Do not guess causes that
the snippets do not show. If the snippets are not enough to answer, say so.";

const ANSWER_STRUCTURE: &str = "Structure your answer as:
1. Root cause: one sentence
2. Explanation: what the snippets show
3. Fix steps: concrete actions
4. Cited snippets: the ids of the snippets you relied on";

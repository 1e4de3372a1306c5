//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use colored::*;
use pipelens_domain::Match;
use pipelens_ingest::IngestReport;
use pipelens_synthesizer::Synthesis;
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const PREVIEW_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the answer to a question.
    ///
    /// `None` means nothing was retrieved.
    pub fn format_answer(&self, synthesis: Option<&Synthesis>, sources: &[String]) -> Result<String> {
        match (self.format, synthesis) {
            (CliFormat::Json, Some(s)) => Ok(serde_json::to_string_pretty(&json!({
                "answer": s.answer,
                "sources": sources,
                "strategy": s.strategy,
                "prompt_used": s.prompt,
                "structured": s.structured,
                "evidence": s.evidence,
            }))?),
            (CliFormat::Json, None) => Ok(serde_json::to_string_pretty(&json!({
                "answer": "",
                "sources": sources,
            }))?),
            (CliFormat::Text, None) => Ok(self.warning("No matching log chunks found.")),
            (CliFormat::Text, Some(s)) => {
                let mut out = s.answer.clone();
                out.push_str("\n\n");
                out.push_str(&self.colorize(&format!("Sources ({}):", s.strategy), "cyan"));
                for id in sources {
                    out.push_str("\n  ");
                    out.push_str(id);
                }
                Ok(out)
            }
        }
    }

    /// Format search results.
    pub fn format_matches(&self, matches: &[Match]) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(matches)?),
            CliFormat::Text => Ok(self.format_matches_table(matches)),
        }
    }

    fn format_matches_table(&self, matches: &[Match]) -> String {
        if matches.is_empty() {
            return self.colorize("No matching log chunks found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Score", "Job", "Step", "Status", "Preview"]);

        for (rank, m) in matches.iter().enumerate() {
            builder.push_record([
                (rank + 1).to_string(),
                format!("{:.3}", m.score),
                m.job_id().unwrap_or_else(|| "-".to_string()),
                m.step_name().unwrap_or_else(|| "-".to_string()),
                m.status().unwrap_or_else(|| "-".to_string()),
                truncate(&m.preview(), PREVIEW_WIDTH),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format an ingestion report.
    pub fn format_ingest_report(&self, report: &IngestReport) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            CliFormat::Text => Ok(self.success(&format!(
                "Upserted {} chunks from '{}' ({} lines, {} chunks created)",
                report.vectors_upserted, report.source, report.lines, report.chunks_created
            ))),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Cut `text` to `width` characters, marking the cut with an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

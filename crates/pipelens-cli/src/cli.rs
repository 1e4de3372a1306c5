//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use pipelens_synthesizer::Strategy;
use std::path::PathBuf;

/// Pipelens - Ask questions about CI/CD logs.
#[derive(Debug, Parser)]
#[command(name = "pipelens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "text")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (default: ~/.pipelens/config.toml)
    #[arg(short, long, global = true, env = "PIPELENS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Human-readable text (default)
    Text,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chunk a log file and write it to the index
    Ingest(IngestArgs),

    /// Answer a question from the indexed logs
    Ask(AskArgs),

    /// Show the log chunks most similar to a question
    Search(SearchArgs),

    /// Run the HTTP query service
    Serve(ServeArgs),
}

/// Arguments for the ingest command.
#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// Log file to ingest
    pub file: PathBuf,

    /// Source identifier recorded on every chunk (default: file name)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Chunks embedded and written per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,
}

/// Arguments for the ask command.
#[derive(Debug, Parser)]
pub struct AskArgs {
    /// Question about the logs
    pub question: String,

    /// Restrict evidence to one pipeline run
    #[arg(short, long)]
    pub job_id: Option<String>,

    /// Answer strategy (heuristic, generated, auto)
    #[arg(short, long)]
    pub strategy: Option<Strategy>,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Log files to ingest first (repeatable)
    #[arg(short, long)]
    pub ingest: Vec<PathBuf>,
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Search query text
    pub question: String,

    /// Restrict results to one pipeline run
    #[arg(short, long)]
    pub job_id: Option<String>,

    /// Maximum number of results
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Log files to ingest first (repeatable)
    #[arg(short, long)]
    pub ingest: Vec<PathBuf>,
}

/// Arguments for the serve command.
#[derive(Debug, Parser)]
pub struct ServeArgs {
    /// Log files to ingest before serving (repeatable)
    #[arg(short, long)]
    pub ingest: Vec<PathBuf>,

    /// Override the configured bind port
    #[arg(short, long)]
    pub port: Option<u16>,
}

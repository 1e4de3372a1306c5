//! Ask command implementation.

use super::{ingest_files, require_question};
use crate::cli::AskArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use pipelens_domain::MatchFilter;
use pipelens_server::config::ServerConfig;
use pipelens_server::Services;
use pipelens_synthesizer::AnswerSynthesizer;

/// Execute the ask command.
pub async fn execute_ask(args: AskArgs, mut config: ServerConfig, formatter: &Formatter) -> Result<()> {
    let question = require_question(&args.question)?;
    if args.top_k == Some(0) {
        return Err(CliError::InvalidInput("top-k must be greater than 0".to_string()));
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }

    let services = Services::from_config(config)?;
    // Built first so a misconfigured backend fails before any ingestion
    let synthesizer = services.synthesizer()?;
    ingest_files(&services, &args.ingest, formatter).await?;

    let top_k = args.top_k.unwrap_or(services.config().top_k);
    let filter = args.job_id.map(MatchFilter::job).unwrap_or_default();
    let matches = services.retriever().query(question, top_k, &filter).await?;
    let sources: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();

    if matches.is_empty() {
        println!("{}", formatter.format_answer(None, &sources)?);
        return Ok(());
    }

    let synthesis = synthesizer.synthesize(question, &matches).await?;
    println!("{}", formatter.format_answer(Some(&synthesis), &sources)?);
    Ok(())
}

//! Search command implementation.

use super::{ingest_files, require_question};
use crate::cli::SearchArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use pipelens_domain::MatchFilter;
use pipelens_server::config::ServerConfig;
use pipelens_server::Services;

/// Execute the search command.
pub async fn execute_search(args: SearchArgs, config: ServerConfig, formatter: &Formatter) -> Result<()> {
    let question = require_question(&args.question)?;
    // Validate parameters
    if args.top_k == Some(0) {
        return Err(CliError::InvalidInput("top-k must be greater than 0".to_string()));
    }

    let services = Services::from_config(config)?;
    ingest_files(&services, &args.ingest, formatter).await?;

    let top_k = args.top_k.unwrap_or(services.config().top_k);
    let filter = args.job_id.map(MatchFilter::job).unwrap_or_default();
    let matches = services.retriever().query(question, top_k, &filter).await?;

    println!("{}", formatter.format_matches(&matches)?);
    Ok(())
}

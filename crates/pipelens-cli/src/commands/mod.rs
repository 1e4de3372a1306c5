//! Command implementations.

pub mod ask;
pub mod ingest;
pub mod search;
pub mod serve;

pub use self::ask::execute_ask;
pub use self::ingest::execute_ingest;
pub use self::search::execute_search;
pub use self::serve::execute_serve;

use crate::error::Result;
use crate::output::Formatter;
use pipelens_server::Services;
use std::path::PathBuf;

/// Ingest `paths` into the shared index before a query runs.
///
/// Reports go to stderr so stdout carries only the command's answer.
pub(crate) async fn ingest_files(services: &Services, paths: &[PathBuf], formatter: &Formatter) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }

    let pipeline = services.ingest_pipeline()?;
    for path in paths {
        let report = pipeline.ingest_file(path, None).await?;
        eprintln!(
            "{}",
            formatter.info(&format!(
                "Ingested {} ({} chunks)",
                report.source, report.chunks_created
            ))
        );
    }
    Ok(())
}

/// Trimmed question, rejecting blank input.
pub(crate) fn require_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(crate::error::CliError::InvalidInput(
            "Question must not be empty".to_string(),
        ));
    }
    Ok(question)
}

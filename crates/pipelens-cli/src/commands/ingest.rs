//! Ingest command implementation.

use crate::cli::IngestArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use pipelens_server::config::{IndexConfig, ServerConfig};
use pipelens_server::Services;

/// Execute the ingest command.
pub async fn execute_ingest(
    args: IngestArgs,
    mut config: ServerConfig,
    formatter: &Formatter,
) -> Result<()> {
    if let Some(batch_size) = args.batch_size {
        if batch_size == 0 {
            return Err(CliError::InvalidInput(
                "Batch size must be greater than 0".to_string(),
            ));
        }
        config.ingest.batch_size = batch_size;
    }

    if config.index == IndexConfig::Memory {
        eprintln!(
            "{}",
            formatter.warning("The memory index is discarded on exit; use --ingest with ask, search or serve")
        );
    }

    let services = Services::from_config(config)?;
    let pipeline = services.ingest_pipeline()?;
    let report = pipeline.ingest_file(&args.file, args.source.as_deref()).await?;

    println!("{}", formatter.format_ingest_report(&report)?);
    Ok(())
}

//! Serve command implementation.

use crate::cli::ServeArgs;
use crate::error::Result;
use pipelens_server::config::ServerConfig;
use pipelens_server::start_server;

/// Execute the serve command.
pub async fn execute_serve(args: ServeArgs, mut config: ServerConfig) -> Result<()> {
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    start_server(config, &args.ingest).await?;
    Ok(())
}

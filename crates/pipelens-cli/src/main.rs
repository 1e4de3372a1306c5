//! Pipelens CLI - Ask questions about CI/CD logs.

use clap::Parser;
use pipelens_cli::commands;
use pipelens_cli::config;
use pipelens_cli::{Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format, !cli.no_color);

    if let Err(e) = run(cli, &formatter).await {
        eprintln!("{}", formatter.error(&e.to_string()));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, formatter: &Formatter) -> pipelens_cli::Result<()> {
    // The service logs request summaries at info
    let serving = matches!(cli.command, Command::Serve(_));
    init_logging(cli.verbose || serving);

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Ingest(args) => commands::execute_ingest(args, config, formatter).await,
        Command::Ask(args) => commands::execute_ask(args, config, formatter).await,
        Command::Search(args) => commands::execute_search(args, config, formatter).await,
        Command::Serve(args) => commands::execute_serve(args, config).await,
    }
}

/// Log to stderr; `RUST_LOG` wins over the verbosity flag.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Pipelens query service
//!
//! Starts the HTTP service answering questions about ingested CI/CD logs.

use pipelens_server::{config::ServerConfig, init_tracing, start_server, ServerError};
use std::env;
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

const USAGE: &str = "Usage: pipelens-server [--config <file>] [--ingest <log>]...";

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    config_path: Option<PathBuf>,
    ingest: Vec<PathBuf>,
    help: bool,
}

/// Parse arguments (without the program name); a flag missing its value is an error
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config requires a value")?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            "--ingest" => {
                let path = args.next().ok_or("--ingest requires a value")?;
                parsed.ingest.push(PathBuf::from(path));
            }
            "--help" | "-h" => parsed.help = true,
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

async fn run() -> Result<(), ServerError> {
    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };
    if args.help {
        print_help();
        process::exit(0);
    }

    init_tracing("info");

    let config = match args.config_path {
        Some(path) => ServerConfig::from_file(path)?,
        None => {
            eprintln!("Warning: No config file specified, using defaults");
            let mut config = ServerConfig::default();
            config.apply_env();
            config
        }
    };

    start_server(config, &args.ingest).await
}

fn print_help() {
    println!("Pipelens query service - answers questions about CI/CD logs");
    println!();
    println!("USAGE:");
    println!("    pipelens-server [--config <file>] [--ingest <log>]...");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --ingest <log>     Index a log file before serving (repeatable)");
    println!("    --help             Print this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    OLLAMA_URL         Generation endpoint override");
    println!("    PINECONE_API_KEY   API key for the hosted index");
    println!("    RUST_LOG           Log filter (default: info)");
    println!();
    println!("ENDPOINTS:");
    println!("    POST /query        {{\"question\": \"...\", \"job_id\": \"...\"}}");
    println!("    GET  /health       Backend wiring and status");
    println!();
}

//! Command-level tests against the in-process backends

use pipelens_cli::cli::{AskArgs, IngestArgs, SearchArgs};
use pipelens_cli::commands::{execute_ask, execute_ingest, execute_search};
use pipelens_cli::{CliError, CliFormat, Formatter};
use pipelens_ingest::IngestError;
use pipelens_server::config::ServerConfig;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const BUILD_LOG: &str = "\
job_id: 42
step: build
Compiling pipelens v0.1.0
ERROR: linker `cc` not found
exit code: 1
";

fn write_log(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn formatter() -> Formatter {
    Formatter::new(CliFormat::Json, false)
}

#[tokio::test]
async fn test_ingest_reports_counts() {
    let dir = TempDir::new().unwrap();
    let path = write_log(&dir, "build.log", BUILD_LOG);

    let args = IngestArgs {
        file: path,
        source: Some("run-42".to_string()),
        batch_size: Some(1),
    };
    execute_ingest(args, ServerConfig::default(), &formatter())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ingest_missing_file() {
    let dir = TempDir::new().unwrap();
    let args = IngestArgs {
        file: dir.path().join("missing.log"),
        source: None,
        batch_size: None,
    };

    let result = execute_ingest(args, ServerConfig::default(), &formatter()).await;
    assert!(matches!(
        result,
        Err(CliError::Ingest(IngestError::SourceNotFound(_)))
    ));
}

#[tokio::test]
async fn test_ingest_rejects_zero_batch() {
    let dir = TempDir::new().unwrap();
    let args = IngestArgs {
        file: write_log(&dir, "build.log", BUILD_LOG),
        source: None,
        batch_size: Some(0),
    };

    let result = execute_ingest(args, ServerConfig::default(), &formatter()).await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[tokio::test]
async fn test_ask_with_ingest() {
    let dir = TempDir::new().unwrap();
    let args = AskArgs {
        question: "why did job 42 fail?".to_string(),
        job_id: Some("42".to_string()),
        strategy: None,
        top_k: Some(3),
        ingest: vec![write_log(&dir, "build.log", BUILD_LOG)],
    };

    execute_ask(args, ServerConfig::default(), &formatter())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ask_rejects_blank_question() {
    let args = AskArgs {
        question: "  ".to_string(),
        job_id: None,
        strategy: None,
        top_k: None,
        ingest: Vec::new(),
    };

    let result = execute_ask(args, ServerConfig::default(), &formatter()).await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[tokio::test]
async fn test_ask_missing_ingest_file() {
    let dir = TempDir::new().unwrap();
    let args = AskArgs {
        question: "what broke?".to_string(),
        job_id: None,
        strategy: None,
        top_k: None,
        ingest: vec![dir.path().join("missing.log")],
    };

    let result = execute_ask(args, ServerConfig::default(), &formatter()).await;
    assert!(matches!(
        result,
        Err(CliError::Ingest(IngestError::SourceNotFound(_)))
    ));
}

#[tokio::test]
async fn test_search_with_job_filter() {
    let dir = TempDir::new().unwrap();
    let args = SearchArgs {
        question: "linker".to_string(),
        job_id: Some("7".to_string()),
        top_k: None,
        ingest: vec![write_log(&dir, "build.log", BUILD_LOG)],
    };

    execute_search(args, ServerConfig::default(), &Formatter::new(CliFormat::Text, false))
        .await
        .unwrap();
}

//! Configuration loading for the CLI.
//!
//! The CLI reads the same TOML file as the query service. An explicit
//! `--config` path must exist; the default path is optional and built-in
//! defaults apply when it is absent.

use crate::error::{CliError, Result};
use pipelens_server::config::ServerConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the default configuration file path.
pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(".pipelens").join("config.toml"))
}

/// Load configuration from `explicit`, or from the default path.
pub fn load(explicit: Option<&Path>) -> Result<ServerConfig> {
    match explicit {
        Some(path) => load_from(path, true),
        None => load_from(&default_path()?, false),
    }
}

/// Load configuration from `path`; a missing optional file yields defaults.
///
/// Environment overrides apply either way.
pub fn load_from(path: &Path, required: bool) -> Result<ServerConfig> {
    if path.exists() {
        debug!("Loading configuration from {}", path.display());
        return Ok(ServerConfig::from_file(path)?);
    }

    if required {
        return Err(CliError::Config(format!(
            "Config file '{}' does not exist",
            path.display()
        )));
    }

    debug!("No config at {}, using defaults", path.display());
    let mut config = ServerConfig::default();
    config.apply_env();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipelens_synthesizer::Strategy;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "top_k = 3\nstrategy = \"heuristic\"\n\n[ingest]\nbatch_size = 8\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.strategy, Strategy::Heuristic);
        assert_eq!(config.ingest.batch_size, 8);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let result = load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_missing_default_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_from(&dir.path().join("config.toml"), false).unwrap();
        assert_eq!(config.top_k, 10);
        assert_eq!(config.ingest.batch_size, 50);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "top_k = 0\n").unwrap();
        assert!(matches!(load(Some(&path)), Err(CliError::ConfigFile(_))));
    }

    #[test]
    fn test_default_path() {
        if let Ok(path) = default_path() {
            assert!(path.ends_with(".pipelens/config.toml"));
        }
    }
}

//! CLI commands module.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use sealchain_ledger::{LedgerConfig, CONFIG_FILE_NAME};
use std::path::PathBuf;

mod init;
mod inspect;
mod list;
mod log;
mod verify;

#[derive(Subcommand)]
pub enum Commands {
    /// Create the ledger key and genesis block
    Init(init::InitArgs),
    /// Seal a JSON array of records as one block
    Log(log::LogArgs),
    /// Check chain integrity without the key
    Verify,
    /// Show blocks with decrypted transactions
    Inspect(inspect::InspectArgs),
    /// List recent blocks
    List(list::ListArgs),
}

/// Ledger location flags shared by every command.
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Path to configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Directory holding the block files (overrides config)
    #[arg(long, global = true)]
    pub blocks_dir: Option<PathBuf>,

    /// Path to the key file (overrides config)
    #[arg(long, global = true)]
    pub key_file: Option<PathBuf>,
}

impl LedgerArgs {
    /// Load the config file and apply command-line overrides.
    pub fn resolve(&self) -> Result<LedgerConfig> {
        let mut config = LedgerConfig::load(&self.config)
            .with_context(|| format!("Failed to load config: {}", self.config.display()))?;

        if let Some(dir) = &self.blocks_dir {
            config.blocks_dir = dir.clone();
        }
        if let Some(key) = &self.key_file {
            config.key_file = key.clone();
        }
        Ok(config)
    }
}

pub fn run(cmd: Commands, ledger: &LedgerArgs) -> Result<()> {
    let config = ledger.resolve()?;

    match cmd {
        Commands::Init(args) => init::run(args, &config, &ledger.config),
        Commands::Log(args) => log::run(args, &config),
        Commands::Verify => verify::run(&config),
        Commands::Inspect(args) => inspect::run(args, &config),
        Commands::List(args) => list::run(args, &config),
    }
}

/// Render a block timestamp as UTC time.
fn format_timestamp(timestamp: f64) -> String {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    match DateTime::<Utc>::from_timestamp(secs as i64, nanos) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => timestamp.to_string(),
    }
}

/// First 16 hex characters of a digest.
fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join(CONFIG_FILE_NAME);
        LedgerConfig {
            blocks_dir: "from_file".into(),
            key_file: "file.key".into(),
        }
        .save(&config_path)
        .unwrap();

        let args = LedgerArgs {
            config: config_path.clone(),
            blocks_dir: Some("from_flag".into()),
            key_file: None,
        };
        let config = args.resolve().unwrap();

        assert_eq!(config.blocks_dir, PathBuf::from("from_flag"));
        assert_eq!(config.key_file, PathBuf::from("file.key"));
    }

    #[test]
    fn test_resolve_without_file() {
        let tmp = tempfile::tempdir().unwrap();
        let args = LedgerArgs {
            config: tmp.path().join("absent.json"),
            blocks_dir: None,
            key_file: None,
        };
        assert_eq!(args.resolve().unwrap(), LedgerConfig::default());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "1970-01-01 00:00:00.000 UTC");
        assert_eq!(format_timestamp(1700000000.5), "2023-11-14 22:13:20.500 UTC");
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash(&"ab".repeat(32)), "abababababababab");
        assert_eq!(short_hash("0"), "0");
    }
}

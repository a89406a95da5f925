//! Log a batch file as a new block.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sealchain_ledger::{Ledger, LedgerConfig};
use std::path::PathBuf;

#[derive(Args)]
pub struct LogArgs {
    /// JSON file holding an array of records
    file: PathBuf,
}

pub fn run(args: LogArgs, config: &LedgerConfig) -> Result<()> {
    let mut ledger = Ledger::open(config, config.key_provider())
        .with_context(|| "Failed to open ledger. Did you run 'sealchain init'?")?;

    let block = ledger
        .log_file(&args.file)
        .with_context(|| format!("Failed to log {}", args.file.display()))?;
    let hash = block.hash().to_owned();
    let count = block.tx_count();
    let index = ledger.chain().len() - 1;

    println!(
        "{}  Sealed {} transaction(s) into block {}",
        "✓".green().bold(),
        count.to_string().bright_cyan(),
        format!("#{}", index).bright_cyan()
    );
    println!("    Hash: {}", hash.bright_yellow());

    Ok(())
}

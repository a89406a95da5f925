//! List recent blocks.

use super::{format_timestamp, short_hash};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sealchain_ledger::LedgerConfig;
use sealchain_storage::{BlockDir, ChainStore};

#[derive(Args)]
pub struct ListArgs {
    /// Number of blocks to show
    #[arg(short, long, default_value = "10")]
    count: usize,
}

pub fn run(args: ListArgs, config: &LedgerConfig) -> Result<()> {
    let dir = BlockDir::open_existing(&config.blocks_dir)
        .with_context(|| "Failed to open ledger. Did you run 'sealchain init'?")?;
    let mut chain = ChainStore::new(dir);
    chain.reload().context("Failed to read block records")?;

    println!();
    println!("{}", "Recent Blocks:".bold().cyan());
    println!();

    for (index, block) in chain.recent(args.count) {
        println!(
            "  {} {} {} {}",
            format!("#{}", index).bright_black(),
            short_hash(block.hash()).bright_yellow(),
            format!("({} txs)", block.tx_count()).bright_black(),
            format_timestamp(block.timestamp()).bright_black()
        );
    }

    println!();
    println!("  {} block(s) total", chain.len().to_string().bright_cyan());
    println!();
    Ok(())
}

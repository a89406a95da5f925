//! Inspect blocks with decrypted transactions.

use super::format_timestamp;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use sealchain_core::AesGcmCipher;
use sealchain_ledger::{inspect_chain, InspectedBlock, LedgerConfig};
use sealchain_storage::BlockDir;

#[derive(Args)]
pub struct InspectArgs {
    /// Show only this block
    #[arg(short, long)]
    block: Option<u64>,
}

pub fn run(args: InspectArgs, config: &LedgerConfig) -> Result<()> {
    let dir = BlockDir::open_existing(&config.blocks_dir)
        .with_context(|| "Failed to open ledger. Did you run 'sealchain init'?")?;
    let key = config
        .key_provider()
        .resolve()
        .with_context(|| format!("Failed to load key: {}", config.key_file.display()))?;
    let cipher = AesGcmCipher::new(&key)?;

    let mut blocks = inspect_chain(&dir, &cipher).context("Failed to read block records")?;
    if let Some(index) = args.block {
        blocks.retain(|b| b.index == index);
        if blocks.is_empty() {
            bail!("Block {} not found", index);
        }
    }

    println!();
    let show_proofs = args.block.is_some();
    for block in &blocks {
        print_block(block, show_proofs);
    }

    let failures: usize = blocks.iter().map(InspectedBlock::failures).sum();
    if failures > 0 {
        println!(
            "{}  {} transaction(s) could not be decrypted",
            "!".yellow().bold(),
            failures.to_string().yellow()
        );
        println!();
    }

    Ok(())
}

fn print_block(inspected: &InspectedBlock, show_proofs: bool) {
    let block = &inspected.block;

    println!("{}", format!("Block #{}", inspected.index).bold().cyan());
    println!("  Hash:          {}", block.hash().bright_yellow());
    println!("  Previous Hash: {}", block.previous_hash().bright_black());
    println!(
        "  Merkle Root:   {}",
        block.merkle_root().unwrap_or("null").bright_black()
    );
    println!(
        "  Timestamp:     {}",
        format_timestamp(block.timestamp()).bright_black()
    );
    println!(
        "  Transactions:  {}",
        block.tx_count().to_string().bright_cyan()
    );

    for (i, tx) in inspected.transactions.iter().enumerate() {
        let label = format!("{}.", i + 1).bright_black();
        match tx {
            Ok(value) => println!("    {} {}", label, value),
            Err(e) => println!("    {} {}", label, format!("<{}>", e).red()),
        }
    }

    if show_proofs && block.tx_count() > 0 {
        let proofs = inspected.inclusion_proofs();
        let proven = proofs.iter().filter(|ok| **ok).count();
        let summary = format!("{}/{}", proven, proofs.len());
        let summary = if proven == proofs.len() {
            summary.green()
        } else {
            summary.red()
        };
        println!("  Inclusion proofs verified: {}", summary);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealchain_ledger::Ledger;
    use serde_json::json;

    fn setup() -> (tempfile::TempDir, LedgerConfig) {
        let tmp = tempfile::tempdir().unwrap();
        let config = LedgerConfig {
            blocks_dir: tmp.path().join("blocks"),
            key_file: tmp.path().join("key.key"),
        };
        let mut ledger = Ledger::open(&config, config.init_key_provider()).unwrap();
        ledger.log_batch(&[json!({"file": "a.txt"})]).unwrap();
        (tmp, config)
    }

    #[test]
    fn test_inspect_all_and_one() {
        let (_tmp, config) = setup();
        run(InspectArgs { block: None }, &config).unwrap();
        run(InspectArgs { block: Some(1) }, &config).unwrap();
        assert!(run(InspectArgs { block: Some(9) }, &config).is_err());
    }

    #[test]
    fn test_inspect_needs_key() {
        let (_tmp, config) = setup();
        std::fs::remove_file(&config.key_file).unwrap();
        assert!(run(InspectArgs { block: None }, &config).is_err());
    }
}

//! Initialize ledger command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sealchain_ledger::{Ledger, LedgerConfig};
use std::path::Path;

#[derive(Args)]
pub struct InitArgs {
    /// Write the resolved paths to the config file
    #[arg(long)]
    save_config: bool,
}

pub fn run(args: InitArgs, config: &LedgerConfig, config_path: &Path) -> Result<()> {
    println!("{}", "Initializing sealchain...".bold().cyan());
    println!();

    let key_existed = config.key_file.exists();
    let ledger = Ledger::open(config, config.init_key_provider())
        .with_context(|| format!("Failed to open ledger at {}", config.blocks_dir.display()))?;

    let key_status = if key_existed { "Loaded key" } else { "Generated key" };
    println!(
        "{}  {}: {}",
        "✓".green().bold(),
        key_status,
        config.key_file.display().to_string().bright_black()
    );

    let chain = ledger.chain();
    let genesis = chain.get(0).context("Chain has no genesis block")?;
    println!(
        "{}  Block directory: {}",
        "✓".green().bold(),
        config.blocks_dir.display().to_string().bright_black()
    );
    println!();
    println!("  Genesis hash: {}", genesis.hash().bright_yellow());
    println!("  Blocks:       {}", chain.len().to_string().bright_cyan());

    if args.save_config {
        config
            .save(config_path)
            .with_context(|| format!("Failed to save config: {}", config_path.display()))?;
        println!();
        println!(
            "{}  Saved config to: {}",
            "✓".green().bold(),
            config_path.display().to_string().bright_black()
        );
    }

    println!();
    println!("{}", "Ledger ready.".green().bold());
    println!();
    println!("Next steps:");
    println!("  • Use {} to seal a batch", "sealchain log <FILE>".bright_cyan());
    println!("  • Use {} to check integrity", "sealchain verify".bright_cyan());

    Ok(())
}

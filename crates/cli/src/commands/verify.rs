//! Verify chain integrity.
//!
//! Never touches the key file.

use anyhow::{bail, Result};
use colored::Colorize;
use sealchain_ledger::LedgerConfig;
use sealchain_verifier::{ChainVerifier, IntegrityViolation, VerifyError};

pub fn run(config: &LedgerConfig) -> Result<()> {
    println!(
        "{} {}",
        "Verifying".bold().cyan(),
        config.blocks_dir.display().to_string().bright_black()
    );
    println!();

    match ChainVerifier::verify_path(&config.blocks_dir) {
        Ok(verified) => {
            println!(
                "{}  {} block(s) verified",
                "✓".green().bold(),
                verified.blocks.to_string().bright_cyan()
            );
            if let Some(head) = verified.head_hash {
                println!("    Head: {}", head.bright_yellow());
            }
            Ok(())
        }
        Err(VerifyError::Integrity(violation)) => {
            report(&violation);
            bail!(
                "integrity violation at block {} ({})",
                violation.index(),
                violation.kind()
            )
        }
        Err(e) => Err(e.into()),
    }
}

fn report(violation: &IntegrityViolation) {
    println!(
        "{}  Block {} failed: {}",
        "✗".red().bold(),
        format!("#{}", violation.index()).bright_cyan(),
        violation.kind().red()
    );

    match violation {
        IntegrityViolation::MerkleMismatch { stored, computed, .. } => {
            println!("    Stored root:   {}", stored.as_deref().unwrap_or("null"));
            println!("    Computed root: {}", computed.as_deref().unwrap_or("null"));
        }
        IntegrityViolation::HashMismatch { stored, computed, .. } => {
            println!("    Stored hash:   {}", stored);
            println!("    Computed hash: {}", computed);
        }
        IntegrityViolation::LinkageBreak { expected, found, .. } => {
            println!("    Expected previous hash: {}", expected);
            println!("    Found previous hash:    {}", found);
        }
    }
    println!();
}

//! # Start Command Implementation
//!
//! Provisions every configured zergling and starts it, then prints one line
//! per entry. The exit status is non-zero if any entry failed.

use anyhow::Result;
use clap::Args;

use crate::cli::GlobalArgs;

/// Provision every configured zergling and start it
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the `start` command.
pub fn execute(global: &GlobalArgs, args: StartArgs) -> Result<()> {
    let (overlord, entries) = super::load_with_entries(global)?;
    let report = overlord.plan(entries)?.run();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    if report.has_failures() {
        anyhow::bail!("overlord {} failed to start some zerglings", report.overlord);
    }
    Ok(())
}

//! # Graph Command Implementation
//!
//! Prints the action graph a `start` would run. Folderspecs are validated but
//! nothing is cloned, updated or started.

use anyhow::Result;
use clap::Args;

use crate::cli::GlobalArgs;

/// Print the action graph without running it
#[derive(Args, Debug)]
pub struct GraphArgs {}

/// Execute the `graph` command.
pub fn execute(global: &GlobalArgs, _args: GraphArgs) -> Result<()> {
    let (overlord, entries) = super::load_with_entries(global)?;
    if entries.is_empty() {
        println!("No zerglings configured.");
        return Ok(());
    }
    let plan = overlord.plan(entries)?;
    println!("{}", plan.ascii_graph());
    Ok(())
}

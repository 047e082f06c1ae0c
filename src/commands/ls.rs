//! # Ls Command Implementation
//!
//! Lists the projects found under the root directory, with the backend, URL
//! and revision of each checkout. Read-only.

use anyhow::Result;
use clap::Args;

use crate::cli::GlobalArgs;

/// List the projects known under the root directory
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Use long listing format showing backend, URL and revision.
    #[arg(short, long)]
    pub long: bool,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the `ls` command.
pub fn execute(global: &GlobalArgs, args: LsArgs) -> Result<()> {
    let (overlord, _) = super::load(global)?;
    let projects = overlord.inventory()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects in {}", overlord.rootdir().display());
        return Ok(());
    }

    for project in &projects {
        if args.long {
            println!(
                "{:<20} {:<4} {:<12} {} ({})",
                project.name,
                project.vcs.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string()),
                project
                    .revision
                    .as_deref()
                    .map(|r| r.get(..12).unwrap_or(r))
                    .unwrap_or("-"),
                project.url.as_deref().unwrap_or("-"),
                project.folder.display()
            );
        } else {
            println!("{}", project.name);
        }
    }

    println!();
    println!("{} project(s)", projects.len());
    Ok(())
}

//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `overlord` command-line tool, one file per subcommand.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct with the command-specific options, derived using `clap`.
//! - An `execute` function that takes the global options and the parsed
//!   `Args` and calls into the `overlord` library.

pub mod graph;
pub mod ls;
pub mod start;

use std::sync::Arc;

use anyhow::{Context, Result};

use overlord::config::Entry;
use overlord::overlord::Overlord;

use crate::cli::GlobalArgs;

/// Read the configuration and set up the overlord it describes.
pub(crate) fn load(global: &GlobalArgs) -> Result<(Arc<Overlord>, Vec<Entry>)> {
    let (settings, entries) = global.settings().resolve().with_context(|| {
        match &global.config {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Failed to load config".to_string(),
        }
    })?;
    let overlord = Overlord::init(settings)?;
    Ok((overlord, entries))
}

/// Like [`load`], but a configuration file is mandatory.
pub(crate) fn load_with_entries(global: &GlobalArgs) -> Result<(Arc<Overlord>, Vec<Entry>)> {
    if global.config.is_none() {
        anyhow::bail!("No zergling configuration provided, pass --config <FILE>");
    }
    load(global)
}

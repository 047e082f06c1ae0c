//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Env};

use overlord::overlord::Settings;

use crate::commands;

/// Overlord - Provision and launch version-controlled sub-projects
#[derive(Parser, Debug)]
#[command(name = "overlord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Zergling configuration file (INI, or YAML with a .yaml/.yml extension)
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "OVERLORD_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// Unique name of this overlord (overrides the configuration file)
    #[arg(long, global = true, value_name = "NAME")]
    pub name: Option<String>,

    /// Directory holding the checkouts.
    ///
    /// Defaults to the `rootdir` setting of the configuration file, then to
    /// `overlord` inside the user configuration directory.
    #[arg(long, global = true, value_name = "DIR", env = "OVERLORD_ROOTDIR")]
    pub rootdir: Option<PathBuf>,
}

impl GlobalArgs {
    /// Settings from the command line; the configuration file fills the rest.
    pub fn settings(&self) -> Settings {
        Settings {
            name: self.name.clone(),
            file: self.config.clone(),
            rootdir: self.rootdir.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision every configured zergling and start it
    Start(commands::start::StartArgs),

    /// Print the action graph without running it
    Graph(commands::graph::GraphArgs),

    /// List the projects known under the root directory
    Ls(commands::ls::LsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // RUST_LOG wins over --log-level when set
        let _ = Builder::from_env(Env::default().default_filter_or(&self.log_level)).try_init();

        match self.command {
            Commands::Start(args) => commands::start::execute(&self.global, args),
            Commands::Graph(args) => commands::graph::execute(&self.global, args),
            Commands::Ls(args) => commands::ls::execute(&self.global, args),
        }
    }
}

//! # Error Handling
//!
//! This module defines the centralized error type for the `overlord` library.
//! It uses `thiserror` to build one `Error` enum covering every failure mode
//! of provisioning and launching zerglings, each variant carrying enough
//! context (entry name, folder, URL, command) to act on the message alone.
//!
//! ## Taxonomy
//!
//! - **Configuration errors** (`ConfigParse`, `UnsupportedFolderspec`,
//!   `Init`): raised before any external process is started.
//! - **External tool failures** (`VcsSpawn`, `VcsCommand`, `Timeout`,
//!   `UnknownRevision`): a `git` or `hg` invocation did not succeed.
//! - **Registry conditions** (`ProjectNotFound`, `ProjectExists`).
//! - **Execution errors** (`Install`, `Launch`, `NotCreated`, `Parallel`,
//!   `ThreadPool`, `Filesystem`, `LockPoisoned`).
//!
//! `Result<T>` is the crate-wide alias for `std::result::Result<T, Error>`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for overlord operations
#[derive(Error, Debug)]
pub enum Error {
    /// The zergling configuration could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A folderspec is neither an existing directory nor a known VCS scheme.
    #[error("Could not determine how to handle folder '{spec}' of zergling '{entry}'")]
    UnsupportedFolderspec { entry: String, spec: String },

    /// The overlord could not be initialized (name, config file, rootdir).
    #[error("Initialization error: {message}")]
    Init { message: String },

    /// A VCS tool could not be started at all.
    #[error("Failed to run {tool} {command}: {message}")]
    VcsSpawn {
        tool: String,
        command: String,
        message: String,
    },

    /// A VCS tool exited with a non-zero status.
    #[error("{tool} {command} failed for {location}: {stderr}")]
    VcsCommand {
        tool: String,
        command: String,
        /// Working copy folder or remote URL the command operated on
        location: String,
        stderr: String,
    },

    /// A captured subprocess exceeded its time limit and was killed.
    #[error("{tool} {command} timed out after {seconds}s")]
    Timeout {
        tool: String,
        command: String,
        seconds: u64,
    },

    /// A revision specifier could not be resolved against a remote.
    #[error("Unknown revision '{revision}' for {url}")]
    UnknownRevision { url: String, revision: String },

    /// The project registry has no project under this name.
    #[error("Project not found: {name}")]
    ProjectNotFound { name: String },

    /// A project name is already registered.
    #[error("Project '{name}' already exists at {}", .folder.display())]
    ProjectExists { name: String, folder: PathBuf },

    /// The install step of a project failed.
    #[error("Install of project '{project}' failed: {message}")]
    Install { project: String, message: String },

    /// The start procedure of a zergling failed.
    #[error("Launch of zergling '{zergling}' failed: {message}")]
    Launch { zergling: String, message: String },

    /// A start was attempted before its creation action completed.
    #[error("Zergling '{entry}' was started before it was created")]
    NotCreated { entry: String },

    /// One or more children of a parallel group failed.
    #[error("{} of {total} parallel actions failed:{}", failures.len(), failures.iter().map(|(label, message)| format!("\n  - {}: {}", label, message)).collect::<String>())]
    Parallel {
        total: usize,
        /// Label and error message of every failed child, in declaration order
        failures: Vec<(String, String)>,
    },

    /// The worker pool for a parallel group could not be built.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// An error with a filesystem operation on a project folder.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error indicating that a mutex has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

//! # Overlord Library
//!
//! This library provisions and starts a set of independently versioned
//! sub-projects ("zerglings") from a declarative configuration. It is the
//! engine behind the `overlord` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use overlord::config;
//!
//! let conf = config::parse_ini(
//!     "[overlord]\nname = staging\n\n[web]\nfolder = git+https://git.example.com/web.git#v2\n",
//! )
//! .unwrap();
//! assert_eq!(conf.settings.name.as_deref(), Some("staging"));
//! assert_eq!(conf.entries[0].name, "web");
//! assert!(conf.entries[0].pause);
//! ```
//!
//! ## Core Concepts
//!
//! - **Version control (`vcs`)**: one [`vcs::Vcs`] implementation per
//!   supported tool (Git, Mercurial) behind a uniform interface for
//!   checkout, update and revision identification.
//! - **Allocation (`allocate`)**: maps a folderspec to a project folder,
//!   reusing existing checkouts of the same remote before cloning.
//! - **Actions (`action`)**: composable units of work run in sequence or in
//!   parallel, renderable as an ASCII graph.
//! - **Overlord (`overlord`)**: ties it together; builds the action graph for
//!   a configuration and runs it into a [`report::RunReport`].
//!
//! ## Execution Flow
//!
//! 1.  **Configuration**: entries are read from an INI or YAML file.
//! 2.  **Validation**: every folderspec is classified before any work starts.
//! 3.  **Creation**: entries are allocated one after another, in order.
//! 4.  **Start**: all zerglings are started concurrently.
//! 5.  **Report**: one outcome per entry.

pub mod action;
pub mod allocate;
pub mod config;
pub mod error;
pub mod launcher;
pub mod names;
pub mod overlord;
pub mod project;
pub mod report;
pub mod store;
pub mod vcs;
pub mod zergling;

mod graph_proptest;

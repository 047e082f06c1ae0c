//! Shared test utilities for E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_config(&configs::local("web", &folder));
//! fixture.overlord("start").assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Configuration snippets for testing.
#[allow(dead_code)]
pub mod configs {
    use std::path::Path;

    /// Settings section naming the overlord.
    pub const SETTINGS: &str = "[overlord]\nname = test\n";

    /// One zergling section.
    pub fn section(name: &str, folder: &str, extra: &str) -> String {
        format!("\n[{}]\nfolder = {}\n{}", name, folder, extra)
    }

    /// A paused zergling running from a local folder.
    pub fn local(name: &str, folder: &Path) -> String {
        section(name, &folder.display().to_string(), "")
    }
}

/// A temporary workspace with a root directory for checkouts and an
/// optional `zerglings.conf`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("root")
            .create_dir_all()
            .expect("Failed to create root directory");
        Self { temp_dir }
    }

    /// Write `zerglings.conf` as the settings section plus `sections`.
    pub fn with_config(self, sections: &str) -> Self {
        self.with_file(
            "zerglings.conf",
            &format!("{}{}", configs::SETTINGS, sections),
        )
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Create an empty directory and return its path.
    pub fn folder(&self, path: &str) -> PathBuf {
        let child = self.temp_dir.child(path);
        child.create_dir_all().expect("Failed to create folder");
        child.path().to_path_buf()
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn rootdir(&self) -> PathBuf {
        self.temp_dir.path().join("root")
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("zerglings.conf")
    }

    /// The binary running `subcommand` against this fixture's config and
    /// root directory.
    pub fn overlord(&self, subcommand: &str) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("overlord");
        cmd.current_dir(self.path())
            .env_remove("OVERLORD_CONFIG")
            .env_remove("OVERLORD_ROOTDIR")
            .env_remove("RUST_LOG")
            .arg(subcommand)
            .arg("--config")
            .arg(self.config_path())
            .arg("--rootdir")
            .arg(self.rootdir());
        cmd
    }
}

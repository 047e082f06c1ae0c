//! Starting provisioned zerglings.
//!
//! The overlord treats the start procedure as opaque and only talks to it
//! through [`Launcher`]. [`CommandLauncher`] runs an entry's `command` in
//! the project folder once and waits for it; there is no supervision.

use std::process::{Command, Stdio};

use log::info;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::zergling::Zergling;

/// What a start did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchStatus {
    Started,
    /// Provisioned but left paused as configured
    Paused,
}

pub trait Launcher: Send + Sync {
    fn start(&self, zergling: &Zergling) -> Result<LaunchStatus>;
}

#[derive(Debug, Default)]
pub struct CommandLauncher;

impl Launcher for CommandLauncher {
    fn start(&self, zergling: &Zergling) -> Result<LaunchStatus> {
        let entry = zergling.entry();
        let folder = &zergling.project().folder;
        if entry.pause {
            info!("zergling {} is ready in {} (paused)", entry.name, folder.display());
            return Ok(LaunchStatus::Paused);
        }
        let Some(command) = &entry.command else {
            info!("zergling {} has no start command", entry.name);
            return Ok(LaunchStatus::Started);
        };

        info!("starting zergling {}: {}", entry.name, command);
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(folder)
            .stdin(Stdio::null())
            .env("OVERLORD_ZERGLING", &entry.name)
            .status()
            .map_err(|e| Error::Launch {
                zergling: entry.name.clone(),
                message: e.to_string(),
            })?;
        if !status.success() {
            return Err(Error::Launch {
                zergling: entry.name.clone(),
                message: format!("'{}' exited with {}", command, status),
            });
        }
        Ok(LaunchStatus::Started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Entry;
    use crate::overlord::Overlord;
    use crate::project::{FolderRegistry, Project};
    use crate::vcs::command::SystemRunner;
    use crate::vcs::Backends;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn zergling(folder: &std::path::Path, pause: bool, command: Option<&str>) -> Zergling {
        let overlord = Arc::new(Overlord::with_parts(
            "test",
            folder,
            Backends::system(SystemRunner::default()),
            Box::new(CommandLauncher),
            Box::new(FolderRegistry::new(None)),
        ));
        let mut entry = Entry::new("web", folder.to_string_lossy());
        entry.pause = pause;
        entry.command = command.map(str::to_string);
        Zergling::new(overlord, Project::new("web", folder), entry)
    }

    #[test]
    fn test_paused_entry_runs_nothing() {
        let temp = TempDir::new().unwrap();
        let z = zergling(temp.path(), true, Some("touch ran"));
        assert_eq!(CommandLauncher.start(&z).unwrap(), LaunchStatus::Paused);
        assert!(!temp.path().join("ran").exists());
    }

    #[test]
    fn test_entry_without_command_counts_as_started() {
        let temp = TempDir::new().unwrap();
        let z = zergling(temp.path(), false, None);
        assert_eq!(CommandLauncher.start(&z).unwrap(), LaunchStatus::Started);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_runs_in_project_folder() {
        let temp = TempDir::new().unwrap();
        let z = zergling(temp.path(), false, Some("echo $OVERLORD_ZERGLING > ran"));
        assert_eq!(CommandLauncher.start(&z).unwrap(), LaunchStatus::Started);
        let content = std::fs::read_to_string(temp.path().join("ran")).unwrap();
        assert_eq!(content.trim(), "web");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_a_launch_error() {
        let temp = TempDir::new().unwrap();
        let z = zergling(temp.path(), false, Some("exit 3"));
        let err = CommandLauncher.start(&z).unwrap_err();
        assert!(matches!(err, Error::Launch { ref zergling, .. } if zergling == "web"));
    }
}

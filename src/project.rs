//! # Project Registry
//!
//! A project is a named folder the overlord can provision and start. The
//! [`ProjectRegistry`] trait is the seam between the allocator and whatever
//! keeps track of projects; [`FolderRegistry`] is the implementation used by
//! the binary. It treats every subdirectory of the root directory as a known
//! project, so checkouts made by earlier runs are found again and reused.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use serde::Serialize;

use crate::error::{Error, Result};

/// A named project folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub name: String,
    pub folder: PathBuf,
}

impl Project {
    pub fn new(name: impl Into<String>, folder: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
        }
    }
}

/// Keeps track of known projects.
pub trait ProjectRegistry: Send {
    /// Look up a project by name, failing with [`Error::ProjectNotFound`].
    fn get(&self, name: &str) -> Result<Project>;

    /// Register a pre-existing local folder.
    fn create(&mut self, name: &str, folder: &Path) -> Result<Project>;

    /// Register a freshly checked out folder.
    fn register(&mut self, name: &str, folder: &Path) -> Result<Project>;

    /// All known projects.
    fn projects(&self) -> Vec<Project>;

    /// Provision a project at its current revision. Must be idempotent.
    fn install(&self, project: &Project) -> Result<()>;

    /// The project living in `folder`, if any. `folder` must be canonical;
    /// registered folders are compared both as stored and canonicalized.
    fn find_by_folder(&self, folder: &Path) -> Option<Project> {
        self.projects().into_iter().find(|p| {
            p.folder == folder || fs::canonicalize(&p.folder).is_ok_and(|f| f == folder)
        })
    }
}

/// Registry backed by the subdirectories of a root directory.
#[derive(Debug, Default)]
pub struct FolderRegistry {
    projects: BTreeMap<String, Project>,
    install_command: Option<String>,
}

impl FolderRegistry {
    pub fn new(install_command: Option<String>) -> Self {
        Self {
            projects: BTreeMap::new(),
            install_command,
        }
    }

    /// Seed the registry with every non-hidden subdirectory of `rootdir`.
    pub fn discover(rootdir: &Path, install_command: Option<String>) -> Result<Self> {
        let mut registry = Self::new(install_command);
        for entry in fs::read_dir(rootdir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if !path.is_dir() || name.starts_with('.') {
                continue;
            }
            debug!("discovered project {} at {}", name, path.display());
            registry.projects.insert(name.clone(), Project::new(name, path));
        }
        Ok(registry)
    }

    fn insert(&mut self, name: &str, folder: &Path) -> Result<Project> {
        if let Some(existing) = self.projects.get(name) {
            return Err(Error::ProjectExists {
                name: name.to_string(),
                folder: existing.folder.clone(),
            });
        }
        if !folder.is_dir() {
            return Err(Error::Filesystem {
                message: format!("project folder {} does not exist", folder.display()),
            });
        }
        let project = Project::new(name, folder);
        self.projects.insert(name.to_string(), project.clone());
        Ok(project)
    }
}

impl ProjectRegistry for FolderRegistry {
    fn get(&self, name: &str) -> Result<Project> {
        self.projects
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ProjectNotFound {
                name: name.to_string(),
            })
    }

    fn create(&mut self, name: &str, folder: &Path) -> Result<Project> {
        info!("registering local project {} at {}", name, folder.display());
        self.insert(name, folder)
    }

    fn register(&mut self, name: &str, folder: &Path) -> Result<Project> {
        info!("registering checkout {} at {}", name, folder.display());
        self.insert(name, folder)
    }

    fn projects(&self) -> Vec<Project> {
        self.projects.values().cloned().collect()
    }

    fn install(&self, project: &Project) -> Result<()> {
        let Some(command) = &self.install_command else {
            debug!("no install command configured for {}", project.name);
            return Ok(());
        };
        info!("installing {}: {}", project.name, command);
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&project.folder)
            .status()
            .map_err(|e| Error::Install {
                project: project.name.clone(),
                message: e.to_string(),
            })?;
        if !status.success() {
            return Err(Error::Install {
                project: project.name.clone(),
                message: format!("'{}' exited with {}", command, status),
            });
        }
        Ok(())
    }
}

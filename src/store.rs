//! Shared provisioning state.
//!
//! The [`Store`] owns the project registry together with two folder sets:
//! folders handed out by allocation during the current run, and folders of
//! zerglings that have been started. The overlord keeps it behind a mutex
//! and allocation holds that lock for its whole scan, pick and claim
//! sequence, so two allocations can never pick the same candidate.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::project::{Project, ProjectRegistry};

pub struct Store {
    registry: Box<dyn ProjectRegistry>,
    allocated: BTreeSet<PathBuf>,
    started: BTreeSet<PathBuf>,
}

impl Store {
    pub fn new(registry: Box<dyn ProjectRegistry>) -> Self {
        Self {
            registry,
            allocated: BTreeSet::new(),
            started: BTreeSet::new(),
        }
    }

    pub fn registry(&self) -> &dyn ProjectRegistry {
        self.registry.as_ref()
    }

    pub fn registry_mut(&mut self) -> &mut dyn ProjectRegistry {
        self.registry.as_mut()
    }

    /// Known projects ordered by folder path.
    pub fn projects(&self) -> Vec<Project> {
        let mut projects = self.registry.projects();
        projects.sort_by(|a, b| a.folder.cmp(&b.folder));
        projects
    }

    pub fn mark_allocated(&mut self, folder: &Path) {
        self.allocated.insert(folder.to_path_buf());
    }

    pub fn is_allocated(&self, folder: &Path) -> bool {
        self.allocated.contains(folder)
    }

    /// Claim `folder` for a started zergling. Returns false if another
    /// zergling already runs from it.
    pub fn mark_started(&mut self, folder: &Path) -> bool {
        self.started.insert(folder.to_path_buf())
    }

    pub fn is_started(&self, folder: &Path) -> bool {
        self.started.contains(folder)
    }

    /// Forget per-run allocations. Started zerglings stay claimed.
    pub fn begin_run(&mut self) {
        self.allocated.clear();
    }
}

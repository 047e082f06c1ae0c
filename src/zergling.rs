use std::fmt;
use std::sync::Arc;

use crate::config::Entry;
use crate::error::Result;
use crate::launcher::LaunchStatus;
use crate::overlord::Overlord;
use crate::project::Project;

/// A provisioned project together with the entry that asked for it.
#[derive(Clone)]
pub struct Zergling {
    overlord: Arc<Overlord>,
    project: Project,
    entry: Entry,
}

impl Zergling {
    pub fn new(overlord: Arc<Overlord>, project: Project, entry: Entry) -> Self {
        Self {
            overlord,
            project,
            entry,
        }
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Claim the project folder, then hand over to the launcher.
    pub fn start(&self) -> Result<LaunchStatus> {
        self.overlord.claim(&self.project)?;
        self.overlord.launcher().start(self)
    }
}

impl fmt::Debug for Zergling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zergling")
            .field("name", &self.entry.name)
            .field("project", &self.project)
            .finish()
    }
}

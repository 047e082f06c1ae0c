use std::sync::{Arc, OnceLock};

use log::info;

use super::Action;
use crate::config::Entry;
use crate::error::{Error, Result};
use crate::launcher::LaunchStatus;
use crate::overlord::Overlord;
use crate::zergling::Zergling;

/// Allocates the project for one configuration entry.
pub struct CreateZergling {
    overlord: Arc<Overlord>,
    entry: Entry,
    result: OnceLock<Zergling>,
    failure: OnceLock<String>,
}

impl CreateZergling {
    pub fn new(overlord: Arc<Overlord>, entry: Entry) -> Self {
        Self {
            overlord,
            entry,
            result: OnceLock::new(),
            failure: OnceLock::new(),
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// The created zergling, available once `start` has succeeded.
    pub fn result(&self) -> Option<&Zergling> {
        self.result.get()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.get().map(String::as_str)
    }
}

impl Action for CreateZergling {
    fn start(&self) -> Result<()> {
        match self.overlord.allocate(&self.entry) {
            Ok(project) => {
                info!(
                    "zergling {} will run from {}",
                    self.entry.name,
                    project.folder.display()
                );
                let zergling = Zergling::new(self.overlord.clone(), project, self.entry.clone());
                let _ = self.result.set(zergling);
                Ok(())
            }
            Err(e) => {
                let _ = self.failure.set(e.to_string());
                Err(e)
            }
        }
    }

    fn label(&self) -> String {
        format!("CreateZergling:\n{}", self.entry.folder)
    }
}

/// Where a [`StartZergling`] gets its zergling from.
pub enum ZerglingSource {
    Resolved(Zergling),
    /// Resolved at start time; the creation must have completed by then.
    Pending(Arc<CreateZergling>),
}

/// Starts one zergling.
pub struct StartZergling {
    source: ZerglingSource,
    outcome: OnceLock<std::result::Result<LaunchStatus, String>>,
}

impl StartZergling {
    pub fn new(source: ZerglingSource) -> Self {
        Self {
            source,
            outcome: OnceLock::new(),
        }
    }

    pub fn after(creation: Arc<CreateZergling>) -> Self {
        Self::new(ZerglingSource::Pending(creation))
    }

    /// `None` until `start` has run.
    pub fn outcome(&self) -> Option<&std::result::Result<LaunchStatus, String>> {
        self.outcome.get()
    }

    fn zergling(&self) -> Result<&Zergling> {
        match &self.source {
            ZerglingSource::Resolved(zergling) => Ok(zergling),
            ZerglingSource::Pending(creation) => {
                creation.result().ok_or_else(|| Error::NotCreated {
                    entry: creation.entry().name.clone(),
                })
            }
        }
    }
}

impl Action for StartZergling {
    fn start(&self) -> Result<()> {
        let result = self.zergling().and_then(Zergling::start);
        let _ = self
            .outcome
            .set(result.as_ref().map(|s| *s).map_err(|e| e.to_string()));
        result.map(|_| ())
    }

    fn label(&self) -> String {
        match &self.source {
            ZerglingSource::Resolved(zergling) => format!("Start zergling {}", zergling.name()),
            ZerglingSource::Pending(creation) => {
                format!("Start zergling from\n{}", creation.entry().folder)
            }
        }
    }
}

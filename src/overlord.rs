//! # Overlord
//!
//! The overlord owns everything a run needs: its root directory, the VCS
//! backends, the launcher and the shared [`Store`]. A run reads the zergling
//! entries, turns them into an action graph and executes it:
//!
//! ```text
//! CreateZergling(web) -> CreateZergling(api) -> ( StartZergling(web) | StartZergling(api) )
//! ```
//!
//! All creations run first, one after another in configuration order, so
//! allocation decisions are deterministic. The starts then run together.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;

use crate::action::{Action, ActionSequence, CreateZergling, ParallelActions, StartZergling};
use crate::allocate::{parse_folderspec, Allocator};
use crate::config::{self, Entry, FileSettings};
use crate::error::{Error, Result};
use crate::launcher::{CommandLauncher, LaunchStatus, Launcher};
use crate::project::{FolderRegistry, Project, ProjectRegistry};
use crate::report::{EntryOutcome, EntryStatus, RunReport};
use crate::store::Store;
use crate::vcs::command::SystemRunner;
use crate::vcs::{Backends, Repository, VcsKind};

/// How to set up an [`Overlord`]. Unset values are filled from the
/// configuration file's settings, then from defaults.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub name: Option<String>,
    /// Zergling configuration file
    pub file: Option<PathBuf>,
    pub rootdir: Option<PathBuf>,
    pub install: Option<String>,
    pub command_timeout: Option<u64>,
}

impl Settings {
    /// Fill values that are still unset from a configuration file.
    pub fn with_file_settings(mut self, file: &FileSettings) -> Self {
        self.name = self.name.or_else(|| file.name.clone());
        self.rootdir = self.rootdir.or_else(|| file.rootdir.clone());
        self.install = self.install.or_else(|| file.install.clone());
        self.command_timeout = self.command_timeout.or(file.command_timeout);
        self
    }

    /// Read the configuration file, if any, and merge its settings.
    /// Returns the completed settings and the configured entries.
    pub fn resolve(self) -> Result<(Settings, Vec<Entry>)> {
        let Some(path) = self.file.clone() else {
            return Ok((self, Vec::new()));
        };
        check_file(&path)?;
        let parsed = config::from_file(&path)?;
        Ok((self.with_file_settings(&parsed.settings), parsed.entries))
    }
}

fn check_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::Init {
            message: format!("Config file does not exist: {}", path.display()),
        });
    }
    Ok(())
}

/// Default root directory for checkouts.
pub fn default_rootdir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("overlord"))
}

/// What `ls` shows about one project. Values that could not be read are
/// left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub folder: PathBuf,
    pub vcs: Option<VcsKind>,
    pub url: Option<String>,
    pub revision: Option<String>,
}

pub struct Overlord {
    name: String,
    file: Option<PathBuf>,
    rootdir: PathBuf,
    backends: Backends,
    launcher: Box<dyn Launcher>,
    store: Mutex<Store>,
}

impl Overlord {
    /// Validate settings and set up the overlord with the system `git`,
    /// `hg` and the command launcher.
    pub fn init(settings: Settings) -> Result<Arc<Self>> {
        let name = settings
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::Init {
                message: "No unique name specified".to_string(),
            })?;
        if let Some(file) = &settings.file {
            check_file(file)?;
        }
        let rootdir = match settings.rootdir {
            Some(rootdir) => rootdir,
            None => default_rootdir().ok_or_else(|| Error::Init {
                message: "Could not determine a default rootdir, please configure one"
                    .to_string(),
            })?,
        };
        if !rootdir.exists() {
            info!("creating rootdir {}", rootdir.display());
            fs::create_dir_all(&rootdir)?;
        } else if !rootdir.is_dir() {
            return Err(Error::Init {
                message: format!("Configured rootdir is not a folder: {}", rootdir.display()),
            });
        }

        let registry = FolderRegistry::discover(&rootdir, settings.install)?;
        let runner = SystemRunner::new(settings.command_timeout.map(Duration::from_secs));
        let mut overlord = Self::with_parts(
            name,
            rootdir,
            Backends::system(runner),
            Box::new(CommandLauncher),
            Box::new(registry),
        );
        overlord.file = settings.file;
        Ok(Arc::new(overlord))
    }

    /// Assemble an overlord from explicit collaborators.
    pub fn with_parts(
        name: impl Into<String>,
        rootdir: impl Into<PathBuf>,
        backends: Backends,
        launcher: Box<dyn Launcher>,
        registry: Box<dyn ProjectRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            file: None,
            rootdir: rootdir.into(),
            backends,
            launcher,
            store: Mutex::new(Store::new(registry)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rootdir(&self) -> &Path {
        &self.rootdir
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn launcher(&self) -> &dyn Launcher {
        self.launcher.as_ref()
    }

    fn store(&self) -> Result<MutexGuard<'_, Store>> {
        self.store.lock().map_err(|_| Error::LockPoisoned {
            context: "overlord store".to_string(),
        })
    }

    /// Entries of `file`, or of the configured file when `None`.
    pub fn read_entries(&self, file: Option<&Path>) -> Result<Vec<Entry>> {
        let file = file.or(self.file()).ok_or_else(|| Error::Init {
            message: "No zergling configuration provided".to_string(),
        })?;
        check_file(file)?;
        Ok(config::from_file(file)?.entries)
    }

    /// Build the action graph for `entries`. Every folderspec is checked
    /// first so a bad entry fails before anything is cloned.
    pub fn plan(self: &Arc<Self>, entries: Vec<Entry>) -> Result<Plan> {
        for entry in &entries {
            parse_folderspec(&entry.name, &entry.folder)?;
        }

        let mut actions: Vec<Box<dyn Action>> = Vec::with_capacity(entries.len() + 1);
        let mut starts: Vec<Box<dyn Action>> = Vec::with_capacity(entries.len());
        let mut steps = Vec::with_capacity(entries.len());
        for entry in entries {
            let creation = Arc::new(CreateZergling::new(self.clone(), entry));
            let startup = Arc::new(StartZergling::after(creation.clone()));
            actions.push(Box::new(creation.clone()));
            starts.push(Box::new(startup.clone()));
            steps.push((creation, startup));
        }
        actions.push(Box::new(ParallelActions::new(starts)));

        Ok(Plan {
            overlord: self.clone(),
            root: ActionSequence::new(actions),
            steps,
        })
    }

    /// Provision and start every zergling of `file` (or the configured file).
    pub fn start(self: &Arc<Self>, file: Option<&Path>) -> Result<RunReport> {
        let entries = self.read_entries(file)?;
        Ok(self.plan(entries)?.run())
    }

    /// Find or make the project for `entry`. Holds the store lock for the
    /// whole decision.
    pub fn allocate(&self, entry: &Entry) -> Result<Project> {
        let mut store = self.store()?;
        Allocator::new(&mut store, &self.backends, &self.rootdir).allocate(entry)
    }

    /// Mark a project folder as used by a started zergling, so later
    /// allocations leave it alone.
    pub fn claim(&self, project: &Project) -> Result<()> {
        if !self.store()?.mark_started(&project.folder) {
            debug!(
                "{} is shared with another started zergling",
                project.folder.display()
            );
        }
        Ok(())
    }

    fn begin_run(&self) -> Result<()> {
        self.store()?.begin_run();
        Ok(())
    }

    /// Every known project with whatever VCS details can be read.
    pub fn inventory(&self) -> Result<Vec<ProjectInfo>> {
        let projects = self.store()?.projects();
        Ok(projects
            .into_iter()
            .map(|project| {
                let repo = self
                    .backends
                    .detect(&project.folder)
                    .map(|vcs| Repository::new(vcs, project.folder.clone()));
                ProjectInfo {
                    vcs: repo.as_ref().map(Repository::kind),
                    url: repo
                        .as_ref()
                        .and_then(|r| r.url().ok().map(str::to_string)),
                    revision: repo.as_ref().and_then(|r| r.revision().ok()),
                    name: project.name,
                    folder: project.folder,
                }
            })
            .collect())
    }
}

/// A ready-to-run action graph.
pub struct Plan {
    overlord: Arc<Overlord>,
    root: ActionSequence,
    steps: Vec<(Arc<CreateZergling>, Arc<StartZergling>)>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn ascii_graph(&self) -> String {
        self.root.ascii_graph()
    }

    pub fn run(&self) -> RunReport {
        let name = self.overlord.name();
        if let Err(e) = self.overlord.begin_run() {
            warn!("{}", e);
        }
        info!("overlord {} starting {} zerglings", name, self.len());
        if let Err(e) = self.root.start() {
            warn!("run of overlord {} had failures: {}", name, e);
        }

        let entries = self
            .steps
            .iter()
            .map(|(creation, startup)| {
                let status = match (startup.outcome(), creation.failure()) {
                    (Some(Ok(LaunchStatus::Started)), _) => EntryStatus::Started,
                    (Some(Ok(LaunchStatus::Paused)), _) => EntryStatus::Paused,
                    (Some(Err(message)), _) => EntryStatus::Failed(message.clone()),
                    (None, Some(message)) => EntryStatus::Failed(message.to_string()),
                    (None, None) => EntryStatus::Skipped,
                };
                EntryOutcome {
                    name: creation.entry().name.clone(),
                    folderspec: creation.entry().folder.clone(),
                    folder: creation.result().map(|z| z.project().folder.clone()),
                    status,
                }
            })
            .collect();
        RunReport {
            overlord: name.to_string(),
            entries,
        }
    }
}

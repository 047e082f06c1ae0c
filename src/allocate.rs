//! # Zergling Allocation
//!
//! Turns an entry's folderspec into a project folder. A folderspec is either
//! an existing local directory, used as is, or a version-control URL with an
//! optional `#revision` pin:
//!
//! - `hg+https://hg.example.com/repo#1.2`
//! - `git+ssh://git@example.com/repo.git#v2.0.0`
//! - `git://example.com/repo.git`
//!
//! For a URL the allocator prefers an existing checkout of the same remote:
//! one already at the target revision is reused untouched, otherwise one
//! that is not in use is cleared, updated and reinstalled. Only when no
//! checkout of that remote is available is a fresh one made under the root
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::Entry;
use crate::error::{Error, Result};
use crate::names;
use crate::project::Project;
use crate::store::Store;
use crate::vcs::{match_scheme, normalize_url, Backends, Repository, Vcs, VcsKind};

/// Where a zergling's code comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Remote {
        kind: VcsKind,
        url: String,
        revision: Option<String>,
    },
}

/// Classify a folderspec. Never starts a subprocess.
pub fn parse_folderspec(entry: &str, spec: &str) -> Result<Source> {
    if Path::new(spec).is_dir() {
        return Ok(Source::Local(PathBuf::from(spec)));
    }
    let (location, revision) = match spec.split_once('#') {
        Some((location, revision)) => (location, Some(revision)),
        None => (spec, None),
    };
    let (kind, url) = match_scheme(location).ok_or_else(|| Error::UnsupportedFolderspec {
        entry: entry.to_string(),
        spec: spec.to_string(),
    })?;
    Ok(Source::Remote {
        kind,
        url: normalize_url(url).to_string(),
        revision: revision.filter(|r| !r.is_empty()).map(str::to_string),
    })
}

/// Whether a working copy at `current` satisfies `target`. A short hash
/// target matches any revision it is a prefix of.
fn revision_matches(current: &str, target: &str) -> bool {
    current == target || (target.len() >= 4 && current.starts_with(target))
}

/// Allocates projects against a locked [`Store`].
pub struct Allocator<'a> {
    store: &'a mut Store,
    backends: &'a Backends,
    rootdir: &'a Path,
}

impl<'a> Allocator<'a> {
    pub fn new(store: &'a mut Store, backends: &'a Backends, rootdir: &'a Path) -> Self {
        Self {
            store,
            backends,
            rootdir,
        }
    }

    pub fn allocate(&mut self, entry: &Entry) -> Result<Project> {
        let project = match parse_folderspec(&entry.name, &entry.folder)? {
            Source::Local(folder) => self.allocate_local(&folder)?,
            Source::Remote {
                kind,
                url,
                revision,
            } => {
                let backends = self.backends;
                self.allocate_remote(backends.get(kind), &url, revision.as_deref())?
            }
        };
        self.store.mark_allocated(&project.folder);
        Ok(project)
    }

    fn allocate_local(&mut self, folder: &Path) -> Result<Project> {
        let folder = fs::canonicalize(folder)?;
        if let Some(project) = self.store.registry().find_by_folder(&folder) {
            debug!("local folder {} is project {}", folder.display(), project.name);
            return Ok(project);
        }

        let base = folder
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        let mut name = base.clone();
        let mut suffix = 2;
        while self.store.registry().get(&name).is_ok() {
            name = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        self.store.registry_mut().create(&name, &folder)
    }

    fn allocate_remote(
        &mut self,
        vcs: &dyn Vcs,
        url: &str,
        revision: Option<&str>,
    ) -> Result<Project> {
        let mut candidates = Vec::new();
        for project in self.store.projects() {
            if self.store.is_started(&project.folder) || !vcs.is_repository(&project.folder) {
                continue;
            }
            let repo = Repository::new(vcs, project.folder.clone());
            let current = match repo.url() {
                Ok(found) if found == url => repo.revision(),
                Ok(_) => continue,
                Err(e) => Err(e),
            };
            match current {
                Ok(current) => candidates.push((project, repo, current)),
                Err(e) => warn!("skipping {}: {}", project.folder.display(), e),
            }
        }

        if !candidates.is_empty() {
            let target = match revision {
                Some(revision) => vcs.canonical_revision(url, revision)?,
                None => vcs.latest_revision(url)?,
            };
            for (project, _, current) in &candidates {
                if revision_matches(current, &target) {
                    info!(
                        "reusing {} at {} for {}",
                        project.folder.display(),
                        target,
                        url
                    );
                    return Ok(project.clone());
                }
            }

            let mutable = candidates
                .into_iter()
                .find(|(project, _, _)| !self.store.is_allocated(&project.folder));
            if let Some((project, repo, _)) = mutable {
                info!(
                    "updating {} to {} for {}",
                    project.folder.display(),
                    target,
                    url
                );
                repo.clear()?;
                repo.update(Some(&target))?;
                self.store.registry().install(&project)?;
                return Ok(project);
            }
            debug!("every checkout of {} is taken by this run", url);
        }

        let (name, folder) = names::unused_folder(self.rootdir, &mut rand::thread_rng());
        info!(
            "checking out {}{} into {}",
            url,
            revision.map(|r| format!("#{}", r)).unwrap_or_default(),
            folder.display()
        );
        vcs.checkout(url, &folder, revision)?;
        self.store.registry_mut().register(&name, &folder)
    }
}

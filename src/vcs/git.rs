//! Git backend
//!
//! Uses the system `git` command, which picks up SSH keys, credential
//! helpers and anything else configured in `~/.gitconfig`.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use log::{info, warn};
use regex::Regex;

use super::command::{CommandRunner, Invocation};
use super::{Vcs, VcsKind};
use crate::error::{Error, Result};

static FULL_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").expect("valid regex"));
static HEX_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{4,39}$").expect("valid regex"));

const DEFAULT_BRANCH: &str = "master";

pub struct Git {
    runner: Arc<dyn CommandRunner>,
}

impl Git {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn git() -> Invocation {
        Invocation::new("git")
    }

    /// `(hash, ref)` pairs printed by `git ls-remote <flags> <url> <pattern>`.
    fn ls_remote(
        &self,
        url: &str,
        flags: &[&str],
        pattern: &str,
    ) -> Result<Vec<(String, String)>> {
        let output = self.runner.output(
            &Self::git()
                .arg("ls-remote")
                .args(flags.iter().copied())
                .args([url, pattern])
                .remote(url),
        )?;
        // Git ls-remote output format: <hash>\t<ref>
        Ok(output
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(hash, name)| (hash.trim(), name.trim()))
            .filter(|(hash, _)| FULL_HASH.is_match(hash))
            .map(|(hash, name)| (hash.to_string(), name.to_string()))
            .collect())
    }

    /// Hash of the first name in `wanted` that `refs` lists exactly.
    fn pick(refs: &[(String, String)], wanted: &[String]) -> Option<String> {
        wanted.iter().find_map(|want| {
            refs.iter()
                .find(|(_, name)| name == want)
                .map(|(hash, _)| hash.clone())
        })
    }

    fn checkout_detached(&self, folder: &Path, revision: &str) -> Result<()> {
        self.runner.output(
            &Self::git()
                .args(["checkout", "--force", "--detach", revision])
                .current_dir(folder),
        )?;
        Ok(())
    }
}

impl Vcs for Git {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    fn is_repository(&self, folder: &Path) -> bool {
        folder.join(".git").is_dir()
    }

    fn checkout(&self, url: &str, folder: &Path, revision: Option<&str>) -> Result<()> {
        // a fresh clone only has the default branch locally, so branch and
        // tag names are turned into a commit before anything is cloned
        let target = revision
            .map(|revision| self.canonical_revision(url, revision))
            .transpose()?;
        if let Some(parent) = folder.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("cloning {} into {}", url, folder.display());
        self.runner.interactive(
            &Self::git()
                .arg("clone")
                .arg(url)
                .arg(folder.display().to_string())
                .remote(url),
        )?;
        if let Some(target) = target {
            self.runner.interactive(
                &Self::git()
                    .args(["reset", "--hard", target.as_str()])
                    .current_dir(folder),
            )?;
        }
        Ok(())
    }

    fn canonical_revision(&self, url: &str, revision: &str) -> Result<String> {
        if FULL_HASH.is_match(revision) {
            return Ok(revision.to_string());
        }
        let refs = self.ls_remote(url, &["--heads", "--tags"], revision)?;
        // Annotated tags also list the peeled commit as <ref>^{}, which is
        // what a checkout lands on. The pattern matches any ref ending in
        // `revision`, so only exact names count.
        let wanted = [
            format!("refs/tags/{}^{{}}", revision),
            format!("refs/tags/{}", revision),
            format!("refs/heads/{}", revision),
            format!("{}^{{}}", revision),
            revision.to_string(),
        ];
        if let Some(hash) = Self::pick(&refs, &wanted) {
            return Ok(hash);
        }
        // ls-remote only knows refs; an abbreviated commit id can only be
        // compared after a fetch, so it is passed through as is.
        if HEX_PREFIX.is_match(revision) {
            return Ok(revision.to_lowercase());
        }
        Err(Error::UnknownRevision {
            url: url.to_string(),
            revision: revision.to_string(),
        })
    }

    fn latest_revision(&self, url: &str) -> Result<String> {
        let branch = format!("refs/heads/{}", DEFAULT_BRANCH);
        let refs = self.ls_remote(url, &[], &branch)?;
        if let Some(hash) = Self::pick(&refs, &[branch]) {
            return Ok(hash);
        }
        let refs = self.ls_remote(url, &[], "HEAD")?;
        Self::pick(&refs, &["HEAD".to_string()]).ok_or_else(|| Error::UnknownRevision {
            url: url.to_string(),
            revision: "HEAD".to_string(),
        })
    }

    fn read_url(&self, folder: &Path) -> Result<String> {
        let output = self.runner.output(
            &Self::git()
                .args(["config", "--get", "remote.origin.url"])
                .current_dir(folder),
        )?;
        Ok(output.trim().to_string())
    }

    fn read_revision(&self, folder: &Path) -> Result<String> {
        let output = self
            .runner
            .output(&Self::git().args(["rev-parse", "HEAD"]).current_dir(folder))?;
        Ok(output.trim().to_string())
    }

    fn clear(&self, folder: &Path) -> Result<()> {
        self.runner.output(
            &Self::git()
                .args(["reset", "--hard", "HEAD"])
                .current_dir(folder),
        )?;
        self.runner
            .output(&Self::git().args(["clean", "-fd"]).current_dir(folder))?;
        Ok(())
    }

    fn update(&self, folder: &Path, revision: Option<&str>) -> Result<()> {
        let Some(revision) = revision else {
            self.runner.output(
                &Self::git()
                    .args(["fetch", "origin", DEFAULT_BRANCH])
                    .current_dir(folder),
            )?;
            return self.checkout_detached(folder, "FETCH_HEAD");
        };
        if let Err(e) = self.checkout_detached(folder, revision) {
            // the revision may not have been fetched yet
            warn!(
                "checkout of {} in {} failed ({}), fetching and retrying once",
                revision,
                folder.display(),
                e
            );
            self.runner.output(
                &Self::git()
                    .args(["fetch", "origin", "--tags"])
                    .current_dir(folder),
            )?;
            self.checkout_detached(folder, revision)?;
        }
        Ok(())
    }
}

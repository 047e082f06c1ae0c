//! Mercurial backend

use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use log::{info, warn};
use regex::Regex;

use super::command::{CommandRunner, Invocation};
use super::{Vcs, VcsKind};
use crate::error::{Error, Result};

static NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-f]{40})").expect("valid regex"));

pub struct Mercurial {
    runner: Arc<dyn CommandRunner>,
}

impl Mercurial {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn hg() -> Invocation {
        Invocation::new("hg")
    }

    /// `hg --debug identify` prints the full node id on its last line.
    fn identify(&self, url: &str, revision: Option<&str>) -> Result<String> {
        let mut invocation = Self::hg().args(["--debug", "identify"]);
        if let Some(revision) = revision {
            invocation = invocation.args(["--rev", revision]);
        }
        let output = self.runner.output(&invocation.arg(url).remote(url))?;
        last_line(&output)
            .and_then(|line| node(&line))
            .ok_or_else(|| Error::UnknownRevision {
                url: url.to_string(),
                revision: revision.unwrap_or("default").to_string(),
            })
    }

    fn update_clean(&self, folder: &Path, revision: Option<&str>) -> Result<()> {
        let mut invocation = Self::hg().args(["update", "--clean"]);
        if let Some(revision) = revision {
            invocation = invocation.arg(revision);
        }
        self.runner.output(&invocation.current_dir(folder))?;
        Ok(())
    }
}

fn last_line(output: &str) -> Option<String> {
    output
        .trim()
        .lines()
        .last()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

/// The 40-hex node id at the start of an identify line, without the `+`
/// dirty marker or tag names that may follow it.
fn node(line: &str) -> Option<String> {
    NODE.captures(line).map(|c| c[1].to_string())
}

impl Vcs for Mercurial {
    fn kind(&self) -> VcsKind {
        VcsKind::Mercurial
    }

    fn is_repository(&self, folder: &Path) -> bool {
        folder.join(".hg").is_dir()
    }

    fn checkout(&self, url: &str, folder: &Path, revision: Option<&str>) -> Result<()> {
        if let Some(parent) = folder.parent() {
            fs::create_dir_all(parent)?;
        }
        info!("cloning {} into {}", url, folder.display());
        let mut invocation = Self::hg().arg("clone");
        if let Some(revision) = revision {
            invocation = invocation.args(["--rev", revision]);
        }
        self.runner.interactive(
            &invocation
                .arg(url)
                .arg(folder.display().to_string())
                .remote(url),
        )
    }

    fn canonical_revision(&self, url: &str, revision: &str) -> Result<String> {
        self.identify(url, Some(revision))
    }

    fn latest_revision(&self, url: &str) -> Result<String> {
        self.identify(url, None)
    }

    fn read_url(&self, folder: &Path) -> Result<String> {
        let output = self
            .runner
            .output(&Self::hg().args(["paths", "default"]).current_dir(folder))?;
        Ok(output.trim().to_string())
    }

    fn read_revision(&self, folder: &Path) -> Result<String> {
        let output = self
            .runner
            .output(&Self::hg().args(["--debug", "id"]).current_dir(folder))?;
        let line = last_line(&output).unwrap_or_default();
        Ok(node(&line).unwrap_or(line))
    }

    fn clear(&self, folder: &Path) -> Result<()> {
        let unknown = self.runner.output(
            &Self::hg()
                .args([
                    "status",
                    "--no-status",
                    "--unknown",
                    "--print0",
                    "--color",
                    "false",
                ])
                .current_dir(folder),
        )?;
        for relative in unknown.split('\0').filter(|p| !p.is_empty()) {
            let path = folder.join(relative);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        // `.` is the working copy's parent, so no revision change
        self.update_clean(folder, Some("."))
    }

    fn update(&self, folder: &Path, revision: Option<&str>) -> Result<()> {
        if let Err(e) = self.update_clean(folder, revision) {
            // the revision may not have been pulled yet
            warn!(
                "hg update in {} failed ({}), pulling and retrying once",
                folder.display(),
                e
            );
            self.runner
                .output(&Self::hg().arg("pull").current_dir(folder))?;
            self.update_clean(folder, revision)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::command::testing::ScriptedRunner;

    const NODE_ID: &str = "1f0dee641bb7258c56bd60e93edfa2405381c41e";

    fn hg(runner: ScriptedRunner) -> (Mercurial, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        (Mercurial::new(runner.clone()), runner)
    }

    #[test]
    fn test_update_missing_revision_pulls_exactly_once() {
        testing_logger::setup();
        let (hg, runner) = hg(ScriptedRunner::new().fail("abort: unknown revision 'abc'"));
        hg.update(Path::new("/w"), Some("abc")).unwrap();

        assert_eq!(
            runner.lines(),
            vec!["hg update --clean abc", "hg pull", "hg update --clean abc"]
        );
        testing_logger::validate(|captured| {
            let retries: Vec<_> = captured
                .iter()
                .filter(|log| log.level == log::Level::Warn)
                .collect();
            assert_eq!(retries.len(), 1);
            assert!(retries[0].body.contains("pulling and retrying once"));
        });
    }

    #[test]
    fn test_update_gives_up_after_one_retry() {
        let (hg, runner) = hg(
            ScriptedRunner::new()
                .fail("abort: unknown revision 'abc'")
                .respond("pulling from default")
                .fail("abort: unknown revision 'abc'")
                .fail("should never be reached"),
        );
        let err = hg.update(Path::new("/w"), Some("abc")).unwrap_err();
        assert!(err.to_string().contains("unknown revision"));
        assert_eq!(runner.lines().len(), 3);
    }

    #[test]
    fn test_update_without_revision_goes_to_tip() {
        let (hg, runner) = hg(ScriptedRunner::new());
        hg.update(Path::new("/w"), None).unwrap();
        assert_eq!(runner.lines(), vec!["hg update --clean"]);
    }

    #[test]
    fn test_checkout_passes_rev_to_clone() {
        let temp = tempfile::TempDir::new().unwrap();
        let folder = temp.path().join("kilo-lima");
        let (hg, runner) = hg(ScriptedRunner::new());
        hg.checkout("https://hg.example.com/r", &folder, Some("v2")).unwrap();
        assert_eq!(
            runner.lines(),
            vec![format!(
                "hg clone --rev v2 https://hg.example.com/r {}",
                folder.display()
            )]
        );
    }

    #[test]
    fn test_identify_uses_last_line() {
        let (hg, runner) = hg(ScriptedRunner::new().respond(&format!(
            "using https://hg.example.com/r\nsending capabilities command\n{}\n",
            NODE_ID
        )));
        assert_eq!(hg.canonical_revision("https://hg.example.com/r", "v2").unwrap(), NODE_ID);
        assert_eq!(
            runner.lines(),
            vec!["hg --debug identify --rev v2 https://hg.example.com/r"]
        );
    }

    #[test]
    fn test_identify_and_read_revision_agree_on_node_form() {
        let (hg, _) = hg(ScriptedRunner::new()
            .respond(&format!("{} tip\n", NODE_ID))
            .respond(&format!("{}+ tip\n", NODE_ID)));
        let latest = hg.latest_revision("https://hg.example.com/r").unwrap();
        let current = hg.read_revision(Path::new("/w")).unwrap();
        assert_eq!(latest, NODE_ID);
        assert_eq!(latest, current);
    }

    #[test]
    fn test_identify_without_node_is_unknown_revision() {
        let (hg, _) = hg(ScriptedRunner::new().respond("abort: unknown revision 'nope'\n"));
        let err = hg.canonical_revision("https://hg.example.com/r", "nope").unwrap_err();
        assert!(matches!(err, Error::UnknownRevision { .. }));
    }

    #[test]
    fn test_read_revision_strips_tags() {
        let (hg, _) = hg(ScriptedRunner::new().respond(&format!("{}+ tip\n", NODE_ID)));
        assert_eq!(hg.read_revision(Path::new("/w")).unwrap(), NODE_ID);
    }

    #[test]
    fn test_clear_removes_unknown_files_then_updates() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("stray.txt"), "x").unwrap();
        fs::create_dir_all(temp.path().join("build")).unwrap();
        fs::write(temp.path().join("build/out.o"), "y").unwrap();
        fs::write(temp.path().join("tracked.txt"), "z").unwrap();

        let (hg, runner) = hg(ScriptedRunner::new().respond("stray.txt\0build/out.o\0"));
        hg.clear(temp.path()).unwrap();

        assert!(!temp.path().join("stray.txt").exists());
        assert!(!temp.path().join("build/out.o").exists());
        assert!(temp.path().join("tracked.txt").exists());
        assert_eq!(runner.lines()[1], "hg update --clean .");
    }
}

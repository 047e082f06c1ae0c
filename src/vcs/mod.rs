//! # Version Control Backends
//!
//! This module normalizes the handful of version-control operations the
//! allocator needs (identify, compare, mutate) across Git and Mercurial.
//!
//! ## Design
//!
//! - **`VcsKind`**: the closed set of supported backends. The `SCHEMES` table
//!   maps folderspec prefixes to a kind, so adding a backend is one table row
//!   plus one [`Vcs`] implementation.
//! - **`Vcs`**: the capability set every backend implements in full. All
//!   methods take the folder or URL they act on explicitly, which keeps
//!   implementations stateless and easy to mock.
//! - **`Repository`**: a working copy bound to a backend. Its URL is read once
//!   and cached, its revision is re-read on every access because other
//!   processes may move it.
//! - **`Backends`**: owns one implementation per kind and hands out the right
//!   one for a folderspec.

pub mod command;
pub mod git;
pub mod hg;

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use command::{CommandRunner, SystemRunner};

/// Supported version control systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Mercurial,
    Git,
}

impl VcsKind {
    pub const ALL: [VcsKind; 2] = [VcsKind::Mercurial, VcsKind::Git];
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsKind::Mercurial => write!(f, "hg"),
            VcsKind::Git => write!(f, "git"),
        }
    }
}

/// A folderspec scheme prefix.
#[derive(Debug, Clone, Copy)]
pub struct Scheme {
    pub prefix: &'static str,
    pub kind: VcsKind,
    /// `git:` URLs keep their prefix, `hg+`/`git+` are stripped.
    pub strip_prefix: bool,
}

pub const SCHEMES: &[Scheme] = &[
    Scheme {
        prefix: "hg+",
        kind: VcsKind::Mercurial,
        strip_prefix: true,
    },
    Scheme {
        prefix: "git+",
        kind: VcsKind::Git,
        strip_prefix: true,
    },
    Scheme {
        prefix: "git:",
        kind: VcsKind::Git,
        strip_prefix: false,
    },
];

/// Match a folderspec (without its `#revision` part) against [`SCHEMES`],
/// returning the backend and the URL to hand to it.
pub fn match_scheme(spec: &str) -> Option<(VcsKind, &str)> {
    SCHEMES.iter().find_map(|scheme| {
        spec.strip_prefix(scheme.prefix).map(|rest| {
            let url = if scheme.strip_prefix { rest } else { spec };
            (scheme.kind, url)
        })
    })
}

/// Canonical form of a URL for comparisons: no trailing separators.
pub fn normalize_url(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// The operations a version-control backend provides.
pub trait Vcs: Send + Sync {
    fn kind(&self) -> VcsKind;

    /// Whether `folder` is a working copy of this backend. Never fails; a
    /// missing folder is simply not a repository.
    fn is_repository(&self, folder: &Path) -> bool;

    /// Clone `url` into `folder`, leaving it exactly at `revision` if given.
    fn checkout(&self, url: &str, folder: &Path, revision: Option<&str>) -> Result<()>;

    /// Resolve a tag, branch or short hash against the remote to a stable id.
    fn canonical_revision(&self, url: &str, revision: &str) -> Result<String>;

    /// Canonical id of the default branch tip of the remote.
    fn latest_revision(&self, url: &str) -> Result<String>;

    fn read_url(&self, folder: &Path) -> Result<String>;

    fn read_revision(&self, folder: &Path) -> Result<String>;

    /// Drop local modifications and untracked files, staying at the current
    /// revision.
    fn clear(&self, folder: &Path) -> Result<()>;

    /// Move the working copy to `revision`, or to the latest one if `None`.
    fn update(&self, folder: &Path, revision: Option<&str>) -> Result<()>;
}

/// A working copy handled by a specific backend.
pub struct Repository<'a> {
    folder: PathBuf,
    vcs: &'a dyn Vcs,
    url: OnceCell<String>,
}

impl<'a> Repository<'a> {
    pub fn new(vcs: &'a dyn Vcs, folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            vcs,
            url: OnceCell::new(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn kind(&self) -> VcsKind {
        self.vcs.kind()
    }

    /// The origin URL, read from the working copy on first access only.
    pub fn url(&self) -> Result<&str> {
        if let Some(url) = self.url.get() {
            return Ok(url);
        }
        let url = normalize_url(self.vcs.read_url(&self.folder)?.trim()).to_string();
        Ok(self.url.get_or_init(|| url))
    }

    /// The currently checked out revision. Never cached.
    pub fn revision(&self) -> Result<String> {
        self.vcs.read_revision(&self.folder)
    }

    pub fn clear(&self) -> Result<()> {
        self.vcs.clear(&self.folder)
    }

    pub fn update(&self, revision: Option<&str>) -> Result<()> {
        self.vcs.update(&self.folder, revision)
    }
}

/// One backend implementation per [`VcsKind`].
#[derive(Clone)]
pub struct Backends {
    git: Arc<dyn Vcs>,
    hg: Arc<dyn Vcs>,
}

impl Backends {
    /// The real `git` and `hg` command-line tools.
    pub fn system(runner: SystemRunner) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(runner);
        Self {
            git: Arc::new(git::Git::new(runner.clone())),
            hg: Arc::new(hg::Mercurial::new(runner)),
        }
    }

    pub fn with_backends(git: Arc<dyn Vcs>, hg: Arc<dyn Vcs>) -> Self {
        Self { git, hg }
    }

    pub fn get(&self, kind: VcsKind) -> &dyn Vcs {
        match kind {
            VcsKind::Git => self.git.as_ref(),
            VcsKind::Mercurial => self.hg.as_ref(),
        }
    }

    /// The first backend that recognizes `folder` as a working copy.
    pub fn detect(&self, folder: &Path) -> Option<&dyn Vcs> {
        VcsKind::ALL
            .into_iter()
            .map(|kind| self.get(kind))
            .find(|vcs| vcs.is_repository(folder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingVcs {
        url_reads: AtomicUsize,
        revision_reads: AtomicUsize,
    }

    impl Vcs for CountingVcs {
        fn kind(&self) -> VcsKind {
            VcsKind::Git
        }
        fn is_repository(&self, _folder: &Path) -> bool {
            true
        }
        fn checkout(&self, _url: &str, _folder: &Path, _revision: Option<&str>) -> Result<()> {
            Ok(())
        }
        fn canonical_revision(&self, _url: &str, revision: &str) -> Result<String> {
            Ok(revision.to_string())
        }
        fn latest_revision(&self, _url: &str) -> Result<String> {
            Ok("tip".to_string())
        }
        fn read_url(&self, _folder: &Path) -> Result<String> {
            let n = self.url_reads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://example.com/repo{}//\n", n))
        }
        fn read_revision(&self, _folder: &Path) -> Result<String> {
            let n = self.revision_reads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("rev{}", n))
        }
        fn clear(&self, _folder: &Path) -> Result<()> {
            Ok(())
        }
        fn update(&self, _folder: &Path, _revision: Option<&str>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_match_scheme_table() {
        assert_eq!(
            match_scheme("hg+https://hg.example.com/repo"),
            Some((VcsKind::Mercurial, "https://hg.example.com/repo"))
        );
        assert_eq!(
            match_scheme("git+ssh://git@example.com/repo.git"),
            Some((VcsKind::Git, "ssh://git@example.com/repo.git"))
        );
        assert_eq!(
            match_scheme("git://example.com/repo.git"),
            Some((VcsKind::Git, "git://example.com/repo.git"))
        );
        assert_eq!(match_scheme("svn+https://example.com/repo"), None);
        assert_eq!(match_scheme("/srv/projects/web"), None);
    }

    #[test]
    fn test_repository_url_is_read_once_and_trimmed() {
        let vcs = CountingVcs {
            url_reads: AtomicUsize::new(0),
            revision_reads: AtomicUsize::new(0),
        };
        let repo = Repository::new(&vcs, "/tmp/alfa-bravo");
        assert_eq!(repo.url().unwrap(), "https://example.com/repo0");
        assert_eq!(repo.url().unwrap(), "https://example.com/repo0");
        assert_eq!(vcs.url_reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_repository_revision_is_never_cached() {
        let vcs = CountingVcs {
            url_reads: AtomicUsize::new(0),
            revision_reads: AtomicUsize::new(0),
        };
        let repo = Repository::new(&vcs, "/tmp/alfa-bravo");
        assert_eq!(repo.revision().unwrap(), "rev0");
        assert_eq!(repo.revision().unwrap(), "rev1");
    }

    #[test]
    fn test_detect_by_marker_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let hg_folder = temp.path().join("hg-copy");
        let git_folder = temp.path().join("git-copy");
        std::fs::create_dir_all(hg_folder.join(".hg")).unwrap();
        std::fs::create_dir_all(git_folder.join(".git")).unwrap();

        let backends = Backends::system(SystemRunner::default());
        assert_eq!(backends.detect(&hg_folder).map(|v| v.kind()), Some(VcsKind::Mercurial));
        assert_eq!(backends.detect(&git_folder).map(|v| v.kind()), Some(VcsKind::Git));
        assert!(backends.detect(temp.path()).is_none());
        assert!(backends.detect(&temp.path().join("missing")).is_none());
    }
}

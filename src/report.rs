//! Per-entry results of a run.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum EntryStatus {
    Started,
    Paused,
    Failed(String),
    /// Never reached because an earlier creation failed
    Skipped,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Started => write!(f, "started"),
            EntryStatus::Paused => write!(f, "paused"),
            EntryStatus::Failed(message) => write!(f, "failed: {}", message),
            EntryStatus::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryOutcome {
    pub name: String,
    pub folderspec: String,
    /// Project folder, when allocation got that far
    pub folder: Option<PathBuf>,
    #[serde(flatten)]
    pub status: EntryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub overlord: String,
    pub entries: Vec<EntryOutcome>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry.status, EntryStatus::Failed(_)))
    }

    pub fn count(&self, predicate: impl Fn(&EntryStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.status)).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "overlord {}:", self.overlord)?;
        for entry in &self.entries {
            write!(f, "  {}: {}", entry.name, entry.status)?;
            if let Some(folder) = &entry.folder {
                write!(f, " ({})", folder.display())?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "{} started, {} paused, {} failed, {} skipped",
            self.count(|s| *s == EntryStatus::Started),
            self.count(|s| *s == EntryStatus::Paused),
            self.count(|s| matches!(s, EntryStatus::Failed(_))),
            self.count(|s| *s == EntryStatus::Skipped),
        )
    }
}

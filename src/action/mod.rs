//! # Actions
//!
//! An [`Action`] is one unit of work in the provisioning graph. Actions
//! compose in two ways:
//!
//! - [`ActionSequence`]: children run strictly in order, the first failure
//!   stops the sequence.
//! - [`ParallelActions`]: children run concurrently, one worker each, and
//!   every child runs to completion regardless of its siblings.
//!
//! The leaves doing real work are [`CreateZergling`] and [`StartZergling`].
//!
//! Every action can render itself with [`Action::ascii_graph`] for operator
//! visibility. Leaves render their label inside a border:
//!
//! ```text
//! +-----------------------+
//! | CreateZergling:       |
//! | git+https://host/repo |
//! +-----------------------+
//! ```

mod parallel;
mod sequence;
mod zergling;

use std::sync::Arc;

use crate::error::Result;

pub use parallel::ParallelActions;
pub use sequence::ActionSequence;
pub use zergling::{CreateZergling, StartZergling, ZerglingSource};

/// A unit of work in the provisioning graph.
pub trait Action: Send + Sync {
    /// Run to completion.
    fn start(&self) -> Result<()>;

    /// Short multi-line description used in graphs and error reports.
    fn label(&self) -> String;

    fn ascii_graph(&self) -> String {
        boxed(&self.label())
    }
}

impl<A: Action + ?Sized> Action for Arc<A> {
    fn start(&self) -> Result<()> {
        (**self).start()
    }

    fn label(&self) -> String {
        (**self).label()
    }

    fn ascii_graph(&self) -> String {
        (**self).ascii_graph()
    }
}

impl<A: Action + ?Sized> Action for Box<A> {
    fn start(&self) -> Result<()> {
        (**self).start()
    }

    fn label(&self) -> String {
        (**self).label()
    }

    fn ascii_graph(&self) -> String {
        (**self).ascii_graph()
    }
}

/// Display width of a graph line.
pub(crate) fn width(line: &str) -> usize {
    line.chars().count()
}

/// Left-align `line` in a field of `width` characters.
pub(crate) fn pad(line: &str, width: usize) -> String {
    let mut padded = line.to_string();
    padded.extend(std::iter::repeat(' ').take(width.saturating_sub(self::width(line))));
    padded
}

pub(crate) fn border(width: usize) -> String {
    format!("+{}+", "-".repeat(width + 2))
}

/// Draw `text` inside a `+--+` border, one row per line of text.
pub fn boxed(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        lines.push("");
    }
    let inner = lines.iter().map(|line| width(line)).max().unwrap_or(0);
    let mut out = vec![border(inner)];
    out.extend(lines.iter().map(|line| format!("| {} |", pad(line, inner))));
    out.push(border(inner));
    out.join("\n")
}

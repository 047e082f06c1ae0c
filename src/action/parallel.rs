use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use log::warn;

use super::{border, pad, width, Action};
use crate::error::{Error, Result};

/// Runs its children concurrently.
///
/// Each child gets its own worker thread, so no child waits for a free
/// slot. A failing child never cancels its siblings; once every child has
/// finished, all failures are reported together as [`Error::Parallel`].
pub struct ParallelActions {
    actions: Vec<Box<dyn Action>>,
}

impl ParallelActions {
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        Self { actions }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Action for ParallelActions {
    fn start(&self) -> Result<()> {
        if self.actions.is_empty() {
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.actions.len())
            .thread_name(|i| format!("overlord-worker-{}", i))
            .build()?;

        // Collect errors from all parallel operations
        let failures: Mutex<Vec<(usize, String, String)>> = Mutex::new(Vec::new());

        pool.scope(|scope| {
            for (index, action) in self.actions.iter().enumerate() {
                let failures = &failures;
                scope.spawn(move |_| {
                    let message = match catch_unwind(AssertUnwindSafe(|| action.start())) {
                        Ok(Ok(())) => return,
                        Ok(Err(e)) => e.to_string(),
                        Err(panic) => panic_message(panic.as_ref()),
                    };
                    let label = action.label().replace('\n', " ");
                    warn!("{} failed: {}", label, message);
                    failures
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push((index, label, message));
                });
            }
        });

        let mut failures = failures
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if failures.is_empty() {
            return Ok(());
        }
        failures.sort_by_key(|(index, _, _)| *index);
        Err(Error::Parallel {
            total: self.actions.len(),
            failures: failures
                .into_iter()
                .map(|(_, label, message)| (label, message))
                .collect(),
        })
    }

    fn label(&self) -> String {
        self.actions
            .iter()
            .map(|a| a.label().replace('\n', " "))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Child blocks stacked inside one shared border.
    fn ascii_graph(&self) -> String {
        if let [only] = self.actions.as_slice() {
            return only.ascii_graph();
        }
        let blocks: Vec<String> = self.actions.iter().map(|a| a.ascii_graph()).collect();
        let inner = blocks
            .iter()
            .filter_map(|block| block.lines().next())
            .map(width)
            .max()
            .unwrap_or(0);

        let mut out = vec![border(inner)];
        for block in &blocks {
            out.extend(block.lines().map(|line| format!("| {} |", pad(line, inner))));
            out.push(border(inner));
        }
        out.join("\n")
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

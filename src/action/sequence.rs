use super::{width, Action};
use crate::error::Result;

/// Runs its children one after the other.
pub struct ActionSequence {
    actions: Vec<Box<dyn Action>>,
}

impl ActionSequence {
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

impl Action for ActionSequence {
    /// The first failing child aborts the sequence; later children never run.
    fn start(&self) -> Result<()> {
        for action in &self.actions {
            action.start()?;
        }
        Ok(())
    }

    fn label(&self) -> String {
        self.actions
            .iter()
            .map(|a| a.label().replace('\n', " "))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Child blocks side by side, arrows on the middle row.
    fn ascii_graph(&self) -> String {
        let mut blocks: Vec<Vec<String>> = self
            .actions
            .iter()
            .map(|a| a.ascii_graph().lines().map(str::to_string).collect())
            .collect();
        let height = blocks.iter().map(Vec::len).max().unwrap_or(0);

        // shorter blocks grow alternately below and above to stay centered
        for block in &mut blocks {
            let blank = " ".repeat(block.first().map(|l| width(l)).unwrap_or(0));
            let mut below = true;
            while block.len() < height {
                if below {
                    block.push(blank.clone());
                } else {
                    block.insert(0, blank.clone());
                }
                below = !below;
            }
        }

        let arrow_row = height.div_ceil(2);
        (0..height)
            .map(|row| {
                let cells: Vec<&str> = blocks.iter().map(|b| b[row].as_str()).collect();
                if row + 1 == arrow_row {
                    cells.join(" -> ")
                } else {
                    cells.join("    ")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

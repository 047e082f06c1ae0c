//! Property-based tests for action graph rendering.
//!
//! Whatever the labels, a rendered graph must be a clean rectangle so that
//! it can be nested inside other graphs.

#[cfg(test)]
mod proptest_tests {
    use std::sync::{Arc, Mutex};

    use crate::action::testing::Probe;
    use crate::action::{boxed, Action, ActionSequence, ParallelActions};
    use proptest::prelude::*;

    fn label() -> impl Strategy<Value = String> {
        "[a-z]{1,8}(\n[a-z ]{0,10}){0,3}"
    }

    fn probes(names: &[String]) -> Vec<Box<dyn Action>> {
        let journal = Arc::new(Mutex::new(Vec::new()));
        names.iter().map(|name| Probe::ok(name, &journal)).collect()
    }

    fn widths(graph: &str) -> Vec<usize> {
        graph.lines().map(|line| line.chars().count()).collect()
    }

    fn is_rectangle(graph: &str) -> bool {
        let widths = widths(graph);
        widths.windows(2).all(|pair| pair[0] == pair[1])
    }

    proptest! {
        /// Property: a boxed label has one row per label line plus two borders
        #[test]
        fn boxed_is_a_rectangle(text in label()) {
            let graph = boxed(&text);
            prop_assert!(is_rectangle(&graph));
            prop_assert_eq!(graph.lines().count(), text.lines().count() + 2);
        }

        /// Property: a sequence is as tall as its tallest child and has its
        /// arrows on a single row
        #[test]
        fn sequence_rows_align(names in prop::collection::vec(label(), 1..5)) {
            let tallest = names.iter().map(|n| n.lines().count() + 2).max().unwrap();
            let graph = ActionSequence::new(probes(&names)).ascii_graph();

            prop_assert!(is_rectangle(&graph));
            prop_assert_eq!(graph.lines().count(), tallest);
            let arrow_rows: Vec<usize> = graph
                .lines()
                .enumerate()
                .filter(|(_, line)| line.contains(" -> "))
                .map(|(row, _)| row)
                .collect();
            if names.len() == 1 {
                prop_assert!(arrow_rows.is_empty());
            } else {
                prop_assert_eq!(arrow_rows, vec![tallest.div_ceil(2) - 1]);
            }
        }

        /// Property: a parallel group stacks its children between borders
        #[test]
        fn parallel_stacks_children(names in prop::collection::vec(label(), 2..5)) {
            let graph = ParallelActions::new(probes(&names)).ascii_graph();
            let expected: usize = 1 + names.iter().map(|n| n.lines().count() + 3).sum::<usize>();

            prop_assert!(is_rectangle(&graph));
            prop_assert_eq!(graph.lines().count(), expected);
        }

        /// Property: nesting keeps the rectangle shape
        #[test]
        fn nested_graphs_stay_rectangular(
            first in prop::collection::vec(label(), 1..4),
            second in prop::collection::vec(label(), 1..4),
        ) {
            let groups: Vec<Box<dyn Action>> = vec![
                Box::new(ParallelActions::new(probes(&first))),
                Box::new(ActionSequence::new(probes(&second))),
            ];
            let graph = ActionSequence::new(vec![
                Box::new(ParallelActions::new(groups)),
                Box::new(ParallelActions::new(probes(&first))),
            ])
            .ascii_graph();
            prop_assert!(is_rectangle(&graph));
        }
    }
}

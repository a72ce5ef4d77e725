use domain::models::PassageNode;
use std::collections::VecDeque;

/// Moves the best-scored passages to the edges of the context window and the
/// weakest toward the middle. Models attend less to the middle of long prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongContextReorder;

impl LongContextReorder {
    pub fn new() -> Self {
        Self
    }

    /// Stable ascending sort by score, then alternate front/back insertion.
    /// The best passage lands first, the runner-up last.
    pub fn reorder(&self, nodes: Vec<PassageNode>) -> Vec<PassageNode> {
        let mut sorted = nodes;
        sorted.sort_by(|a, b| a.score().total_cmp(&b.score()));

        let mut ordered = VecDeque::with_capacity(sorted.len());
        for (i, node) in sorted.into_iter().enumerate() {
            if i % 2 == 0 {
                ordered.push_front(node);
            } else {
                ordered.push_back(node);
            }
        }
        ordered.into()
    }
}

use crate::long_context::LongContextReorder;
use crate::reranker::RankGptReranker;
use domain::models::{PassageNode, Query};
use domain::ports::TextGenerator;
use shared::types::Result;

/// Rerank, then reorder. The order is fixed by construction.
pub struct PostProcessorChain<G> {
    reranker: RankGptReranker<G>,
    reorder: LongContextReorder,
}

impl<G: TextGenerator> PostProcessorChain<G> {
    pub fn new(reranker: RankGptReranker<G>) -> Self {
        Self {
            reranker,
            reorder: LongContextReorder::new(),
        }
    }

    pub async fn postprocess(
        &self,
        nodes: Vec<PassageNode>,
        query: &Query,
    ) -> Result<Vec<PassageNode>> {
        let ranked = self.reranker.rerank(nodes, query).await?;
        Ok(self.reorder.reorder(ranked))
    }
}

use crate::pipeline_state::Stage;
use thiserror::Error;

/// A stage failure, carrying the backend error that caused it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("query expansion failed: {0:#}")]
    Expansion(anyhow::Error),
    #[error("retrieval failed: {0:#}")]
    Retrieval(anyhow::Error),
    #[error("reranking failed: {0:#}")]
    Rerank(anyhow::Error),
    #[error("synthesis failed: {0:#}")]
    Synthesis(anyhow::Error),
    #[error("response stream failed: {0}")]
    Stream(String),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Expansion(_) => Stage::Expanding,
            PipelineError::Retrieval(_) => Stage::Retrieving,
            PipelineError::Rerank(_) => Stage::PostProcessing,
            PipelineError::Synthesis(_) => Stage::Synthesizing,
            PipelineError::Stream(_) => Stage::Streaming,
        }
    }
}

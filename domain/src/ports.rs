//! Contracts the pipeline expects from external services.

use crate::models::{GenerationRequest, PassageNode};
use futures::stream::BoxStream;
use shared::types::Result;
use std::future::Future;

/// Incremental text from a streaming completion. Ends after the last fragment;
/// an `Err` item means the backend failed mid-stream.
pub type FragmentStream = BoxStream<'static, Result<String>>;

pub trait TextGenerator: Send + Sync {
    /// Non-streaming completion, returning the full text.
    fn complete(&self, request: &GenerationRequest) -> impl Future<Output = Result<String>> + Send;

    /// Open a streaming completion.
    fn stream(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<FragmentStream>> + Send;
}

pub trait TextEmbedder: Send + Sync {
    /// One vector per input, in input order.
    fn embed(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

pub trait VectorRetriever: Send + Sync {
    /// At most `k` passages, descending similarity, no repeated ids.
    fn retrieve(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> impl Future<Output = Result<Vec<PassageNode>>> + Send;
}

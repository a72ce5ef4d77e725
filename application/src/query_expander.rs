use crate::prompts::hyde_prompt;
use anyhow::{anyhow, Context};
use domain::models::{ExpandedQuery, GenerationRequest, ModelSettings, Query};
use domain::ports::{TextEmbedder, TextGenerator};
use shared::types::Result;
use std::sync::Arc;
use tracing::debug;

/// Hypothetical Document Embedding transform.
///
/// Asks the generator for a passage that would answer the query and searches
/// with the mean of its embedding and the literal query's embedding.
pub struct HydeQueryExpander<G, E> {
    generator: Arc<G>,
    embedder: Arc<E>,
    settings: ModelSettings,
}

impl<G: TextGenerator, E: TextEmbedder> HydeQueryExpander<G, E> {
    pub fn new(generator: Arc<G>, embedder: Arc<E>, settings: ModelSettings) -> Self {
        Self {
            generator,
            embedder,
            settings,
        }
    }

    pub async fn expand(&self, query: &Query) -> Result<ExpandedQuery> {
        let request = GenerationRequest::from_prompt(hyde_prompt(query), &self.settings, false);
        let hypothetical = self
            .generator
            .complete(&request)
            .await
            .context("hypothetical document generation failed")?;
        let hypothetical = hypothetical.trim().to_string();
        if hypothetical.is_empty() {
            return Err(anyhow!("generator returned an empty hypothetical document"));
        }

        let embedding_strs = vec![hypothetical.clone(), query.as_str().to_string()];
        let vectors = self
            .embedder
            .embed(&embedding_strs)
            .await
            .context("embedding the expanded query failed")?;
        if vectors.len() != embedding_strs.len() {
            return Err(anyhow!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                embedding_strs.len()
            ));
        }
        let embedding = mean_embedding(&vectors)?;
        debug!(
            hypothetical_chars = hypothetical.len(),
            dimensions = embedding.len(),
            "query expanded"
        );

        Ok(ExpandedQuery {
            query_str: query.as_str().to_string(),
            hypothetical_document: hypothetical,
            embedding_strs,
            embedding,
        })
    }
}

/// Element-wise mean. All vectors must share one non-zero dimension.
pub fn mean_embedding(vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
    let first = vectors
        .first()
        .ok_or_else(|| anyhow!("no embeddings to aggregate"))?;
    let dims = first.len();
    if dims == 0 {
        return Err(anyhow!("embedding has no dimensions"));
    }
    let mut sum = vec![0.0f32; dims];
    for vector in vectors {
        if vector.len() != dims {
            return Err(anyhow!(
                "embedding dimensions differ: {} vs {}",
                dims,
                vector.len()
            ));
        }
        for (acc, value) in sum.iter_mut().zip(vector) {
            *acc += value;
        }
    }
    let count = vectors.len() as f32;
    Ok(sum.into_iter().map(|v| v / count).collect())
}

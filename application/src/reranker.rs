//! Listwise reranking with a chat model as judge.

use crate::prompts::{passage_content, rank_prefix, rank_suffix, RANK_SYSTEM_PROMPT};
use anyhow::{anyhow, Context};
use domain::models::{ChatMessage, GenerationRequest, ModelSettings, PassageNode, Query};
use domain::ports::TextGenerator;
use shared::types::Result;
use shared::utils::truncate_words;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Words of each passage shown to the judge.
pub const MAX_PASSAGE_WORDS: usize = 300;

pub struct RankGptReranker<G> {
    generator: Arc<G>,
    settings: ModelSettings,
    top_n: usize,
}

impl<G: TextGenerator> RankGptReranker<G> {
    pub fn new(generator: Arc<G>, settings: ModelSettings, top_n: usize) -> Self {
        Self {
            generator,
            settings,
            top_n,
        }
    }

    /// Top-N nodes, most relevant first, re-scored by judged rank.
    pub async fn rerank(&self, nodes: Vec<PassageNode>, query: &Query) -> Result<Vec<PassageNode>> {
        if nodes.is_empty() {
            return Ok(nodes);
        }
        let request = GenerationRequest::new(
            ranking_messages(query.as_str(), &nodes),
            &self.settings,
            false,
        );
        let reply = self
            .generator
            .complete(&request)
            .await
            .context("relevance judgement failed")?;
        let order = parse_ranking(&reply, nodes.len()).ok_or_else(|| {
            anyhow!("relevance judgement contained no usable passage identifiers: {reply:?}")
        })?;
        debug!(candidates = nodes.len(), top_n = self.top_n, "passages reranked");
        Ok(apply_ranking(&nodes, &order, self.top_n))
    }
}

fn ranking_messages(query: &str, nodes: &[PassageNode]) -> Vec<ChatMessage> {
    let mut messages = vec![
        ChatMessage::system(RANK_SYSTEM_PROMPT),
        ChatMessage::user(rank_prefix(query, nodes.len())),
        ChatMessage::assistant("Okay, please provide the passages."),
    ];
    for (i, node) in nodes.iter().enumerate() {
        let rank = i + 1;
        let content = truncate_words(&passage_content(node), MAX_PASSAGE_WORDS);
        messages.push(ChatMessage::user(format!("[{rank}] {content}")));
        messages.push(ChatMessage::assistant(format!("Received passage [{rank}].")));
    }
    messages.push(ChatMessage::user(rank_suffix(query, nodes.len())));
    messages
}

/// Turn a reply such as `"[2] > [3] > [1]"` into a full permutation of
/// `0..len`. Out-of-range and repeated identifiers are dropped; identifiers
/// the judge left out follow in their original order. `None` when the reply
/// names no valid identifier at all.
pub fn parse_ranking(reply: &str, len: usize) -> Option<Vec<usize>> {
    let mut seen = HashSet::new();
    let mut order: Vec<usize> = reply
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<usize>().ok())
        .filter_map(|id| id.checked_sub(1))
        .filter(|&idx| idx < len)
        .filter(|idx| seen.insert(*idx))
        .collect();
    if order.is_empty() {
        return None;
    }
    if order.len() < len {
        warn!(
            ranked = order.len(),
            candidates = len,
            "judge ranked a subset, appending the rest in retrieval order"
        );
        order.extend((0..len).filter(|idx| !seen.contains(idx)));
    }
    Some(order)
}

/// Build the top-N selection. Scores are `(len - rank) / len`, strictly
/// decreasing, so later score-based ordering agrees with the judge.
pub fn apply_ranking(nodes: &[PassageNode], order: &[usize], top_n: usize) -> Vec<PassageNode> {
    let len = order.len() as f32;
    order
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(rank, &idx)| nodes[idx].rescored((len - rank as f32) / len))
        .collect()
}

use rayon::prelude::*;
use std::collections::HashSet;

/// A stored vector with the id it is scored under.
pub struct Candidate<'a> {
    pub id: &'a str,
    pub vector: &'a [f32],
}

pub struct SearchEngine;

impl SearchEngine {
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot_product / (norm_a * norm_b)
    }

    /// Indices into `candidates` of the `top_k` most similar vectors, paired
    /// with their scores, best first. Ties keep candidate order; a repeated id
    /// is only reported once.
    pub fn top_k(query: &[f32], candidates: &[Candidate<'_>], top_k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = candidates
            .par_iter()
            .enumerate()
            .map(|(i, c)| (i, Self::cosine_similarity(query, c.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut seen = HashSet::new();
        scored
            .into_iter()
            .filter(|(i, _)| seen.insert(candidates[*i].id))
            .take(top_k)
            .collect()
    }
}

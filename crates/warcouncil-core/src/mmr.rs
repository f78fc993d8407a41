//! Maximum Marginal Relevance selection.
//!
//! Greedily picks `k` candidates balancing relevance to the query against
//! redundancy with what has already been picked:
//!
//! ```text
//! mmr(d) = λ · sim(d, query) − (1 − λ) · max_{s ∈ selected} sim(d, s)
//! ```
//!
//! `sim(d, query)` is the candidate's `similarity`; document-to-document
//! similarity is the cosine of their embeddings. The selection is seeded
//! with the single most relevant candidate and ties go to the candidate
//! encountered first, so the output is deterministic.

use crate::embedding::cosine_similarity;
use crate::models::Candidate;

/// Default trade-off for advisor queries (favors relevance).
pub const ADVISOR_LAMBDA: f32 = 0.7;

/// Default trade-off for battle simulation lookups.
pub const SIMULATOR_LAMBDA: f32 = 0.5;

fn by_similarity_desc(candidates: &mut [Candidate<'_>]) {
    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Select `min(k, candidates.len())` candidates in selection order.
///
/// When there are no more candidates than `k`, all of them are returned
/// ordered by similarity (stable).
pub fn mmr_select<'a>(mut candidates: Vec<Candidate<'a>>, k: usize, lambda: f32) -> Vec<Candidate<'a>> {
    if k == 0 {
        return Vec::new();
    }
    if candidates.len() <= k {
        by_similarity_desc(&mut candidates);
        return candidates;
    }

    let lambda = lambda.clamp(0.0, 1.0);

    let mut seed = 0;
    for (i, c) in candidates.iter().enumerate() {
        if c.similarity > candidates[seed].similarity {
            seed = i;
        }
    }

    let mut remaining: Vec<usize> = (0..candidates.len()).filter(|&i| i != seed).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(k);
    selected.push(seed);

    // Running max similarity of each candidate to the selected set.
    let mut redundancy: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(&c.doc.embedding, &candidates[seed].doc.embedding))
        .collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (pos, &i) in remaining.iter().enumerate() {
            let score = lambda * candidates[i].similarity - (1.0 - lambda) * redundancy[i];
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        let picked = remaining.remove(best_pos);
        selected.push(picked);

        for &i in &remaining {
            let sim = cosine_similarity(&candidates[i].doc.embedding, &candidates[picked].doc.embedding);
            if sim > redundancy[i] {
                redundancy[i] = sim;
            }
        }
    }

    selected.into_iter().map(|i| candidates[i]).collect()
}

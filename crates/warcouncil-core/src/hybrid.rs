//! Hybrid candidate merging and intent-aware recall boosts.
//!
//! # Merge
//!
//! 1. Semantic hits are inserted first, in rank order.
//! 2. Keyword hits follow; a hit whose `(id, category)` is already present
//!    only contributes its keyword score.
//! 3. Keyword-only hits receive a similarity from the same [`Relevance`]
//!    signal, so every candidate carries one.
//!
//! # Boosts
//!
//! The base search can under-represent a specifically named item, so two
//! intents pull extra documents from the unfiltered corpus:
//!
//! | Intent | Parameter | Extra documents |
//! |--------|-----------|-----------------|
//! | `upgrade_priority` | `item_type` | top `upgrade_k` |
//! | `attack_strategy` | `focus_unit` | top `attack_k` |
//!
//! A document matches when its `type` equals the parameter or its content
//! contains it (case-insensitive). Matches are ranked by relevance, the top
//! ones are taken, and those already present are skipped.

use std::collections::HashSet;

use crate::embedding::cosine_similarity;
use crate::models::{Candidate, DocKey, Document};
use crate::query::Intent;
use crate::similarity::keyword_score;

/// The relevance signal a retrieval call ranks by.
#[derive(Debug, Clone, Copy)]
pub enum Relevance<'q> {
    /// Cosine similarity to the query embedding.
    Semantic(&'q [f32]),
    /// Keyword score normalized by the best score in the pool; used when
    /// the query could not be embedded.
    Keyword {
        keywords: &'q [String],
        max_score: u32,
    },
}

impl Relevance<'_> {
    pub fn score(&self, doc: &Document) -> f32 {
        match self {
            Relevance::Semantic(q) => cosine_similarity(q, &doc.embedding),
            Relevance::Keyword {
                keywords,
                max_score,
            } => {
                if *max_score == 0 {
                    return 0.0;
                }
                (keyword_score(keywords, doc) as f32 / *max_score as f32).min(1.0)
            }
        }
    }
}

/// How many extra documents each boosted intent may pull in.
#[derive(Debug, Clone, Copy)]
pub struct BoostLimits {
    pub upgrade_k: usize,
    pub attack_k: usize,
}

impl Default for BoostLimits {
    fn default() -> Self {
        Self {
            upgrade_k: 3,
            attack_k: 2,
        }
    }
}

/// Merge semantic and keyword hits into one deduplicated candidate list.
pub fn merge_candidates<'a>(
    semantic: Vec<Candidate<'a>>,
    keyword: Vec<(&'a Document, u32)>,
    relevance: &Relevance<'_>,
) -> Vec<Candidate<'a>> {
    let mut seen: HashSet<DocKey> = HashSet::new();
    let mut merged: Vec<Candidate<'a>> = Vec::with_capacity(semantic.len() + keyword.len());

    for cand in semantic {
        if seen.insert(cand.key()) {
            merged.push(cand);
        }
    }

    for (doc, score) in keyword {
        let key = doc.key();
        if seen.contains(&key) {
            if let Some(existing) = merged.iter_mut().find(|c| c.key() == key) {
                if existing.keyword_score.is_none() {
                    existing.keyword_score = Some(score);
                }
            }
            continue;
        }
        seen.insert(key);
        merged.push(Candidate {
            doc,
            similarity: relevance.score(doc),
            keyword_score: Some(score),
        });
    }

    merged
}

/// Append intent-specific documents from `corpus` that are not yet present.
///
/// Returns the number of documents added.
pub fn apply_intent_boost<'a>(
    candidates: &mut Vec<Candidate<'a>>,
    intent: &Intent,
    corpus: &'a [Document],
    relevance: &Relevance<'_>,
    limits: BoostLimits,
) -> usize {
    let (term, k) = match intent {
        Intent::UpgradePriority {
            item_type: Some(t),
        } => (t.as_str(), limits.upgrade_k),
        Intent::AttackStrategy {
            focus_unit: Some(u),
            ..
        } => (u.as_str(), limits.attack_k),
        _ => return 0,
    };
    if k == 0 {
        return 0;
    }

    let term = term.to_lowercase();
    let mut matches: Vec<Candidate<'a>> = corpus
        .iter()
        .filter(|d| {
            d.metadata.kind.eq_ignore_ascii_case(&term) || d.content.to_lowercase().contains(&term)
        })
        .map(|doc| Candidate {
            doc,
            similarity: relevance.score(doc),
            keyword_score: None,
        })
        .collect();
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(k);

    let mut seen: HashSet<DocKey> = candidates.iter().map(|c| c.key()).collect();
    let mut added = 0;
    for m in matches {
        if seen.insert(m.key()) {
            candidates.push(m);
            added += 1;
        }
    }
    added
}

//! Semantic and keyword scorers.
//!
//! Both scorers are stateless functions over a document pool; they never
//! depend on earlier calls and may run concurrently against the same
//! corpus snapshot.
//!
//! # Keyword scoring
//!
//! | Match | Points |
//! |-------|--------|
//! | keyword is a substring of the content | +1 |
//! | keyword is a substring of `metadata.name` | +2 |
//! | keyword equals `metadata.type` | +3 |
//!
//! Substring tests are case-insensitive and are not word-bounded, so a
//! short keyword can match inside a longer unrelated word.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::embedding::cosine_similarity;
use crate::models::{Candidate, Document};

const MIN_KEYWORD_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "his", "how", "its", "may", "new", "now", "old", "see", "two",
    "who", "did", "get", "got", "let", "put", "say", "she", "too", "use", "why", "what", "when",
    "where", "which", "while", "with", "would", "should", "could", "this", "that", "these",
    "those", "from", "have", "into", "than", "then", "them", "they", "there", "their", "your",
    "about", "best", "good", "first", "does", "will", "just", "more", "most", "some", "such",
    "very", "also", "been", "being", "were", "only", "other", "over", "under", "after",
    "before", "again", "each", "here",
];

/// Short domain abbreviations kept regardless of length.
const DOMAIN_ABBREVIATIONS: &[&str] = &[
    "th", "bk", "aq", "gw", "rc", "mp", "cc", "hp", "de", "dps", "aoe",
];

static TIER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:th|t)?\d{1,2}$").expect("valid tier token regex"));

fn is_tier_token(token: &str) -> bool {
    TIER_TOKEN.is_match(token)
}

/// Extract search keywords from free text.
///
/// Lower-cases, strips punctuation, splits on whitespace, then drops stop
/// words and tokens shorter than three characters. Domain abbreviations and
/// tier tokens (`t9`, `th10`, `9`) are always kept. Duplicates are removed,
/// keeping first-occurrence order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut keywords: Vec<String> = Vec::new();
    for token in cleaned.split_whitespace() {
        let keep = DOMAIN_ABBREVIATIONS.contains(&token)
            || is_tier_token(token)
            || (token.chars().count() >= MIN_KEYWORD_LEN && !STOP_WORDS.contains(&token));
        if keep && !keywords.iter().any(|k| k == token) {
            keywords.push(token.to_string());
        }
    }
    keywords
}

/// Keyword score of one document; `0` means no match.
pub fn keyword_score(keywords: &[String], doc: &Document) -> u32 {
    if keywords.is_empty() {
        return 0;
    }
    let content = doc.content.to_lowercase();
    let name = doc.metadata.name.to_lowercase();
    let kind = doc.metadata.kind.to_lowercase();

    keywords
        .iter()
        .map(|kw| {
            let mut score = 0;
            if content.contains(kw.as_str()) {
                score += 1;
            }
            if name.contains(kw.as_str()) {
                score += 2;
            }
            if kind == *kw {
                score += 3;
            }
            score
        })
        .sum()
}

/// Score every document in `pool`, drop zero scores, and return the top `k`
/// by score. Ties keep pool order.
pub fn keyword_rank<'a>(
    keywords: &[String],
    pool: &[&'a Document],
    k: usize,
) -> Vec<(&'a Document, u32)> {
    let mut hits: Vec<(&'a Document, u32)> = pool
        .iter()
        .filter_map(|&doc| {
            let score = keyword_score(keywords, doc);
            (score > 0).then_some((doc, score))
        })
        .collect();
    hits.sort_by(|a, b| b.1.cmp(&a.1));
    hits.truncate(k);
    hits
}

/// Rank `pool` by cosine similarity to `query_vec` and return the top `k`.
/// Ties keep pool order.
pub fn semantic_rank<'a>(query_vec: &[f32], pool: &[&'a Document], k: usize) -> Vec<Candidate<'a>> {
    let mut scored: Vec<Candidate<'a>> = pool
        .iter()
        .map(|&doc| Candidate {
            doc,
            similarity: cosine_similarity(query_vec, &doc.embedding),
            keyword_score: None,
        })
        .collect();
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}

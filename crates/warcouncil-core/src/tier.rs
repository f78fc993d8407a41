//! Tier-scoped corpus filtering with graduated fallback.
//!
//! 1. No tier: the whole corpus.
//! 2. Documents mentioning the tier, if there are at least `min_pool`.
//! 3. Those plus documents mentioning tier ± 1, if at least `min_pool`.
//! 4. Otherwise the whole corpus.
//!
//! A mention is any word-bounded form recognized by the query interpreter
//! (`T9`, `TH9`, `tier 9`, `tier-9`, `town hall 9`), so `T1` does not match
//! `T10`.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{DocKey, Document};
use crate::query::TIER_MENTION;

/// Minimum pool size before falling back to a wider scope.
pub const DEFAULT_MIN_POOL: usize = 5;

/// Tier numbers mentioned anywhere in `text`.
pub fn tiers_mentioned(text: &str) -> impl Iterator<Item = u32> + '_ {
    TIER_MENTION
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
}

/// True when `text` mentions any tier in `tiers`.
pub fn mentions_any(text: &str, tiers: &[u32]) -> bool {
    tiers_mentioned(text).any(|t| tiers.contains(&t))
}

/// Narrow `docs` to those relevant to `tier`.
pub fn filter_by_tier<'a>(tier: Option<u32>, docs: &'a [Document], min_pool: usize) -> Vec<&'a Document> {
    let all = || docs.iter().collect::<Vec<_>>();

    let tier = match tier {
        Some(t) => t,
        None => return all(),
    };

    let exact: Vec<&Document> = docs
        .iter()
        .filter(|d| mentions_any(&d.content, &[tier]))
        .collect();
    if exact.len() >= min_pool {
        debug!(tier, pool = exact.len(), "tier filter: exact");
        return exact;
    }

    let mut neighbours = Vec::with_capacity(2);
    if let Some(above) = tier.checked_add(1) {
        neighbours.push(above);
    }
    if tier > 1 {
        neighbours.push(tier - 1);
    }

    let mut seen: HashSet<DocKey> = exact.iter().map(|d| d.key()).collect();
    let mut widened = exact;
    for doc in docs.iter().filter(|d| mentions_any(&d.content, &neighbours)) {
        if seen.insert(doc.key()) {
            widened.push(doc);
        }
    }
    if widened.len() >= min_pool {
        debug!(tier, pool = widened.len(), "tier filter: exact + nearby");
        return widened;
    }

    debug!(
        tier,
        matched = widened.len(),
        "tier filter: too few matches, using full corpus"
    );
    all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMetadata;

    fn doc(id: &str, content: &str) -> Document {
        Document {
            id: id.to_string(),
            content: content.to_string(),
            metadata: DocumentMetadata {
                name: id.to_string(),
                kind: "defense".to_string(),
                category: "stats".to_string(),
                url: None,
            },
            embedding: vec![1.0],
        }
    }

    fn ids(docs: &[&Document]) -> Vec<String> {
        docs.iter().map(|d| d.id.clone()).collect()
    }

    #[test]
    fn test_no_tier_returns_corpus() {
        let corpus = vec![doc("a", "x"), doc("b", "y")];
        assert_eq!(filter_by_tier(None, &corpus, 5).len(), 2);
    }

    #[test]
    fn test_mentions_forms() {
        assert!(mentions_any("Unlocked at TH9.", &[9]));
        assert!(mentions_any("available from tier 9 onward", &[9]));
        assert!(mentions_any("Town Hall 9 cap", &[9]));
        assert!(!mentions_any("Unlocked at TH10.", &[1]));
        assert!(!mentions_any("level 9 archer", &[9]));
    }

    #[test]
    fn test_exact_pool_large_enough() {
        let mut corpus: Vec<Document> = (0..5).map(|i| doc(&format!("e{}", i), "T9 stuff")).collect();
        corpus.push(doc("n", "T8 stuff"));
        corpus.push(doc("x", "unrelated"));
        let pool = filter_by_tier(Some(9), &corpus, 5);
        assert_eq!(ids(&pool), vec!["e0", "e1", "e2", "e3", "e4"]);
    }

    #[test]
    fn test_nearby_widening() {
        let corpus = vec![
            doc("e0", "T9"),
            doc("e1", "tier 9"),
            doc("n0", "T8 and T9"),
            doc("n1", "T10"),
            doc("n2", "th8"),
            doc("x", "T3"),
        ];
        let pool = filter_by_tier(Some(9), &corpus, 5);
        // n0 already counted as exact; no duplicates.
        assert_eq!(ids(&pool), vec!["e0", "e1", "n0", "n1", "n2"]);
    }

    #[test]
    fn test_sparse_tier_falls_back_to_full_corpus() {
        let corpus = vec![
            doc("a", "T9"),
            doc("b", "T10"),
            doc("c", "nothing"),
            doc("d", "nothing"),
            doc("e", "nothing"),
            doc("f", "nothing"),
        ];
        let pool = filter_by_tier(Some(9), &corpus, 5);
        assert_eq!(pool.len(), corpus.len());
        assert_eq!(ids(&pool), vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_tier_one_has_no_zero_neighbour() {
        let corpus = vec![doc("a", "T1"), doc("b", "T0")];
        let pool = filter_by_tier(Some(1), &corpus, 1);
        assert_eq!(ids(&pool), vec!["a"]);
    }

    #[test]
    fn test_max_tier_does_not_overflow() {
        let corpus = vec![doc("a", "T9"), doc("b", "nothing")];
        let pool = filter_by_tier(Some(u32::MAX), &corpus, 5);
        assert_eq!(ids(&pool), vec!["a", "b"]);
    }
}

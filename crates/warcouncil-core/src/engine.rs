//! The retrieval engine: one shared pipeline behind two entry points.
//!
//! [`RetrievalEngine::retrieve`] serves the conversational advisor and
//! [`RetrievalEngine::retrieve_for_entities`] serves the battle simulator.
//! Both only build a [`SearchKey`]; the ranking itself is [`rank`], a pure
//! function of the corpus snapshot, the key and the query embedding.
//!
//! # Embedding failures
//!
//! When the query cannot be embedded (service error, or a vector whose
//! length differs from the corpus) and `degrade_to_keyword` is set, the
//! engine logs a warning and ranks by normalized keyword score instead.
//! Otherwise the call fails with [`RetrievalError::Embedding`].

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::corpus::{Corpus, CorpusHandle};
use crate::embedding::Embedder;
use crate::error::{Result, RetrievalError};
use crate::hybrid::{apply_intent_boost, merge_candidates, BoostLimits, Relevance};
use crate::mmr::{mmr_select, ADVISOR_LAMBDA, SIMULATOR_LAMBDA};
use crate::models::{DocKey, RankedDocument};
use crate::query::{Intent, QueryAnalysis};
use crate::similarity::{extract_keywords, keyword_rank, semantic_rank};
use crate::tier::{filter_by_tier, DEFAULT_MIN_POOL};

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RetrievalParams {
    /// Semantic candidates taken from the pool.
    pub semantic_k: usize,
    /// Keyword candidates taken from the pool.
    pub keyword_k: usize,
    /// Documents returned per advisor query.
    pub final_k: usize,
    /// MMR trade-off for advisor queries.
    pub advisor_lambda: f32,
    /// MMR trade-off for simulator lookups.
    pub simulator_lambda: f32,
    /// Minimum tier-filtered pool before widening.
    pub min_tier_pool: usize,
    pub boosts: BoostLimits,
    /// Documents returned per entity in [`RetrievalEngine::retrieve_for_entities`].
    pub entity_k: usize,
    /// Fall back to keyword-only ranking when embedding fails.
    pub degrade_to_keyword: bool,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            semantic_k: 7,
            keyword_k: 7,
            final_k: 5,
            advisor_lambda: ADVISOR_LAMBDA,
            simulator_lambda: SIMULATOR_LAMBDA,
            min_tier_pool: DEFAULT_MIN_POOL,
            boosts: BoostLimits::default(),
            entity_k: 3,
            degrade_to_keyword: true,
        }
    }
}

/// Everything the shared pipeline needs to know about one search.
#[derive(Debug, Clone)]
pub struct SearchKey<'q> {
    /// Text that is embedded and mined for keywords.
    pub text: String,
    pub tier: Option<u32>,
    pub intent: &'q Intent,
    /// Number of documents to select.
    pub k: usize,
    pub lambda: f32,
}

/// Run the ranking stages over one corpus snapshot.
///
/// `query_vec = None` ranks by keyword relevance only.
pub fn rank(
    corpus: &Corpus,
    key: &SearchKey<'_>,
    query_vec: Option<&[f32]>,
    params: &RetrievalParams,
) -> Vec<RankedDocument> {
    let docs = corpus.documents();
    let pool = filter_by_tier(key.tier, docs, params.min_tier_pool);

    let keywords = extract_keywords(&key.text);
    let keyword_hits = keyword_rank(&keywords, &pool, params.keyword_k);

    let (semantic, relevance) = match query_vec {
        Some(qv) => (
            semantic_rank(qv, &pool, params.semantic_k),
            Relevance::Semantic(qv),
        ),
        None => (
            Vec::new(),
            Relevance::Keyword {
                keywords: &keywords,
                max_score: keyword_hits.first().map(|(_, s)| *s).unwrap_or(0),
            },
        ),
    };

    debug!(
        pool = pool.len(),
        keywords = ?keywords,
        semantic = semantic.len(),
        keyword = keyword_hits.len(),
        "candidate sets"
    );

    let mut candidates = merge_candidates(semantic, keyword_hits, &relevance);
    let boosted = apply_intent_boost(&mut candidates, key.intent, docs, &relevance, params.boosts);
    if boosted > 0 {
        debug!(boosted, intent = %key.intent.kind(), "intent boost added candidates");
    }

    let selected = mmr_select(candidates, key.k, key.lambda);
    selected.into_iter().map(RankedDocument::from).collect()
}

/// Drop later entries whose `(id, category)` was already seen.
pub fn dedup_ranked(documents: Vec<RankedDocument>) -> Vec<RankedDocument> {
    let mut seen: HashSet<DocKey> = HashSet::with_capacity(documents.len());
    documents
        .into_iter()
        .filter(|d| seen.insert(d.key()))
        .collect()
}

/// Retrieval pipeline bound to a corpus handle and an embedding backend.
pub struct RetrievalEngine {
    corpus: Arc<CorpusHandle>,
    embedder: Arc<dyn Embedder>,
    params: RetrievalParams,
}

impl RetrievalEngine {
    pub fn new(corpus: Arc<CorpusHandle>, embedder: Arc<dyn Embedder>, params: RetrievalParams) -> Self {
        Self {
            corpus,
            embedder,
            params,
        }
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    pub fn corpus(&self) -> &Arc<CorpusHandle> {
        &self.corpus
    }

    /// Retrieve documents for a conversational query.
    pub async fn retrieve(&self, query: &str, analysis: &QueryAnalysis) -> Result<Vec<RankedDocument>> {
        let corpus = self.corpus.snapshot()?;
        if query.trim().is_empty() || corpus.is_empty() {
            return Ok(Vec::new());
        }

        let key = SearchKey {
            text: query.to_string(),
            tier: analysis.tier_level,
            intent: &analysis.intent,
            k: self.params.final_k,
            lambda: self.params.advisor_lambda,
        };
        self.run(&corpus, &key).await
    }

    /// Retrieve documents for each named entity of one kind.
    ///
    /// Results are concatenated in entity order and may repeat a document
    /// across entities; pass them through [`dedup_ranked`] before use.
    pub async fn retrieve_for_entities(
        &self,
        entity_names: &[String],
        entity_kind: &str,
    ) -> Result<Vec<RankedDocument>> {
        let corpus = self.corpus.snapshot()?;
        if corpus.is_empty() {
            return Ok(Vec::new());
        }

        let intent = Intent::General;
        let mut out = Vec::new();
        for name in entity_names.iter().filter(|n| !n.trim().is_empty()) {
            let key = SearchKey {
                text: format!("{} {}", name.trim(), entity_kind),
                tier: None,
                intent: &intent,
                k: self.params.entity_k,
                lambda: self.params.simulator_lambda,
            };
            let found = self.run(&corpus, &key).await?;
            debug!(entity = %name, kind = entity_kind, found = found.len(), "entity lookup");
            out.extend(found);
        }
        Ok(out)
    }

    async fn run(&self, corpus: &Corpus, key: &SearchKey<'_>) -> Result<Vec<RankedDocument>> {
        let query_vec = self.query_vector(&key.text, corpus.dims()).await?;
        Ok(rank(corpus, key, query_vec.as_deref(), &self.params))
    }

    async fn query_vector(&self, text: &str, dims: usize) -> Result<Option<Vec<f32>>> {
        let failure = match self.embedder.embed(text).await {
            Ok(v) if v.len() == dims => return Ok(Some(v)),
            Ok(v) => format!(
                "{} returned {} dimensions, corpus has {}",
                self.embedder.model_name(),
                v.len(),
                dims
            ),
            Err(e) => format!("{}: {:#}", self.embedder.model_name(), e),
        };

        if self.params.degrade_to_keyword {
            warn!(reason = %failure, "query embedding unavailable, using keyword-only retrieval");
            Ok(None)
        } else {
            Err(RetrievalError::Embedding(failure))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, DocumentMetadata};
    use crate::query::analyze_query;

    fn doc(id: &str, kind: &str, content: &str, embedding: Vec<f32>) -> Document {
        Document {
            id: id.to_string(),
            content: content.to_string(),
            metadata: DocumentMetadata {
                name: id.to_string(),
                kind: kind.to_string(),
                category: "stats".to_string(),
                url: None,
            },
            embedding,
        }
    }

    fn corpus() -> Corpus {
        Corpus::new(vec![
            doc("cannon", "defense", "Cannon is a ground defense", vec![1.0, 0.0]),
            doc("archer", "troop", "Archer is a ranged troop", vec![0.0, 1.0]),
            doc("wizard", "troop", "Wizard deals splash damage", vec![0.3, 0.9]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rank_respects_k() {
        let corpus = corpus();
        let intent = Intent::General;
        let key = SearchKey {
            text: "troop".to_string(),
            tier: None,
            intent: &intent,
            k: 2,
            lambda: 0.7,
        };
        let out = rank(&corpus, &key, Some(&[0.0, 1.0]), &RetrievalParams::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "archer");
    }

    #[test]
    fn test_rank_keyword_only() {
        let corpus = corpus();
        let analysis = analyze_query("splash wizard");
        let key = SearchKey {
            text: "splash wizard".to_string(),
            tier: None,
            intent: &analysis.intent,
            k: 5,
            lambda: 0.7,
        };
        let out = rank(&corpus, &key, None, &RetrievalParams::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "wizard");
        assert!((out[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(out[0].keyword_score, Some(4));
    }

    #[test]
    fn test_dedup_ranked() {
        let corpus = corpus();
        let a: RankedDocument = crate::models::Candidate {
            doc: &corpus.documents()[0],
            similarity: 0.5,
            keyword_score: None,
        }
        .into();
        let out = dedup_ranked(vec![a.clone(), a.clone(), a]);
        assert_eq!(out.len(), 1);
    }
}

//! Read-only document corpus and its loading abstraction.
//!
//! A [`Corpus`] is an immutable snapshot validated at construction: all
//! embeddings share one dimensionality and every `(id, category)` pair is
//! unique. [`CorpusHandle`] holds the current snapshot behind an `Arc`;
//! readers clone the `Arc` and never block each other, and a reload builds
//! a complete new snapshot before swapping the reference.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{Result, RetrievalError};
use crate::models::{DocKey, Document};

/// Supplies the full document list for a snapshot.
#[async_trait]
pub trait CorpusLoader: Send + Sync {
    /// Short description used in logs (e.g. a file path).
    fn describe(&self) -> String;

    async fn load(&self) -> anyhow::Result<Vec<Document>>;
}

/// Loader over documents already in memory.
pub struct StaticLoader {
    documents: Vec<Document>,
}

impl StaticLoader {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl CorpusLoader for StaticLoader {
    fn describe(&self) -> String {
        format!("in-memory ({} documents)", self.documents.len())
    }

    async fn load(&self) -> anyhow::Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

/// Summary counts for a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub documents: usize,
    pub dims: usize,
    pub fingerprint: String,
    pub loaded_at: String,
    pub by_type: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
}

/// An immutable, validated document snapshot.
#[derive(Debug)]
pub struct Corpus {
    documents: Vec<Document>,
    dims: usize,
    fingerprint: String,
    loaded_at: DateTime<Utc>,
}

impl Corpus {
    /// Validate and wrap `documents`.
    ///
    /// Later duplicates of an `(id, category)` pair are dropped with a
    /// warning. A mismatched embedding length is an error.
    pub fn new(documents: Vec<Document>) -> Result<Self> {
        let dims = documents.first().map(|d| d.embedding.len()).unwrap_or(0);

        let mut seen: HashSet<DocKey> = HashSet::with_capacity(documents.len());
        let mut kept = Vec::with_capacity(documents.len());
        for doc in documents {
            if doc.embedding.len() != dims {
                return Err(RetrievalError::CorpusUnavailable(format!(
                    "document {} ({}) has {} dimensions, expected {}",
                    doc.id,
                    doc.metadata.category,
                    doc.embedding.len(),
                    dims
                )));
            }
            if !seen.insert(doc.key()) {
                warn!(
                    id = %doc.id,
                    category = %doc.metadata.category,
                    "duplicate document dropped"
                );
                continue;
            }
            kept.push(doc);
        }

        let fingerprint = fingerprint(&kept);
        Ok(Self {
            documents: kept,
            dims,
            fingerprint,
            loaded_at: Utc::now(),
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Embedding dimensionality (`0` for an empty corpus).
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// SHA-256 over ids, categories and contents, in corpus order.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn stats(&self) -> CorpusStats {
        let mut by_type = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        for d in &self.documents {
            *by_type.entry(d.metadata.kind.clone()).or_insert(0) += 1;
            *by_category.entry(d.metadata.category.clone()).or_insert(0) += 1;
        }
        CorpusStats {
            documents: self.documents.len(),
            dims: self.dims,
            fingerprint: self.fingerprint.clone(),
            loaded_at: self.loaded_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            by_type,
            by_category,
        }
    }
}

fn fingerprint(documents: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for d in documents {
        hasher.update(d.id.as_bytes());
        hasher.update([0]);
        hasher.update(d.metadata.category.as_bytes());
        hasher.update([0]);
        hasher.update(d.content.as_bytes());
        hasher.update([b'\n']);
    }
    format!("{:x}", hasher.finalize())
}

/// Shared, swappable reference to the current corpus snapshot.
#[derive(Default)]
pub struct CorpusHandle {
    current: RwLock<Option<Arc<Corpus>>>,
}

impl CorpusHandle {
    /// A handle with no snapshot; retrieval fails until one is loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_corpus(corpus: Corpus) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(corpus))),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Result<Arc<Corpus>> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard
            .clone()
            .ok_or_else(|| RetrievalError::CorpusUnavailable("no corpus loaded".to_string()))
    }

    /// Replace the current snapshot.
    pub fn swap(&self, corpus: Corpus) -> Arc<Corpus> {
        let next = Arc::new(corpus);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(next.clone());
        next
    }

    /// Load a fresh snapshot and swap it in.
    ///
    /// On failure the previous snapshot, if any, stays in place.
    pub async fn reload(&self, loader: &dyn CorpusLoader) -> Result<Arc<Corpus>> {
        let documents = loader.load().await.map_err(|e| {
            RetrievalError::CorpusUnavailable(format!("{}: {:#}", loader.describe(), e))
        })?;
        let corpus = Corpus::new(documents)?;
        info!(
            source = %loader.describe(),
            documents = corpus.len(),
            dims = corpus.dims(),
            fingerprint = %corpus.fingerprint(),
            "corpus loaded"
        );
        Ok(self.swap(corpus))
    }
}

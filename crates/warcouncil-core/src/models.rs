//! Core data models used throughout War Council.
//!
//! These types represent the reference documents, the transient scored
//! candidates, and the ranked results that flow through the retrieval
//! pipeline.

use serde::{Deserialize, Serialize};

/// Descriptive metadata attached to every corpus document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Display name of the game entity (e.g. `"Inferno Tower"`).
    pub name: String,
    /// Coarse entity kind (e.g. `"troop"`, `"defense"`, `"spell"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Content facet (e.g. `"basic_info"`, `"stats"`, `"abilities"`).
    pub category: String,
    /// Page the content was scraped from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A unit of retrievable knowledge.
///
/// Documents are produced offline and never mutated after load. The same
/// `id` may appear under several categories; [`DocKey`] is the identity used
/// for deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn key(&self) -> DocKey {
        DocKey::new(&self.id, &self.metadata.category)
    }
}

/// The `(id, category)` identity of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocKey {
    pub id: String,
    pub category: String,
}

impl DocKey {
    pub fn new(id: &str, category: &str) -> Self {
        Self {
            id: id.to_string(),
            category: category.to_string(),
        }
    }
}

/// A corpus document with the scores attached during one retrieval call.
///
/// `similarity` is always populated by the time a candidate leaves the
/// hybrid retriever; `keyword_score` is set only when the keyword scorer
/// matched the document.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub doc: &'a Document,
    pub similarity: f32,
    pub keyword_score: Option<u32>,
}

impl<'a> Candidate<'a> {
    pub fn key(&self) -> DocKey {
        self.doc.key()
    }
}

/// A retrieval result handed to the context assembler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDocument {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub similarity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_score: Option<u32>,
}

impl RankedDocument {
    pub fn key(&self) -> DocKey {
        DocKey::new(&self.id, &self.metadata.category)
    }
}

impl From<Candidate<'_>> for RankedDocument {
    fn from(c: Candidate<'_>) -> Self {
        Self {
            id: c.doc.id.clone(),
            content: c.doc.content.clone(),
            metadata: c.doc.metadata.clone(),
            similarity: c.similarity,
            keyword_score: c.keyword_score,
        }
    }
}

//! Context assembly for the downstream generation call.
//!
//! Formatting only: documents keep the order the ranking stages produced,
//! relevance is reported as `round(similarity * 100)`, and excerpts are
//! truncated on a character boundary. Zero documents is a valid context.

use serde::Serialize;

use crate::models::RankedDocument;
use crate::query::QueryAnalysis;

/// Default excerpt length, in characters.
pub const DEFAULT_MAX_EXCERPT_CHARS: usize = 1200;

/// One document excerpt inside a [`RetrievalContext`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextDocument {
    /// 1-based position in the context.
    pub rank: usize,
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub relevance_pct: i32,
    pub excerpt: String,
}

/// Structured payload handed to the generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalContext {
    #[serde(flatten)]
    pub analysis: QueryAnalysis,
    pub documents: Vec<ContextDocument>,
}

/// Round a similarity to a whole percentage.
pub fn relevance_pct(similarity: f32) -> i32 {
    (similarity * 100.0).round() as i32
}

fn excerpt(content: &str, max_chars: usize) -> String {
    let trimmed = content.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", trimmed[..cut].trim_end()),
        None => trimmed.to_string(),
    }
}

/// Build a [`RetrievalContext`] from ranked documents and the query analysis.
pub fn assemble_context(
    documents: &[RankedDocument],
    analysis: &QueryAnalysis,
    max_excerpt_chars: usize,
) -> RetrievalContext {
    let documents = documents
        .iter()
        .enumerate()
        .map(|(i, d)| ContextDocument {
            rank: i + 1,
            id: d.id.clone(),
            name: d.metadata.name.clone(),
            kind: d.metadata.kind.clone(),
            category: d.metadata.category.clone(),
            url: d.metadata.url.clone(),
            relevance_pct: relevance_pct(d.similarity),
            excerpt: excerpt(&d.content, max_excerpt_chars),
        })
        .collect();

    RetrievalContext {
        analysis: analysis.clone(),
        documents,
    }
}

impl RetrievalContext {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Render as a plain-text block suitable for a generation prompt.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Intent: {}\n", self.analysis.kind()));
        if let Some(tier) = self.analysis.tier_level {
            out.push_str(&format!("Tier: {}\n", tier));
        }
        for (label, value) in self.analysis.intent.describe_params() {
            out.push_str(&format!("{}: {}\n", capitalize(label), value));
        }
        out.push('\n');

        if self.documents.is_empty() {
            out.push_str("No reference documents matched this request.\n");
            return out;
        }

        for d in &self.documents {
            out.push_str(&format!(
                "[{}] {} ({} / {}) - {}% relevant\n",
                d.rank, d.name, d.kind, d.category, d.relevance_pct
            ));
            if let Some(ref url) = d.url {
                out.push_str(&format!("Source: {}\n", url));
            }
            out.push_str(&d.excerpt);
            out.push_str("\n\n");
        }
        out
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

//! # War Council Core
//!
//! Retrieval and ranking logic for War Council: the document model, query
//! interpretation, similarity scoring, tier-scoped filtering, hybrid
//! merging, MMR diversification, and context assembly.
//!
//! This crate contains no tokio, HTTP, or filesystem I/O. Embedding and
//! corpus loading are reached through the [`embedding::Embedder`] and
//! [`corpus::CorpusLoader`] traits, which the application crate implements.
//!
//! ## Pipeline
//!
//! ```text
//! query ─▶ analyze_query ─▶ filter_by_tier ─▶ semantic + keyword ─▶ hybrid merge
//!                                                                      │
//!                               RetrievalContext ◀─ assemble ◀─ MMR ◀──┘
//! ```

pub mod context;
pub mod corpus;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod hybrid;
pub mod mmr;
pub mod models;
pub mod query;
pub mod similarity;
pub mod tier;

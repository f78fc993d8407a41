//! # War Council
//!
//! Application layer over [`warcouncil_core`]: TOML configuration, the
//! filesystem corpus loader, HTTP embedding providers, and the two
//! consumers of the retrieval engine.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Parse and validate `council.toml` |
//! | [`corpus_fs`] | Load the document corpus from JSON files |
//! | [`embedding`] | Disabled, OpenAI and Ollama query embedders |
//! | [`advisor`] | Conversational queries (`council ask`) |
//! | [`simulate`] | Battle scenario lookups (`council simulate`) |
//! | [`stats`] | Corpus summary (`council stats`) |

pub mod advisor;
pub mod config;
pub mod corpus_fs;
pub mod embedding;
pub mod simulate;
pub mod stats;

use anyhow::{bail, Result};
use std::sync::Arc;

use warcouncil_core::corpus::CorpusHandle;
use warcouncil_core::engine::RetrievalEngine;

use crate::config::Config;
use crate::corpus_fs::FsCorpusLoader;

/// Load the configured corpus into a fresh handle.
pub async fn load_corpus(config: &Config) -> Result<Arc<CorpusHandle>> {
    let loader = FsCorpusLoader::new(&config.corpus)?;
    let handle = Arc::new(CorpusHandle::empty());
    handle.reload(&loader).await?;
    Ok(handle)
}

/// Load the configured corpus and build a retrieval engine over it.
///
/// Fails when an enabled embedding provider is configured with a
/// dimensionality different from the corpus embeddings.
pub async fn open_engine(config: &Config) -> Result<RetrievalEngine> {
    let handle = load_corpus(config).await?;

    let corpus = handle.snapshot()?;
    if let Some(dims) = config.embedding.dims.filter(|_| config.embedding.is_enabled()) {
        if !corpus.is_empty() && dims != corpus.dims() {
            bail!(
                "embedding.dims is {} but corpus embeddings have {} dimensions",
                dims,
                corpus.dims()
            );
        }
    }

    let embedder = embedding::create_embedder(&config.embedding)?;
    Ok(RetrievalEngine::new(
        handle,
        embedder,
        config.retrieval.to_params(),
    ))
}

use thiserror::Error;

/// Failures that abort (or degrade) a retrieval call.
///
/// An empty result is not represented here: zero matching documents is a
/// valid outcome and is returned as an empty list.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("corpus unavailable: {0}")]
    CorpusUnavailable(String),

    #[error("embedding service failure: {0}")]
    Embedding(String),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

use thiserror::Error;

/// Failures of the scoring model. None of these mean "irrelevant"; callers map them to
/// an unavailable classification.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmbedError {
    #[error("embedder initialisation failed: {0}")]
    InitFailed(String),

    #[error("embedder used before initialisation")]
    NotInitialized,

    #[error("embedding failed: {0}")]
    EmbedFailed(String),

    #[error("embedder returned an invalid vector: {0}")]
    InvalidVector(String),
}

pub type Result<T> = std::result::Result<T, EmbedError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream timed out after {0} ms")]
    UpstreamTimeout(u64),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Corrupt index state: {0}")]
    CorruptIndexState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// Transient failures the caller may retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::UpstreamTimeout(_) | Error::EmbeddingUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error taxonomy for the transcription store.

use super::producer::ProducerError;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by [`TranscriptionStore`](super::TranscriptionStore) and
/// [`Sweeper`](super::Sweeper).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Input to `create` or `update` broke a policy. Nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No record exists under this id.
    #[error("transcription not found: {id}")]
    NotFound { id: String },

    /// Stored bytes did not decode into the expected shape.
    #[error("corrupt record at '{key}': {source}")]
    CorruptRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The transcription producer failed. Nothing was written.
    #[error(transparent)]
    Producer(#[from] ProducerError),

    /// Backend I/O failure, passed through unchanged.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

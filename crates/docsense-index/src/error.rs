//! Error types for the vector index

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Vector index errors
#[derive(Debug, Error)]
pub enum IndexError {
    /// Vector dimensionality differs from the index-wide dimensionality
    #[error("dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Batch insert rejected before anything was published
    #[error("invalid batch for document {document_id}: {message}")]
    InvalidBatch { document_id: Uuid, message: String },

    /// Document already has entries; remove it before re-inserting
    #[error("document {0} is already indexed")]
    DuplicateDocument(Uuid),

    /// Snapshot IO failure
    #[error("snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failure
    #[error("snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IndexError {
    pub fn invalid_batch(document_id: Uuid, message: impl Into<String>) -> Self {
        Self::InvalidBatch {
            document_id,
            message: message.into(),
        }
    }
}

//! Error types for the document analysis system

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Analyzer errors
#[derive(Debug, Error)]
pub enum Error {
    /// Client input rejected before any work was done
    #[error("Validation error: {0}")]
    Validation(String),

    /// Input was empty or blank where content is required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document exists but its pipeline has not completed yet
    #[error("Document {document_id} is not ready: status is {status}")]
    NotReady { document_id: Uuid, status: String },

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Job queue is at capacity; the upload was rolled back
    #[error("Processing queue is full, retry later")]
    QueueFull,

    /// A pipeline stage failed for one document
    #[error("Processing failed for document {document_id}: {message}")]
    Processing { document_id: Uuid, message: String },

    /// A collaborator model service failed
    #[error("Upstream service '{provider}' failed: {message}")]
    Upstream { provider: String, message: String },

    /// Vector index error
    #[error("Index error: {0}")]
    Index(#[from] docsense_index::IndexError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error classification used by the response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad client input, retrying the same request will not help
    InvalidInput,
    /// The referenced document does not exist
    NotFound,
    /// Transient condition, retry later
    RetryLater,
    /// A collaborator service is unavailable
    Unavailable,
    /// Everything else
    Internal,
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an empty-input error
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a processing error for one document's pipeline
    pub fn processing(document_id: Uuid, message: impl Into<String>) -> Self {
        Self::Processing {
            document_id,
            message: message.into(),
        }
    }

    /// Create an upstream service error
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Classify the error for the response envelope
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::EmptyInput(_) | Self::Config(_) => ErrorKind::InvalidInput,
            Self::DocumentNotFound(_) => ErrorKind::NotFound,
            Self::NotReady { .. } | Self::QueueFull => ErrorKind::RetryLater,
            Self::Upstream { .. } => ErrorKind::Unavailable,
            Self::Processing { .. } | Self::Index(_) | Self::Io(_) | Self::Json(_) => {
                ErrorKind::Internal
            }
        }
    }
}

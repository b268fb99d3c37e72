//! Response envelope and operation result types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, ErrorKind};
use crate::processing::JobStatus;

/// Uniform response envelope for every service operation
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded
    pub success: bool,
    /// Error classification, present only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Human-readable error message, present only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Payload, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying a payload
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error_kind: None,
            error: None,
            data: Some(data),
        }
    }

    /// Failure response classified by the error taxonomy
    pub fn from_error(error: &Error) -> Self {
        Self {
            success: false,
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
            data: None,
        }
    }

    /// Wrap an operation result in the envelope
    pub fn from_result(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::from_error(&e),
        }
    }
}

/// Immediate acknowledgement returned by upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub document_id: Uuid,
    pub filename: String,
    pub status: JobStatus,
}

/// Point-in-time view of a document's pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub document_id: Uuid,
    pub status: JobStatus,
    pub progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A grounded answer with its supporting evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub confidence: f32,
    /// IDs of the chunks the answer was drawn from, never empty
    pub supporting_chunks: Vec<Uuid>,
}

/// Outcome of asking a question against a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AskOutcome {
    /// Answer passed the confidence gate
    Grounded(Answer),
    /// No candidate cleared the gate; raw model text is withheld
    NotGrounded { best_confidence: f32 },
}

impl AskOutcome {
    pub fn is_grounded(&self) -> bool {
        matches!(self, Self::Grounded(_))
    }
}

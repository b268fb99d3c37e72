//! docsense-rag: asynchronous document ingestion and retrieval-augmented
//! question answering
//!
//! Uploaded documents flow through a background pipeline (extract, chunk,
//! embed, index) tracked by per-document job records. Questions are answered
//! by scoped retrieval plus a confidence gate: answers that cannot be
//! grounded in the document are withheld rather than fabricated.
//!
//! The [`service::DocumentService`] facade is the entry point; model
//! collaborators (extraction, embedding, answering, summarization) are
//! injected behind the traits in [`providers`].

pub mod config;
pub mod error;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod service;
pub mod summary;
pub mod types;

pub use config::AnalyzerConfig;
pub use error::{Error, ErrorKind, Result};
pub use processing::{JobRecord, JobStatus};
pub use service::{DocumentService, Providers};
pub use summary::{DocumentSummary, SectionContent};
pub use types::{Answer, ApiResponse, AskOutcome, Document, StatusReport, UploadReceipt};

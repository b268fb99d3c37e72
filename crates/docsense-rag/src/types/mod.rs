//! Core data types

pub mod document;
pub mod response;

pub use document::{Chunk, Document};
pub use response::{Answer, ApiResponse, AskOutcome, StatusReport, UploadReceipt};

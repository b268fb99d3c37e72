//! Collaborator provider traits and their deterministic offline
//! implementations
//!
//! Raw text extraction, embedding, question answering, and summarization are
//! external model services behind these seams. The offline implementations
//! are deterministic and power tests and model-free deployments.

pub mod answering;
pub mod embedding;
pub mod extractor;
pub mod summarizer;

pub use answering::{AnswerProvider, LexicalAnswerer, ScoredAnswer};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use extractor::{ExtractedText, PlainTextExtractor, TextExtractor};
pub use summarizer::{LeadSummarizer, SummaryProvider};

//! Document ingestion: chunking

pub mod chunker;

pub use chunker::{ChunkSpan, TextChunker};

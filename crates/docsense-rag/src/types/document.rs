//! Document and chunk types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use docsense_index::{IndexEntry, SearchHit};

/// An uploaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// Extracted text, populated when the pipeline completes
    #[serde(default)]
    pub text: String,
    /// Page count reported by the extractor
    pub page_count: Option<u32>,
    /// Number of chunks produced for this document
    pub total_chunks: u32,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new(filename: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            text: String::new(),
            page_count: None,
            total_chunks: 0,
            uploaded_at: Utc::now(),
        }
    }
}

/// A chunk of document text with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Owning document ID
    pub document_id: Uuid,
    /// Position of the chunk within its document (0-based, contiguous)
    pub chunk_index: u32,
    /// Chunk text, a contiguous slice of the extracted document text
    pub content: String,
    /// Byte offset of the chunk start in the extracted text
    pub char_start: usize,
    /// Byte offset one past the chunk end in the extracted text
    pub char_end: usize,
    /// Embedding vector, empty until the embedding stage runs
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn new(
        document_id: Uuid,
        chunk_index: u32,
        content: String,
        char_start: usize,
        char_end: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            chunk_index,
            content,
            char_start,
            char_end,
            embedding: Vec::new(),
        }
    }

    /// Convert to an index entry, carrying content and offsets in metadata so
    /// search hits round-trip without a separate chunk store.
    pub fn to_index_entry(&self) -> IndexEntry {
        let mut metadata = HashMap::new();
        metadata.insert("content".to_string(), json!(self.content));
        metadata.insert("char_start".to_string(), json!(self.char_start));
        metadata.insert("char_end".to_string(), json!(self.char_end));
        IndexEntry::new(self.id, self.document_id, self.chunk_index, self.embedding.clone())
            .with_metadata(metadata)
    }

    /// Recover the chunk text from a search hit's metadata
    pub fn content_of_hit(hit: &SearchHit) -> Option<&str> {
        hit.metadata.get("content").and_then(|v| v.as_str())
    }
}

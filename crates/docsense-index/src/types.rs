//! Entry and search result types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single chunk embedding stored in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Owning document ID
    pub document_id: Uuid,
    /// Position of the chunk within its document (0-based, contiguous)
    pub chunk_index: u32,
    /// Embedding vector
    pub vector: Vec<f32>,
    /// Opaque metadata carried alongside the vector (chunk text, offsets)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl IndexEntry {
    pub fn new(chunk_id: Uuid, document_id: Uuid, chunk_index: u32, vector: Vec<f32>) -> Self {
        Self {
            chunk_id,
            document_id,
            chunk_index,
            vector,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A search match with its similarity score
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: u32,
    /// Similarity score, higher is more similar
    pub similarity: f32,
    pub metadata: HashMap<String, serde_json::Value>,
}

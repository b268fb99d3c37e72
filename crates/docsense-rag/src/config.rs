//! Configuration for the document analyzer

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main analyzer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval and answer-gating configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Background processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Summary structuring configuration
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in bytes
    pub chunk_size: usize,
    /// Overlap carried from the end of one chunk into the next, in bytes
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of candidate chunks retrieved per question
    pub top_k: usize,
    /// Minimum answer confidence; below this the outcome is not grounded
    pub confidence_threshold: f32,
    /// Maximum context length handed to the answer provider, in bytes
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            confidence_threshold: 0.30,
            max_context_chars: 2000,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding dimensionality expected from the provider
    pub dimensions: usize,
    /// Number of chunks embedded concurrently per document
    pub parallel_embeddings: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 256,
            parallel_embeddings: 4,
        }
    }
}

/// Background processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of documents processed concurrently (default: CPU count, max 4)
    pub worker_count: Option<usize>,
    /// Bounded job queue capacity; a full queue rejects uploads
    pub queue_capacity: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            queue_capacity: 64,
        }
    }
}

impl ProcessingConfig {
    /// Resolve the worker count, auto-detecting from CPU count when unset
    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count
            .unwrap_or_else(|| num_cpus::get().min(4))
            .max(1)
    }
}

/// Summary structuring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Maximum text length handed to the summary provider in one call, in bytes
    pub max_input_chars: usize,
    /// Maximum number of groups summarized for very long documents
    pub max_groups: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 4000,
            max_groups: 5,
        }
    }
}

impl AnalyzerConfig {
    /// Validate the configuration, rejecting values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than zero"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("top_k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.retrieval.confidence_threshold) {
            return Err(Error::config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.retrieval.confidence_threshold
            )));
        }
        if self.retrieval.max_context_chars == 0 {
            return Err(Error::config("max_context_chars must be greater than zero"));
        }
        if self.embedding.dimensions == 0 {
            return Err(Error::config("embedding dimensions must be greater than zero"));
        }
        if self.embedding.parallel_embeddings == 0 {
            return Err(Error::config("parallel_embeddings must be at least 1"));
        }
        if self.processing.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be at least 1"));
        }
        if self.summary.max_input_chars == 0 {
            return Err(Error::config("summary max_input_chars must be greater than zero"));
        }
        if self.summary.max_groups == 0 {
            return Err(Error::config("summary max_groups must be at least 1"));
        }
        Ok(())
    }
}

//! The vector index: per-document atomic inserts, scoped search, snapshots

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::distance::DistanceMetric;
use crate::error::{IndexError, Result};
use crate::types::{IndexEntry, SearchHit};

/// In-memory nearest-neighbor index over chunk embeddings.
///
/// Entries are grouped by document. A document's batch becomes visible to
/// `search` in a single write-lock section, so concurrent readers see either
/// all of a document's chunks or none of them. Dimensionality is fixed by the
/// first inserted batch and enforced for the life of the index.
pub struct VectorIndex {
    metric: DistanceMetric,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    dimensions: Option<usize>,
    documents: HashMap<Uuid, Vec<IndexEntry>>,
    total: usize,
}

/// On-disk snapshot format
#[derive(Serialize, Deserialize)]
struct Snapshot {
    metric: DistanceMetric,
    dimensions: Option<usize>,
    documents: HashMap<Uuid, Vec<IndexEntry>>,
}

impl VectorIndex {
    /// Create an empty index
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Insert all chunk embeddings for one document as a single atomic batch.
    ///
    /// The batch is validated in full (dimensionality, contiguous ordered
    /// chunk indices, no existing entries for the document) before anything
    /// is published. On error the index is unchanged.
    pub fn insert_document(&self, document_id: Uuid, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.is_empty() {
            return Err(IndexError::invalid_batch(document_id, "empty batch"));
        }

        for (i, entry) in entries.iter().enumerate() {
            if entry.document_id != document_id {
                return Err(IndexError::invalid_batch(
                    document_id,
                    format!("entry {} belongs to document {}", i, entry.document_id),
                ));
            }
            if entry.chunk_index != i as u32 {
                return Err(IndexError::invalid_batch(
                    document_id,
                    format!("chunk indices must be contiguous from 0, got {} at position {}", entry.chunk_index, i),
                ));
            }
        }

        let batch_dims = entries[0].vector.len();
        if batch_dims == 0 {
            return Err(IndexError::invalid_batch(document_id, "zero-dimensional vectors"));
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != batch_dims) {
            return Err(IndexError::DimensionMismatch {
                expected: batch_dims,
                actual: bad.vector.len(),
            });
        }

        let mut inner = self.inner.write();
        if let Some(expected) = inner.dimensions {
            if batch_dims != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: batch_dims,
                });
            }
        }
        if inner.documents.contains_key(&document_id) {
            return Err(IndexError::DuplicateDocument(document_id));
        }

        inner.dimensions = Some(batch_dims);
        inner.total += entries.len();
        let count = entries.len();
        inner.documents.insert(document_id, entries);
        drop(inner);

        tracing::debug!(%document_id, chunks = count, "indexed document batch");
        Ok(())
    }

    /// Find the `k` nearest chunks to `query`, optionally scoped to one
    /// document. Results are ordered by similarity descending; ties break on
    /// ascending chunk index, then document id, so ranking is deterministic.
    ///
    /// Searching an empty index returns an empty result set, and `k` larger
    /// than the number of stored entries returns everything available.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        document_filter: Option<Uuid>,
    ) -> Result<Vec<SearchHit>> {
        let inner = self.inner.read();

        let Some(dims) = inner.dimensions else {
            return Ok(Vec::new());
        };
        if query.len() != dims {
            return Err(IndexError::DimensionMismatch {
                expected: dims,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = Vec::new();
        for (doc_id, entries) in inner.documents.iter() {
            if let Some(filter) = document_filter {
                if *doc_id != filter {
                    continue;
                }
            }
            for entry in entries {
                hits.push(SearchHit {
                    chunk_id: entry.chunk_id,
                    document_id: entry.document_id,
                    chunk_index: entry.chunk_index,
                    similarity: self.metric.similarity(query, &entry.vector),
                    metadata: entry.metadata.clone(),
                });
            }
        }
        drop(inner);

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk_index.cmp(&b.chunk_index))
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Remove every entry for a document. Returns how many were removed.
    pub fn remove(&self, document_id: Uuid) -> usize {
        let mut inner = self.inner.write();
        let removed = inner
            .documents
            .remove(&document_id)
            .map(|e| e.len())
            .unwrap_or(0);
        inner.total -= removed;
        removed
    }

    /// Total number of stored entries
    pub fn len(&self) -> usize {
        self.inner.read().total
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries for one document
    pub fn document_len(&self, document_id: Uuid) -> usize {
        self.inner
            .read()
            .documents
            .get(&document_id)
            .map(|e| e.len())
            .unwrap_or(0)
    }

    pub fn contains_document(&self, document_id: Uuid) -> bool {
        self.inner.read().documents.contains_key(&document_id)
    }

    /// IDs of all indexed documents
    pub fn document_ids(&self) -> Vec<Uuid> {
        self.inner.read().documents.keys().copied().collect()
    }

    /// Dimensionality fixed by the first insert, if any
    pub fn dimensions(&self) -> Option<usize> {
        self.inner.read().dimensions
    }

    /// Write a JSON snapshot of the whole index to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let inner = self.inner.read();
        let snapshot = Snapshot {
            metric: self.metric,
            dimensions: inner.dimensions,
            documents: inner.documents.clone(),
        };
        drop(inner);

        let json = serde_json::to_string(&snapshot)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "saved index snapshot");
        Ok(())
    }

    /// Rebuild an index from a snapshot written by [`VectorIndex::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&json)?;
        let total = snapshot.documents.values().map(|e| e.len()).sum();
        tracing::info!(path = %path.display(), entries = total, "loaded index snapshot");
        Ok(Self {
            metric: snapshot.metric,
            inner: RwLock::new(Inner {
                dimensions: snapshot.dimensions,
                documents: snapshot.documents,
                total,
            }),
        })
    }
}

//! Question answering with retrieval and confidence gating

use std::sync::Arc;

use docsense_index::VectorIndex;
use uuid::Uuid;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::processing::{JobStatus, JobTracker};
use crate::providers::{AnswerProvider, EmbeddingProvider};
use crate::types::document::Chunk;
use crate::types::{Answer, AskOutcome};

/// Retrieval-augmented answering over completed documents.
///
/// Every grounded answer passes the confidence gate; below the threshold the
/// caller gets an explicit not-grounded outcome instead of unvetted text.
pub struct AnswerEngine {
    index: Arc<VectorIndex>,
    tracker: Arc<JobTracker>,
    embedder: Arc<dyn EmbeddingProvider>,
    answerer: Arc<dyn AnswerProvider>,
    config: RetrievalConfig,
}

impl AnswerEngine {
    pub fn new(
        index: Arc<VectorIndex>,
        tracker: Arc<JobTracker>,
        embedder: Arc<dyn EmbeddingProvider>,
        answerer: Arc<dyn AnswerProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            tracker,
            embedder,
            answerer,
            config,
        }
    }

    /// Answer a question against one document.
    ///
    /// The question is validated before any model call; the document must
    /// have a completed job. Candidates are scored individually and the best
    /// one must clear the confidence threshold to be returned.
    pub async fn ask(&self, document_id: Uuid, question: &str) -> Result<AskOutcome> {
        if question.trim().is_empty() {
            return Err(Error::empty_input("question must not be blank"));
        }

        let record = self
            .tracker
            .snapshot(document_id)
            .ok_or(Error::DocumentNotFound(document_id))?;
        if record.status != JobStatus::Completed {
            return Err(Error::NotReady {
                document_id,
                status: record.status.to_string(),
            });
        }

        let query = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| Error::upstream(self.embedder.name(), e.to_string()))?;

        let hits = self
            .index
            .search(&query, self.config.top_k, Some(document_id))?;
        if hits.is_empty() {
            return Ok(AskOutcome::NotGrounded {
                best_confidence: 0.0,
            });
        }

        let mut best: Option<(f32, u32, Uuid, String)> = None;
        let mut scored_any = false;
        for hit in &hits {
            let Some(content) = Chunk::content_of_hit(hit) else {
                tracing::warn!(chunk_id = %hit.chunk_id, "hit carries no content, skipping");
                continue;
            };
            let context = truncate_context(content, self.config.max_context_chars);

            match self.answerer.answer(question, context).await {
                Ok(scored) => {
                    scored_any = true;
                    let better = match &best {
                        None => true,
                        // Ties go to the earlier chunk in document order.
                        Some((conf, index, _, _)) => {
                            scored.confidence > *conf
                                || (scored.confidence == *conf && hit.chunk_index < *index)
                        }
                    };
                    if better {
                        best = Some((scored.confidence, hit.chunk_index, hit.chunk_id, scored.text));
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        chunk_id = %hit.chunk_id,
                        "answer scoring failed for candidate: {}", e
                    );
                }
            }
        }

        if !scored_any {
            return Err(Error::upstream(
                self.answerer.name(),
                "every candidate failed to score",
            ));
        }
        let (confidence, _, chunk_id, text) = best.unwrap_or((0.0, 0, Uuid::nil(), String::new()));

        if confidence >= self.config.confidence_threshold {
            tracing::debug!(%document_id, confidence, "answer passed confidence gate");
            Ok(AskOutcome::Grounded(Answer {
                text,
                confidence,
                supporting_chunks: vec![chunk_id],
            }))
        } else {
            tracing::debug!(%document_id, confidence, "answer withheld below threshold");
            Ok(AskOutcome::NotGrounded {
                best_confidence: confidence,
            })
        }
    }
}

/// Cut `text` to at most `max` bytes on a char boundary
fn truncate_context(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

//! The document service facade
//!
//! Owns the index, tracker, document registry, collaborator providers, and
//! the job queue sender. Constructed once at startup with a validated config
//! and cloned into the worker pool; there are no globals.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use docsense_index::{DistanceMetric, VectorIndex};

use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::processing::{IngestWorker, JobStatus, JobTracker, ProcessingJob};
use crate::providers::{
    AnswerProvider, EmbeddingProvider, HashingEmbedder, LeadSummarizer, LexicalAnswerer,
    PlainTextExtractor, SummaryProvider, TextExtractor,
};
use crate::retrieval::AnswerEngine;
use crate::summary::{DocumentSummary, SummaryBuilder};
use crate::types::{AskOutcome, Document, StatusReport, UploadReceipt};

const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "text"];

const INDEX_SNAPSHOT: &str = "index.json";
const JOBS_SNAPSHOT: &str = "jobs.json";
const DOCUMENTS_SNAPSHOT: &str = "documents.json";

/// Collaborator providers injected into the service
pub struct Providers {
    pub extractor: Arc<dyn TextExtractor>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub answerer: Arc<dyn AnswerProvider>,
    pub summarizer: Arc<dyn SummaryProvider>,
}

impl Providers {
    /// Deterministic offline providers, sized from the config
    pub fn offline(config: &AnalyzerConfig) -> Self {
        Self {
            extractor: Arc::new(PlainTextExtractor),
            embedder: Arc::new(HashingEmbedder::new(config.embedding.dimensions)),
            answerer: Arc::new(LexicalAnswerer),
            summarizer: Arc::new(LeadSummarizer::new(config.summary.max_input_chars, 3)),
        }
    }
}

/// Handle to the running document analyzer. Cheap to clone.
#[derive(Clone)]
pub struct DocumentService {
    inner: Arc<Inner>,
}

struct Inner {
    config: AnalyzerConfig,
    index: Arc<VectorIndex>,
    tracker: Arc<JobTracker>,
    documents: DashMap<Uuid, Document>,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    engine: AnswerEngine,
    summary: SummaryBuilder,
    /// None once intake is closed; uploads are rejected from then on
    sender: Mutex<Option<mpsc::Sender<ProcessingJob>>>,
}

impl DocumentService {
    /// Start a fresh service and its ingest worker on the current runtime.
    pub fn new(config: AnalyzerConfig, providers: Providers) -> Result<Self> {
        Self::build(
            config,
            providers,
            Arc::new(VectorIndex::new(DistanceMetric::default())),
            Arc::new(JobTracker::new()),
            DashMap::new(),
        )
    }

    /// Start a service from state previously written by [`save_state`].
    ///
    /// Missing snapshot files start their component empty. Jobs that were in
    /// flight when the state was saved come back as failed.
    ///
    /// [`save_state`]: DocumentService::save_state
    pub fn load_state(config: AnalyzerConfig, providers: Providers, dir: &Path) -> Result<Self> {
        let index_path = dir.join(INDEX_SNAPSHOT);
        let index = if index_path.exists() {
            Arc::new(VectorIndex::load(&index_path)?)
        } else {
            Arc::new(VectorIndex::new(DistanceMetric::default()))
        };

        let jobs_path = dir.join(JOBS_SNAPSHOT);
        let tracker = if jobs_path.exists() {
            Arc::new(JobTracker::load(&jobs_path)?)
        } else {
            Arc::new(JobTracker::new())
        };

        let documents = DashMap::new();
        let documents_path = dir.join(DOCUMENTS_SNAPSHOT);
        if documents_path.exists() {
            let json = std::fs::read_to_string(&documents_path)?;
            let restored: HashMap<Uuid, Document> = serde_json::from_str(&json)?;
            for (id, doc) in restored {
                documents.insert(id, doc);
            }
        }

        tracing::info!(dir = %dir.display(), "restored analyzer state");
        Self::build(config, providers, index, tracker, documents)
    }

    fn build(
        config: AnalyzerConfig,
        providers: Providers,
        index: Arc<VectorIndex>,
        tracker: Arc<JobTracker>,
        documents: DashMap<Uuid, Document>,
    ) -> Result<Self> {
        config.validate()?;

        let engine = AnswerEngine::new(
            index.clone(),
            tracker.clone(),
            providers.embedder.clone(),
            providers.answerer.clone(),
            config.retrieval.clone(),
        );
        let summary = SummaryBuilder::new(providers.summarizer.clone(), config.summary.clone())?;

        let (sender, receiver) = mpsc::channel(config.processing.queue_capacity);
        let service = Self {
            inner: Arc::new(Inner {
                config,
                index,
                tracker,
                documents,
                extractor: providers.extractor,
                embedder: providers.embedder,
                engine,
                summary,
                sender: Mutex::new(Some(sender)),
            }),
        };

        tokio::spawn(IngestWorker::new(service.clone()).run(receiver));
        Ok(service)
    }

    /// Accept an uploaded file and queue it for processing.
    ///
    /// Returns immediately with a queued receipt. Every upload is an
    /// independent document; re-uploading a filename never replaces an
    /// earlier document.
    pub fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadReceipt> {
        if bytes.is_empty() {
            return Err(Error::validation("uploaded file is empty"));
        }
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::validation(format!(
                "unsupported file type '{}', expected one of: {}",
                filename,
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let document = Document::new(filename.to_string());
        let document_id = document.id;
        self.inner.documents.insert(document_id, document);
        self.inner.tracker.create(document_id);

        let job = ProcessingJob {
            document_id,
            filename: filename.to_string(),
            bytes,
        };

        let guard = self.inner.sender.lock();
        let send_result = match guard.as_ref() {
            Some(sender) => sender.try_send(job).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => Error::QueueFull,
                mpsc::error::TrySendError::Closed(_) => {
                    Error::validation("document intake is closed")
                }
            }),
            None => Err(Error::validation("document intake is closed")),
        };
        drop(guard);

        if let Err(e) = send_result {
            // Roll back so a rejected upload leaves no trace.
            self.inner.documents.remove(&document_id);
            self.inner.tracker.remove(document_id);
            return Err(e);
        }

        tracing::info!("[{}] Upload accepted as document {}", filename, document_id);
        Ok(UploadReceipt {
            document_id,
            filename: filename.to_string(),
            status: JobStatus::Queued,
        })
    }

    /// Instantaneous view of a document's pipeline
    pub fn status(&self, document_id: Uuid) -> Result<StatusReport> {
        let record = self
            .inner
            .tracker
            .snapshot(document_id)
            .ok_or(Error::DocumentNotFound(document_id))?;
        Ok(StatusReport {
            document_id,
            status: record.status,
            progress_percent: record.progress,
            error: record.error,
        })
    }

    /// Answer a question against a completed document
    pub async fn ask(&self, document_id: Uuid, question: &str) -> Result<AskOutcome> {
        self.inner.engine.ask(document_id, question).await
    }

    /// Build the structured summary of a completed document
    pub async fn summary(&self, document_id: Uuid) -> Result<DocumentSummary> {
        let record = self
            .inner
            .tracker
            .snapshot(document_id)
            .ok_or(Error::DocumentNotFound(document_id))?;
        if record.status != JobStatus::Completed {
            return Err(Error::NotReady {
                document_id,
                status: record.status.to_string(),
            });
        }

        let text = self
            .inner
            .documents
            .get(&document_id)
            .map(|d| d.text.clone())
            .ok_or(Error::DocumentNotFound(document_id))?;
        self.inner.summary.build(&text).await
    }

    /// Delete a document, its index entries, and its job record together.
    /// Returns the number of index entries removed.
    pub fn remove(&self, document_id: Uuid) -> Result<usize> {
        let doc = self.inner.documents.remove(&document_id);
        let job = self.inner.tracker.remove(document_id);
        if doc.is_none() && job.is_none() {
            return Err(Error::DocumentNotFound(document_id));
        }
        let removed = self.inner.index.remove(document_id);
        tracing::info!(%document_id, entries = removed, "removed document");
        Ok(removed)
    }

    /// Request cooperative cancellation of a document's pipeline. Returns
    /// whether the flag was set; terminal jobs are unaffected.
    pub fn cancel(&self, document_id: Uuid) -> Result<bool> {
        if self.inner.tracker.snapshot(document_id).is_none() {
            return Err(Error::DocumentNotFound(document_id));
        }
        Ok(self.inner.tracker.request_cancel(document_id))
    }

    /// All known documents, newest first
    pub fn list_documents(&self) -> Vec<Document> {
        let mut documents: Vec<Document> = self
            .inner
            .documents
            .iter()
            .map(|d| d.value().clone())
            .collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        documents
    }

    /// Persist index, job records, and the document registry to `dir`.
    pub fn save_state(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        self.inner.index.save(&dir.join(INDEX_SNAPSHOT))?;
        self.inner.tracker.save(&dir.join(JOBS_SNAPSHOT))?;

        let documents: HashMap<Uuid, Document> = self
            .inner
            .documents
            .iter()
            .map(|d| (*d.key(), d.value().clone()))
            .collect();
        let json = serde_json::to_string(&documents)?;
        std::fs::write(dir.join(DOCUMENTS_SNAPSHOT), json)?;

        tracing::info!(dir = %dir.display(), "saved analyzer state");
        Ok(())
    }

    /// Stop accepting uploads. In-flight jobs keep running; the worker pool
    /// exits once the queue drains.
    pub fn close_intake(&self) {
        self.inner.sender.lock().take();
        tracing::info!("document intake closed");
    }

    pub(crate) fn config(&self) -> &AnalyzerConfig {
        &self.inner.config
    }

    pub(crate) fn index(&self) -> &VectorIndex {
        &self.inner.index
    }

    pub(crate) fn tracker(&self) -> &JobTracker {
        &self.inner.tracker
    }

    pub(crate) fn documents(&self) -> &DashMap<Uuid, Document> {
        &self.inner.documents
    }

    pub(crate) fn extractor(&self) -> Arc<dyn TextExtractor> {
        self.inner.extractor.clone()
    }

    pub(crate) fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        self.inner.embedder.clone()
    }
}

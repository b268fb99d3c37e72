//! Background worker pool driving the ingestion pipeline

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::TextChunker;
use crate::service::DocumentService;
use crate::types::Chunk;

/// A queued ingestion job: the uploaded payload plus its document identity
pub struct ProcessingJob {
    pub document_id: Uuid,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Worker pool consuming the bounded job queue.
///
/// A dispatcher task pulls jobs and spawns one pipeline per document; a
/// semaphore caps concurrent pipelines at the configured worker count.
/// Stages within a document run strictly sequentially; documents are
/// independent and complete in no particular order.
pub struct IngestWorker {
    service: DocumentService,
}

impl IngestWorker {
    pub fn new(service: DocumentService) -> Self {
        Self { service }
    }

    /// Consume jobs until the queue closes
    pub async fn run(self, mut receiver: mpsc::Receiver<ProcessingJob>) {
        let worker_count = self.service.config().processing.resolved_worker_count();
        tracing::info!("Ingest worker started: {} parallel documents", worker_count);

        let semaphore = Arc::new(Semaphore::new(worker_count));
        loop {
            // Take a permit before pulling a job so the queue keeps exerting
            // backpressure while every worker slot is busy.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let Some(job) = receiver.recv().await else {
                break;
            };

            let service = self.service.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let document_id = job.document_id;
                let filename = job.filename.clone();

                if let Err(e) = process_document(&service, job).await {
                    let reason = match &e {
                        Error::Processing { message, .. } => message.clone(),
                        other => other.to_string(),
                    };
                    tracing::error!("[{}] Pipeline failed: {}", filename, reason);
                    service.tracker().fail(document_id, reason);
                }
            });
        }

        tracing::info!("Ingest worker stopped: queue closed");
    }
}

fn check_cancelled(service: &DocumentService, document_id: Uuid) -> Result<()> {
    if service.tracker().cancel_requested(document_id) {
        return Err(Error::processing(document_id, "cancelled"));
    }
    Ok(())
}

/// Run one document through extract, chunk, embed, and index.
///
/// Progress checkpoints: claim 5, extracted 25, chunked 40, embedding 40-85,
/// indexed 95, completed 100. The cancel flag is observed at every stage
/// boundary. Nothing is inserted into the index unless every chunk embedded.
async fn process_document(service: &DocumentService, job: ProcessingJob) -> Result<()> {
    let ProcessingJob {
        document_id,
        filename,
        bytes,
    } = job;
    let tracker = service.tracker();
    let config = service.config();

    if !tracker.claim(document_id) {
        tracing::warn!("[{}] Job was not claimable, skipping", filename);
        return Ok(());
    }
    tracker.set_progress(document_id, 5);
    check_cancelled(service, document_id)?;

    tracing::info!("[{}] Extracting text ({} bytes)...", filename, bytes.len());
    let extracted = service
        .extractor()
        .extract(&filename, &bytes)
        .await
        .map_err(|e| Error::processing(document_id, format!("text extraction failed: {}", e)))?;
    tracker.set_progress(document_id, 25);
    check_cancelled(service, document_id)?;

    tracing::info!("[{}] Creating chunks...", filename);
    let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
    let spans = chunker
        .chunk(&extracted.text)
        .map_err(|e| Error::processing(document_id, format!("chunking failed: {}", e)))?;
    let mut chunks: Vec<Chunk> = spans
        .into_iter()
        .map(|s| Chunk::new(document_id, s.index, s.content, s.start, s.end))
        .collect();
    let total_chunks = chunks.len();
    tracker.set_progress(document_id, 40);
    check_cancelled(service, document_id)?;

    tracing::info!(
        "[{}] Created {} chunks, generating embeddings...",
        filename,
        total_chunks
    );
    let embedder = service.embedder();
    let batch_size = config.embedding.parallel_embeddings.max(1);
    let mut embedded = 0usize;
    for batch in chunks.chunks_mut(batch_size) {
        check_cancelled(service, document_id)?;

        let futures: Vec<_> = batch.iter().map(|c| embedder.embed(&c.content)).collect();
        let results = join_all(futures).await;
        for (chunk, result) in batch.iter_mut().zip(results) {
            // A single failed embedding fails the whole document; partial
            // vectors never reach the index.
            chunk.embedding = result.map_err(|e| {
                Error::processing(
                    document_id,
                    format!("embedding failed for chunk {}: {}", chunk.chunk_index, e),
                )
            })?;
        }

        embedded += batch.len();
        let percent = 40 + (45 * embedded / total_chunks) as u8;
        tracker.set_progress(document_id, percent);
    }
    check_cancelled(service, document_id)?;

    tracing::info!("[{}] Indexing {} chunks...", filename, total_chunks);
    let entries = chunks.iter().map(Chunk::to_index_entry).collect();
    service.index().insert_document(document_id, entries)?;
    tracker.set_progress(document_id, 95);

    // Finalize the document record. If it vanished (removed mid-flight),
    // take the freshly inserted entries back out.
    match service.documents().get_mut(&document_id) {
        Some(mut doc) => {
            doc.text = extracted.text;
            doc.page_count = Some(extracted.page_count);
            doc.total_chunks = total_chunks as u32;
        }
        None => {
            service.index().remove(document_id);
            return Err(Error::processing(document_id, "document removed during processing"));
        }
    }

    tracker.complete(document_id);
    tracing::info!(
        "[{}] COMPLETE: {} pages, {} chunks indexed",
        filename,
        extracted.page_count,
        total_chunks
    );
    Ok(())
}

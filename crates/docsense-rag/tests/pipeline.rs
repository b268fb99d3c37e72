//! End-to-end pipeline tests with deterministic offline providers

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use uuid::Uuid;

use docsense_rag::error::{Error, ErrorKind, Result};
use docsense_rag::providers::{
    EmbeddingProvider, ExtractedText, PlainTextExtractor, TextExtractor,
};
use docsense_rag::{
    AnalyzerConfig, ApiResponse, AskOutcome, DocumentService, JobStatus, Providers, StatusReport,
};

const REPORT: &str = "Revenue grew 25% in Q4. Net profit margin was 15%.";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn small_chunk_config() -> AnalyzerConfig {
    let mut config = AnalyzerConfig::default();
    config.chunking.chunk_size = 40;
    config.chunking.chunk_overlap = 10;
    config
}

async fn wait_for(
    service: &DocumentService,
    document_id: Uuid,
    pred: impl Fn(&StatusReport) -> bool,
) -> StatusReport {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(report) = service.status(document_id) {
            if pred(&report) {
                return report;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting on document {}",
            document_id
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Extractor that blocks until the test releases a permit
struct GatedExtractor {
    gate: Arc<Semaphore>,
}

#[async_trait]
impl TextExtractor for GatedExtractor {
    async fn extract(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedText> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| Error::upstream("gated", "gate closed"))?;
        PlainTextExtractor.extract(filename, bytes).await
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Embedder whose every call fails
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::upstream("embedder", "model offline"))
    }

    fn dimensions(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn gated_providers(config: &AnalyzerConfig, gate: Arc<Semaphore>) -> Providers {
    let mut providers = Providers::offline(config);
    providers.extractor = Arc::new(GatedExtractor { gate });
    providers
}

#[tokio::test]
async fn upload_then_ask_round_trip() {
    init_tracing();
    let config = small_chunk_config();
    let providers = Providers::offline(&config);
    let service = DocumentService::new(config, providers).unwrap();

    let receipt = service.upload("report.txt", REPORT.as_bytes().to_vec()).unwrap();
    assert_eq!(receipt.status, JobStatus::Queued);

    let done = wait_for(&service, receipt.document_id, |r| r.status.is_terminal()).await;
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.progress_percent, 100);
    assert!(done.error.is_none());

    let documents = service.list_documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].total_chunks, 2);
    assert_eq!(documents[0].page_count, Some(1));

    match service
        .ask(receipt.document_id, "What was the revenue growth?")
        .await
        .unwrap()
    {
        AskOutcome::Grounded(answer) => {
            assert!(answer.confidence >= 0.30);
            assert_eq!(answer.text, "Revenue grew 25% in Q4.");
            assert!(!answer.supporting_chunks.is_empty());
        }
        other => panic!("expected grounded answer, got {:?}", other),
    }

    // Questions the document cannot support are withheld, not answered.
    match service
        .ask(receipt.document_id, "Who won the football match yesterday?")
        .await
        .unwrap()
    {
        AskOutcome::NotGrounded { best_confidence } => assert!(best_confidence < 0.30),
        other => panic!("expected not-grounded outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn blank_question_is_rejected_as_invalid_input() {
    let config = small_chunk_config();
    let providers = Providers::offline(&config);
    let service = DocumentService::new(config, providers).unwrap();

    let receipt = service.upload("report.txt", REPORT.as_bytes().to_vec()).unwrap();
    wait_for(&service, receipt.document_id, |r| r.status.is_terminal()).await;

    let err = service.ask(receipt.document_id, "  \t ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let envelope: ApiResponse<()> = ApiResponse::from_error(&err);
    assert!(!envelope.success);
    assert_eq!(envelope.error_kind, Some(ErrorKind::InvalidInput));
}

#[tokio::test]
async fn asking_before_completion_is_not_ready() {
    let config = small_chunk_config();
    let gate = Arc::new(Semaphore::new(0));
    let providers = gated_providers(&config, gate.clone());
    let service = DocumentService::new(config, providers).unwrap();

    let receipt = service.upload("report.txt", REPORT.as_bytes().to_vec()).unwrap();
    wait_for(&service, receipt.document_id, |r| r.status == JobStatus::Processing).await;

    let err = service
        .ask(receipt.document_id, "What was the revenue growth?")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotReady { .. }));
    assert_eq!(err.kind(), ErrorKind::RetryLater);

    gate.add_permits(1);
    wait_for(&service, receipt.document_id, |r| r.status.is_terminal()).await;
    let outcome = service
        .ask(receipt.document_id, "What was the revenue growth?")
        .await
        .unwrap();
    assert!(outcome.is_grounded());
}

#[tokio::test]
async fn embedding_failure_fails_the_job_and_indexes_nothing() {
    let config = small_chunk_config();
    let mut providers = Providers::offline(&config);
    providers.embedder = Arc::new(FailingEmbedder);
    let service = DocumentService::new(config, providers).unwrap();

    let receipt = service.upload("report.txt", REPORT.as_bytes().to_vec()).unwrap();
    let done = wait_for(&service, receipt.document_id, |r| r.status.is_terminal()).await;

    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error.unwrap().contains("embedding failed"));

    // The failed document never becomes queryable.
    let err = service
        .ask(receipt.document_id, "What was the revenue growth?")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotReady { .. }));

    // Removal reports zero entries: nothing was partially inserted.
    assert_eq!(service.remove(receipt.document_id).unwrap(), 0);
}

#[tokio::test]
async fn full_queue_rejects_upload_and_rolls_back() {
    let mut config = small_chunk_config();
    config.processing.worker_count = Some(1);
    config.processing.queue_capacity = 1;
    let gate = Arc::new(Semaphore::new(0));
    let providers = gated_providers(&config, gate.clone());
    let service = DocumentService::new(config, providers).unwrap();

    let first = service.upload("a.txt", REPORT.as_bytes().to_vec()).unwrap();
    wait_for(&service, first.document_id, |r| r.status == JobStatus::Processing).await;

    // The single worker slot is busy; this one sits in the queue.
    let second = service.upload("b.txt", REPORT.as_bytes().to_vec()).unwrap();

    let err = service.upload("c.txt", REPORT.as_bytes().to_vec()).unwrap_err();
    assert!(matches!(err, Error::QueueFull));
    assert_eq!(err.kind(), ErrorKind::RetryLater);
    assert_eq!(service.list_documents().len(), 2);

    gate.add_permits(2);
    wait_for(&service, first.document_id, |r| r.status == JobStatus::Completed).await;
    wait_for(&service, second.document_id, |r| r.status == JobStatus::Completed).await;
}

#[tokio::test]
async fn cancellation_fails_the_job_cooperatively() {
    let config = small_chunk_config();
    let gate = Arc::new(Semaphore::new(0));
    let providers = gated_providers(&config, gate.clone());
    let service = DocumentService::new(config, providers).unwrap();

    let receipt = service.upload("report.txt", REPORT.as_bytes().to_vec()).unwrap();
    wait_for(&service, receipt.document_id, |r| r.status == JobStatus::Processing).await;

    assert!(service.cancel(receipt.document_id).unwrap());
    gate.add_permits(1);

    let done = wait_for(&service, receipt.document_id, |r| r.status.is_terminal()).await;
    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error.unwrap().contains("cancelled"));
}

#[tokio::test]
async fn remove_deletes_everything_and_allows_reupload() {
    let config = small_chunk_config();
    let providers = Providers::offline(&config);
    let service = DocumentService::new(config, providers).unwrap();

    let first = service.upload("report.txt", REPORT.as_bytes().to_vec()).unwrap();
    wait_for(&service, first.document_id, |r| r.status.is_terminal()).await;

    assert_eq!(service.remove(first.document_id).unwrap(), 2);
    assert!(matches!(
        service.status(first.document_id),
        Err(Error::DocumentNotFound(_))
    ));
    assert!(matches!(
        service.ask(first.document_id, "What was the revenue growth?").await,
        Err(Error::DocumentNotFound(_))
    ));

    // Same filename, new independent document.
    let second = service.upload("report.txt", REPORT.as_bytes().to_vec()).unwrap();
    assert_ne!(second.document_id, first.document_id);
    wait_for(&service, second.document_id, |r| r.status.is_terminal()).await;
    let outcome = service
        .ask(second.document_id, "What was the revenue growth?")
        .await
        .unwrap();
    assert!(outcome.is_grounded());
}

#[tokio::test]
async fn summary_requires_completion_and_marks_absent_sections() {
    let config = small_chunk_config();
    let providers = Providers::offline(&config);
    let service = DocumentService::new(config, providers).unwrap();

    let receipt = service.upload("report.txt", REPORT.as_bytes().to_vec()).unwrap();
    wait_for(&service, receipt.document_id, |r| r.status.is_terminal()).await;

    let summary = service.summary(receipt.document_id).await.unwrap();
    assert!(summary.financial_performance.is_present());
    assert!(summary.key_metrics.is_present());
    assert!(summary.highlights.is_present());
    // No rating/grade/score statements in the report.
    assert!(!summary.ratings.is_present());

    let err = service.summary(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::DocumentNotFound(_)));
}

#[tokio::test]
async fn state_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();

    let config = small_chunk_config();
    let service = DocumentService::new(config.clone(), Providers::offline(&config)).unwrap();
    let receipt = service.upload("report.txt", REPORT.as_bytes().to_vec()).unwrap();
    wait_for(&service, receipt.document_id, |r| r.status.is_terminal()).await;
    service.save_state(dir.path()).unwrap();
    service.close_intake();

    let restored =
        DocumentService::load_state(config.clone(), Providers::offline(&config), dir.path())
            .unwrap();
    let report = restored.status(receipt.document_id).unwrap();
    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(restored.list_documents().len(), 1);

    let outcome = restored
        .ask(receipt.document_id, "What was the revenue growth?")
        .await
        .unwrap();
    assert!(outcome.is_grounded());
}

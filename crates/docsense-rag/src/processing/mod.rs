//! Background job tracking and the ingestion worker pool

pub mod tracker;
pub mod worker;

pub use tracker::{JobRecord, JobStatus, JobTracker};
pub use worker::{IngestWorker, ProcessingJob};

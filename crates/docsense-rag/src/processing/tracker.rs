//! Job tracking for background document processing

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Status of a document's ingestion job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One document's job record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub document_id: Uuid,
    pub status: JobStatus,
    /// Progress percentage, 0..=100, monotonically non-decreasing
    pub progress: u8,
    /// Failure reason, set only on failed jobs
    pub error: Option<String>,
    /// Cooperative cancellation flag, observed at stage boundaries
    #[serde(default)]
    pub cancel_requested: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    fn new(document_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            document_id,
            status: JobStatus::Queued,
            progress: 0,
            error: None,
            cancel_requested: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Concurrent job map. Writers mutate through the shard locks; pollers read
/// cloned snapshots and never block the pipeline.
#[derive(Default)]
pub struct JobTracker {
    jobs: DashMap<Uuid, JobRecord>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queued record for a document. Replaces nothing: creating over
    /// an existing record is a caller bug and returns false.
    pub fn create(&self, document_id: Uuid) -> bool {
        match self.jobs.entry(document_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(JobRecord::new(document_id));
                true
            }
        }
    }

    /// Claim a queued job for processing. Exactly one claimer wins.
    pub fn claim(&self, document_id: Uuid) -> bool {
        match self.jobs.get_mut(&document_id) {
            Some(mut record) if record.status == JobStatus::Queued => {
                record.status = JobStatus::Processing;
                record.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    /// Raise progress to `percent`. Progress never decreases and terminal
    /// records are left untouched.
    pub fn set_progress(&self, document_id: Uuid, percent: u8) {
        if let Some(mut record) = self.jobs.get_mut(&document_id) {
            if record.status.is_terminal() {
                return;
            }
            if percent > record.progress {
                record.progress = percent.min(100);
                record.updated_at = Utc::now();
            }
        }
    }

    /// Finalize a job as completed. No-op if already terminal.
    pub fn complete(&self, document_id: Uuid) {
        if let Some(mut record) = self.jobs.get_mut(&document_id) {
            if record.status.is_terminal() {
                return;
            }
            record.status = JobStatus::Completed;
            record.progress = 100;
            record.error = None;
            let now = Utc::now();
            record.updated_at = now;
            record.completed_at = Some(now);
        }
    }

    /// Finalize a job as failed with a reason. No-op if already terminal.
    pub fn fail(&self, document_id: Uuid, message: impl Into<String>) {
        if let Some(mut record) = self.jobs.get_mut(&document_id) {
            if record.status.is_terminal() {
                return;
            }
            record.status = JobStatus::Failed;
            record.error = Some(message.into());
            let now = Utc::now();
            record.updated_at = now;
            record.completed_at = Some(now);
        }
    }

    /// Request cooperative cancellation. Returns true if the flag was set on
    /// a live job.
    pub fn request_cancel(&self, document_id: Uuid) -> bool {
        match self.jobs.get_mut(&document_id) {
            Some(mut record) if !record.status.is_terminal() => {
                record.cancel_requested = true;
                record.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    pub fn cancel_requested(&self, document_id: Uuid) -> bool {
        self.jobs
            .get(&document_id)
            .map(|r| r.cancel_requested)
            .unwrap_or(false)
    }

    /// Point-in-time clone of a record
    pub fn snapshot(&self, document_id: Uuid) -> Option<JobRecord> {
        self.jobs.get(&document_id).map(|r| r.clone())
    }

    pub fn remove(&self, document_id: Uuid) -> Option<JobRecord> {
        self.jobs.remove(&document_id).map(|(_, r)| r)
    }

    /// Snapshot of every record
    pub fn all(&self) -> Vec<JobRecord> {
        self.jobs.iter().map(|r| r.clone()).collect()
    }

    /// Write a JSON snapshot of all records to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let records: HashMap<Uuid, JobRecord> = self
            .jobs
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        let json = serde_json::to_string(&records)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Rebuild a tracker from a snapshot. Jobs that were still in flight when
    /// the snapshot was taken are marked failed, since their pipelines are
    /// gone.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut records: HashMap<Uuid, JobRecord> = serde_json::from_str(&json)?;
        let now = Utc::now();
        for record in records.values_mut() {
            if !record.status.is_terminal() {
                record.status = JobStatus::Failed;
                record.error = Some("interrupted by restart".to_string());
                record.updated_at = now;
                record.completed_at = Some(now);
            }
        }
        let tracker = Self::new();
        for (id, record) in records {
            tracker.jobs.insert(id, record);
        }
        Ok(tracker)
    }
}

//! Ingestion job tracking
//!
//! Uploads return before their rows are processed; the registry is where the
//! outcome of each one becomes observable, keyed by the job id handed back to
//! the uploader.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::pipeline::IngestionSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Status of one upload, as served at GET /uploads/:job_id.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub id: Uuid,
    pub filename: String,
    /// Sheet name for workbooks, file name for CSV
    pub collection: String,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<IngestionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Jobs {
    statuses: HashMap<Uuid, JobStatus>,
    // Finished ids, oldest first
    finished: VecDeque<Uuid>,
}

/// Thread-safe job table.
///
/// Queued and running jobs are always kept; finished ones beyond
/// `max_finished` are dropped oldest first.
pub struct JobRegistry {
    jobs: RwLock<Jobs>,
    max_finished: usize,
}

impl JobRegistry {
    pub fn new(max_finished: usize) -> Self {
        Self {
            jobs: RwLock::new(Jobs::default()),
            max_finished,
        }
    }

    /// Records a new queued job and returns its id.
    pub async fn register(&self, filename: &str, collection: &str) -> Uuid {
        let id = Uuid::new_v4();
        let status = JobStatus {
            id,
            filename: filename.to_string(),
            collection: collection.to_string(),
            state: JobState::Queued,
            summary: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        self.jobs.write().await.statuses.insert(id, status);
        id
    }

    pub async fn mark_running(&self, id: Uuid) {
        if let Some(status) = self.jobs.write().await.statuses.get_mut(&id) {
            status.state = JobState::Running;
        }
    }

    pub async fn complete(&self, id: Uuid, summary: IngestionSummary) {
        self.finish(id, JobState::Completed, Some(summary), None).await;
    }

    pub async fn fail(&self, id: Uuid, error: String) {
        self.finish(id, JobState::Failed, None, Some(error)).await;
    }

    pub async fn get(&self, id: Uuid) -> Option<JobStatus> {
        self.jobs.read().await.statuses.get(&id).cloned()
    }

    /// Forgets a job that never made it onto the queue.
    pub async fn remove(&self, id: Uuid) {
        let mut jobs = self.jobs.write().await;
        jobs.statuses.remove(&id);
        jobs.finished.retain(|finished| *finished != id);
    }

    async fn finish(
        &self,
        id: Uuid,
        state: JobState,
        summary: Option<IngestionSummary>,
        error: Option<String>,
    ) {
        let mut jobs = self.jobs.write().await;
        let Some(status) = jobs.statuses.get_mut(&id) else {
            return;
        };
        if status.state.is_finished() {
            return;
        }
        status.state = state;
        status.summary = summary;
        status.error = error;
        status.finished_at = Some(Utc::now());

        jobs.finished.push_back(id);
        while jobs.finished.len() > self.max_finished {
            if let Some(oldest) = jobs.finished.pop_front() {
                jobs.statuses.remove(&oldest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let registry = JobRegistry::new(10);
        let id = registry.register("uk-500.xlsx", "uk-500").await;
        assert_eq!(registry.get(id).await.unwrap().state, JobState::Queued);

        registry.mark_running(id).await;
        assert_eq!(registry.get(id).await.unwrap().state, JobState::Running);

        let summary = IngestionSummary {
            source: "uk-500".into(),
            total_rows: 3,
            succeeded: 3,
            ..Default::default()
        };
        registry.complete(id, summary.clone()).await;

        let status = registry.get(id).await.unwrap();
        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.summary, Some(summary));
        assert!(status.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_job_keeps_error() {
        let registry = JobRegistry::new(10);
        let id = registry.register("broken.xlsx", "uk-500").await;

        registry.fail(id, "cannot open broken.xlsx".into()).await;
        // A finished job does not change state again
        registry.complete(id, IngestionSummary::default()).await;

        let status = registry.get(id).await.unwrap();
        assert_eq!(status.state, JobState::Failed);
        assert_eq!(status.error.as_deref(), Some("cannot open broken.xlsx"));
        assert!(status.summary.is_none());
    }

    #[tokio::test]
    async fn test_prunes_oldest_finished_only() {
        let registry = JobRegistry::new(2);
        let pending = registry.register("pending.csv", "pending.csv").await;

        let mut done = Vec::new();
        for i in 0..3 {
            let id = registry.register(&format!("{i}.csv"), "x").await;
            registry.complete(id, IngestionSummary::default()).await;
            done.push(id);
        }

        assert!(registry.get(done[0]).await.is_none());
        assert!(registry.get(done[1]).await.is_some());
        assert!(registry.get(done[2]).await.is_some());
        assert_eq!(registry.get(pending).await.unwrap().state, JobState::Queued);
    }

    #[tokio::test]
    async fn test_remove_and_unknown_ids() {
        let registry = JobRegistry::new(2);
        let id = registry.register("a.csv", "a.csv").await;
        registry.remove(id).await;
        assert!(registry.get(id).await.is_none());

        // Updates to unknown ids are ignored
        registry.mark_running(Uuid::new_v4()).await;
        registry.fail(Uuid::new_v4(), "nope".into()).await;
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(serde_json::to_value(JobState::Running).unwrap(), "running");
    }
}

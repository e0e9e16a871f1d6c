//! Ingestion worker pool
//!
//! A fixed number of workers pull jobs from one bounded queue. Submitting never
//! waits: a full queue is reported to the uploader instead of stalling the
//! request. Closing the queue lets the workers drain what is left and exit.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::decoder::{spawn_decoder, FileFormat};
use super::jobs::JobRegistry;
use super::pipeline::IngestionPipeline;
use crate::error::{AppError, Result};

/// A saved upload waiting to be ingested.
#[derive(Debug, Clone)]
pub struct IngestJob {
    pub id: Uuid,
    pub path: PathBuf,
    pub format: FileFormat,
    pub sheet: Option<String>,
    pub collection: String,
}

/// Sending side of the job queue, cloned into the HTTP state.
#[derive(Clone)]
pub struct IngestQueue {
    tx: mpsc::Sender<IngestJob>,
}

impl IngestQueue {
    pub fn submit(&self, job: IngestJob) -> Result<()> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => {
                warn!(job_id = %job.id, "ingestion queue full");
                AppError::Busy("ingestion queue is full, retry later".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                AppError::Internal("ingestion workers have stopped".to_string())
            }
        })
    }
}

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Waits for every worker to finish. Workers only exit once all
    /// [`IngestQueue`] handles are dropped and the queue is empty.
    pub async fn shutdown(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "ingestion worker panicked");
            }
        }
        info!("ingestion workers stopped");
    }
}

/// Starts `workers` ingestion workers sharing a queue of `capacity` jobs.
pub fn spawn_ingest_workers(
    pipeline: Arc<IngestionPipeline>,
    jobs: Arc<JobRegistry>,
    workers: usize,
    capacity: usize,
) -> (IngestQueue, WorkerPool) {
    let (tx, rx) = mpsc::channel::<IngestJob>(capacity.max(1));
    let rx = Arc::new(Mutex::new(rx));

    let handles = (0..workers.max(1))
        .map(|worker| {
            let rx = rx.clone();
            let pipeline = pipeline.clone();
            let jobs = jobs.clone();
            tokio::spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(job) = next else { break };
                    let job_id = job.id;

                    // A panic inside one job must not take the worker down with it
                    let task = tokio::spawn(process(worker, job, pipeline.clone(), jobs.clone()));
                    if let Err(e) = task.await {
                        error!(worker, %job_id, error = %e, "ingestion task aborted");
                        jobs.fail(job_id, format!("ingestion aborted: {e}")).await;
                    }
                }
            })
        })
        .collect();

    info!(workers, capacity, "ingestion workers started");
    (IngestQueue { tx }, WorkerPool { handles })
}

async fn process(
    worker: usize,
    job: IngestJob,
    pipeline: Arc<IngestionPipeline>,
    jobs: Arc<JobRegistry>,
) {
    info!(worker, job_id = %job.id, path = %job.path.display(), "ingestion started");
    jobs.mark_running(job.id).await;

    let rows = spawn_decoder(job.path, job.format, job.sheet);
    match pipeline.run(job.id, &job.collection, rows).await {
        Ok(summary) => jobs.complete(job.id, summary).await,
        Err(e) => {
            error!(job_id = %job.id, error = %e, "ingestion failed");
            jobs.fail(job.id, e.to_string()).await;
        }
    }
}

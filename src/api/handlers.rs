//! API Handlers
//!
//! HTTP request handlers for the upload, record, and status endpoints.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Multipart, Path, State},
    Json,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::cache::{CacheBackend, RecordCache};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::ingest::{
    spawn_ingest_workers, FileFormat, IngestJob, IngestQueue, IngestionPipeline, JobRegistry,
    JobStatus, WorkerPool,
};
use crate::models::{
    DeleteResponse, HealthResponse, Record, RecordId, StatsResponse, UpdateRecordRequest,
    UploadResponse,
};
use crate::service::{RecordReader, WriteCoordinator};
use crate::store::RecordStore;

/// Application state shared across all handlers.
///
/// Every handle is built once at startup; nothing here is a global.
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<RecordReader>,
    pub writer: Arc<WriteCoordinator>,
    pub cache: Arc<RecordCache>,
    pub jobs: Arc<JobRegistry>,
    pub queue: IngestQueue,
    pub upload_dir: PathBuf,
    pub default_sheet: Option<String>,
}

impl AppState {
    /// Wires the services over `store` and `backend` and starts the
    /// ingestion workers. Must be called inside a Tokio runtime.
    ///
    /// The workers exit once the returned state (and every clone of it) is
    /// dropped and the queue is drained.
    pub fn from_parts(
        store: Arc<dyn RecordStore>,
        backend: Arc<dyn CacheBackend>,
        config: &Config,
    ) -> (Self, WorkerPool) {
        let cache = Arc::new(RecordCache::new(backend, config.cache_ttl()));
        let reader = Arc::new(RecordReader::new(store.clone(), cache.clone()));
        let writer = Arc::new(WriteCoordinator::new(store, cache.clone()));
        let jobs = Arc::new(JobRegistry::new(config.max_tracked_jobs));

        let pipeline = Arc::new(IngestionPipeline::new(writer.clone()));
        let (queue, workers) = spawn_ingest_workers(
            pipeline,
            jobs.clone(),
            config.ingest_workers,
            config.ingest_queue_capacity,
        );

        let state = Self {
            reader,
            writer,
            cache,
            jobs,
            queue,
            upload_dir: config.upload_dir.clone(),
            default_sheet: config.default_sheet.clone(),
        };
        (state, workers)
    }
}

fn parse_record_id(raw: &str) -> Result<RecordId> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid ID format: {raw}")))
}

/// Keeps only the final path component so uploads cannot escape the upload dir.
fn sanitize_filename(name: &str) -> Option<String> {
    FsPath::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Handler for POST /upload
///
/// Saves the `file` field under `<upload_dir>/<job_id>/` and queues it for
/// ingestion.
/// An optional `sheet` field picks the worksheet of a workbook.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut sheet: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .and_then(sanitize_filename)
                    .ok_or_else(|| AppError::Validation("File name is required".to_string()))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file field: {e}")))?;
                upload = Some((filename, data));
            }
            Some("sheet") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid sheet field: {e}")))?;
                let text = text.trim();
                if !text.is_empty() {
                    sheet = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::Validation("File is required".to_string()))?;
    let format = FileFormat::from_path(&filename)
        .ok_or_else(|| AppError::Validation(format!("Unsupported file type: {filename}")))?;

    let sheet = match format {
        FileFormat::Csv => None,
        FileFormat::Workbook => sheet.or_else(|| state.default_sheet.clone()),
    };
    let collection = sheet.clone().unwrap_or_else(|| filename.clone());

    // Each job gets its own directory so same-named uploads never share a path
    let job_id = state.jobs.register(&filename, &collection).await;
    let job_dir = state.upload_dir.join(job_id.to_string());
    let path = job_dir.join(&filename);
    let saved = match tokio::fs::create_dir_all(&job_dir).await {
        Ok(()) => tokio::fs::write(&path, &data).await,
        Err(e) => Err(e),
    };
    if let Err(e) = saved {
        error!(path = %path.display(), error = %e, "failed to save upload");
        state.jobs.remove(job_id).await;
        return Err(AppError::Internal("Failed to save file".to_string()));
    }

    let job = IngestJob {
        id: job_id,
        path,
        format,
        sheet,
        collection,
    };
    if let Err(e) = state.queue.submit(job) {
        state.jobs.remove(job_id).await;
        return Err(e);
    }

    info!(%job_id, filename, bytes = data.len(), "upload accepted");
    Ok(Json(UploadResponse::accepted(job_id, filename)))
}

/// Handler for GET /uploads/:job_id
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatus>> {
    let id = Uuid::parse_str(&job_id)
        .map_err(|_| AppError::Validation(format!("Invalid job id: {job_id}")))?;

    state
        .jobs
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("upload {id}")))
}

/// Handler for GET /records
pub async fn list_records_handler(State(state): State<AppState>) -> Result<Json<Vec<Record>>> {
    Ok(Json(state.reader.get_all().await?))
}

/// Handler for GET /records/:id
pub async fn get_record_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>> {
    let id = parse_record_id(&id)?;
    Ok(Json(state.reader.get_by_id(id).await?))
}

/// Handler for PUT /records/:id
///
/// The body replaces every attribute; the id in the path wins over any id
/// in the body.
pub async fn update_record_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateRecordRequest>, JsonRejection>,
) -> Result<Json<Record>> {
    let id = parse_record_id(&id)?;
    let Json(req) = body.map_err(|e| AppError::Validation(format!("Invalid input: {}", e.body_text())))?;

    Ok(Json(state.writer.update(id, req.into_fields()).await?))
}

/// Handler for DELETE /records/:id
pub async fn delete_record_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let id = parse_record_id(&id)?;
    let deleted = state.writer.delete(id).await?;
    Ok(Json(DeleteResponse::new(id, deleted)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

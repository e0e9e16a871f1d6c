//! Response DTOs for the record API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use uuid::Uuid;

use crate::cache::CacheStatsSnapshot;

use super::record::RecordId;

/// Response body for POST /upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Acknowledgment message
    pub message: String,
    /// Id to poll at GET /uploads/:job_id
    pub job_id: Uuid,
    /// Name the file was saved under
    pub filename: String,
}

impl UploadResponse {
    /// Creates a new UploadResponse for a queued job
    pub fn accepted(job_id: Uuid, filename: impl Into<String>) -> Self {
        Self {
            message: "File uploaded successfully, ingestion started".to_string(),
            job_id,
            filename: filename.into(),
        }
    }
}

/// Response body for DELETE /records/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Confirmation message
    pub message: String,
    /// The id that was targeted
    pub id: RecordId,
    /// Whether a record was actually removed
    pub deleted: bool,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(id: RecordId, deleted: bool) -> Self {
        Self {
            message: "Record deleted".to_string(),
            id,
            deleted,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses, expiries included
    pub misses: u64,
    /// Number of failed cache operations
    pub errors: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStatsSnapshot> for StatsResponse {
    fn from(stats: CacheStatsSnapshot) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            errors: stats.errors,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

//! Record model and request/response DTOs
//!
//! `record` holds the domain type shared by the store, cache, and ingestion;
//! `requests`/`responses` are the HTTP bodies.

pub mod record;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use record::{Record, RecordFields, RecordId, FIELD_COUNT};
pub use requests::UpdateRecordRequest;
pub use responses::{DeleteResponse, HealthResponse, StatsResponse, UploadResponse};

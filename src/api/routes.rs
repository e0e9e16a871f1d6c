//! API Routes
//!
//! Configures the Axum router with every record service endpoint.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_record_handler, get_record_handler, health_handler, job_status_handler,
    list_records_handler, stats_handler, update_record_handler, upload_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /upload` - Upload a CSV or workbook for ingestion
/// - `GET /uploads/:job_id` - Ingestion job status
/// - `GET /records` - List every record
/// - `GET /records/:id` - Fetch one record
/// - `PUT /records/:id` - Replace a record's attributes
/// - `DELETE /records/:id` - Delete a record
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check
///
/// Request bodies are capped at `max_upload_bytes`.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(upload_handler))
        .route("/uploads/:job_id", get(job_status_handler))
        .route("/records", get(list_records_handler))
        .route(
            "/records/:id",
            get(get_record_handler)
                .put(update_record_handler)
                .delete(delete_record_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

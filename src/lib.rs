//! Record Cache - bulk record ingestion with a cache-aside read path
//!
//! Uploaded CSV and workbook files are ingested into a durable record store.
//! Reads are served from a TTL-bounded cache that falls back to the store;
//! writes commit to the store first and then refresh or invalidate the cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, CacheError, StoreError};
pub use tasks::spawn_cleanup_task;

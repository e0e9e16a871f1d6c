//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Record store location (`sqlite://...` or `memory`)
    pub database_url: String,
    /// Maximum pooled connections to the record store
    pub db_max_connections: u32,
    /// Cache store location (`redis://...` or `memory`)
    pub cache_url: String,
    /// TTL in seconds for every cache entry
    pub cache_ttl: u64,
    /// Capacity of the in-memory cache backend
    pub max_cache_entries: usize,
    /// Interval in seconds between in-memory cache sweeps
    pub cleanup_interval: u64,
    /// Directory uploaded files are kept in
    pub upload_dir: PathBuf,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
    /// Number of ingestion workers
    pub ingest_workers: usize,
    /// Pending ingestion jobs before uploads are refused
    pub ingest_queue_capacity: usize,
    /// Worksheet read when the upload does not name one
    pub default_sheet: Option<String>,
    /// Finished job statuses kept for lookup
    pub max_tracked_jobs: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `DATABASE_URL` - Record store URL (default: sqlite://records.db)
    /// - `DB_MAX_CONNECTIONS` - Store pool size (default: 5)
    /// - `CACHE_URL` - Cache store URL (default: memory)
    /// - `CACHE_TTL` - Cache entry TTL in seconds (default: 300)
    /// - `MAX_CACHE_ENTRIES` - In-memory cache capacity (default: 10000)
    /// - `CLEANUP_INTERVAL` - In-memory sweep frequency in seconds (default: 60)
    /// - `UPLOAD_DIR` - Where uploads are saved (default: uploads)
    /// - `MAX_UPLOAD_BYTES` - Upload size limit (default: 32 MiB)
    /// - `INGEST_WORKERS` - Ingestion worker count (default: 2)
    /// - `INGEST_QUEUE_CAPACITY` - Pending job limit (default: 16)
    /// - `DEFAULT_SHEET` - Worksheet name (default: first sheet)
    /// - `MAX_TRACKED_JOBS` - Job statuses retained (default: 256)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            cache_url: env::var("CACHE_URL").unwrap_or(defaults.cache_url),
            cache_ttl: parse_env("CACHE_TTL", defaults.cache_ttl),
            max_cache_entries: parse_env("MAX_CACHE_ENTRIES", defaults.max_cache_entries),
            cleanup_interval: parse_env("CLEANUP_INTERVAL", defaults.cleanup_interval),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            ingest_workers: parse_env("INGEST_WORKERS", defaults.ingest_workers).max(1),
            ingest_queue_capacity: parse_env("INGEST_QUEUE_CAPACITY", defaults.ingest_queue_capacity)
                .max(1),
            default_sheet: env::var("DEFAULT_SHEET").ok().filter(|s| !s.is_empty()),
            max_tracked_jobs: parse_env("MAX_TRACKED_JOBS", defaults.max_tracked_jobs),
        }
    }

    /// Cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            database_url: "sqlite://records.db".to_string(),
            db_max_connections: 5,
            cache_url: "memory".to_string(),
            cache_ttl: 300,
            max_cache_entries: 10_000,
            cleanup_interval: 60,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 32 * 1024 * 1024,
            ingest_workers: 2,
            ingest_queue_capacity: 16,
            default_sheet: None,
            max_tracked_jobs: 256,
        }
    }
}

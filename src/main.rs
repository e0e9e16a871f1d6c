//! Record Cache server binary
//!
//! Picks the store and cache backends from the environment, starts the
//! ingestion workers and serves the HTTP API until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use record_cache::cache::{CacheBackend, MemoryCache, RedisCache};
use record_cache::store::{MemoryRecordStore, RecordStore, SqlRecordStore};
use record_cache::{create_router, spawn_cleanup_task, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "record_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting record cache server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        database = %config.database_url,
        cache = %config.cache_url,
        cache_ttl_secs = config.cache_ttl,
        workers = config.ingest_workers,
        "Configuration loaded"
    );

    let store: Arc<dyn RecordStore> = if config.database_url == "memory" {
        Arc::new(MemoryRecordStore::new())
    } else {
        Arc::new(
            SqlRecordStore::connect(&config.database_url, config.db_max_connections)
                .await
                .context("failed to open record store")?,
        )
    };

    let mut cleanup_handle: Option<JoinHandle<()>> = None;
    let backend: Arc<dyn CacheBackend> = if config.cache_url == "memory" {
        let memory = Arc::new(MemoryCache::new(config.max_cache_entries));
        cleanup_handle = Some(spawn_cleanup_task(memory.clone(), config.cleanup_interval));
        memory
    } else {
        Arc::new(
            RedisCache::connect(&config.cache_url)
                .await
                .context("failed to connect to cache")?,
        )
    };

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create {}", config.upload_dir.display()))?;

    let (state, workers) = AppState::from_parts(store, backend, &config);
    let app = create_router(state, config.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The router and its queue handle are gone; let queued uploads finish
    workers.shutdown().await;

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

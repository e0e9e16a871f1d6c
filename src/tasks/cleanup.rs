//! Expired entry sweep
//!
//! Reads already treat expired entries as absent; the sweep only reclaims the
//! memory they hold in the in-process backend. Redis expires keys on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoryCache;

/// Spawns a task that purges expired entries from `cache` every
/// `cleanup_interval_secs` seconds. Abort the handle to stop it.
pub fn spawn_cleanup_task(cache: Arc<MemoryCache>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(interval_secs = period.as_secs(), "cache sweep started");
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = cache.cleanup_expired().await;
            if removed > 0 {
                let evictions = cache.evictions().await;
                info!(removed, evictions, "cache sweep removed expired entries");
            } else {
                debug!("cache sweep found nothing to remove");
            }
        }
    })
}

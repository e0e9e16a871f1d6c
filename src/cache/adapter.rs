//! Record cache adapter
//!
//! Typed access to the cache for records and the collection snapshot. Every
//! value is wrapped in an envelope carrying its own expiry, so an entry past
//! its TTL reads as absent even if the backend has not purged it yet.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::backend::CacheBackend;
use super::entry::{current_timestamp_ms, duration_ms};
use super::stats::{CacheStats, CacheStatsSnapshot};
use crate::error::CacheError;
use crate::models::{Record, RecordId};

/// Key of the full-collection snapshot.
pub const COLLECTION_KEY: &str = "records:all";

/// Key of a single record.
pub fn record_key(id: RecordId) -> String {
    format!("record:{id}")
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    expires_at_ms: u64,
    value: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    expires_at_ms: u64,
    value: T,
}

/// Cache adapter shared by the read path and the write coordinator.
///
/// Reports backend failures as `Err` so callers can tell "cache down" from
/// "key absent"; it never decides on its own to fall back to the store.
pub struct RecordCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    stats: CacheStats,
}

impl RecordCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            stats: CacheStats::new(),
        }
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    // == Records ==

    pub async fn get_record(&self, id: RecordId) -> Result<Option<Record>, CacheError> {
        self.get_json(&record_key(id)).await
    }

    pub async fn put_record(&self, record: &Record) -> Result<(), CacheError> {
        self.set_json(&record_key(record.id), record).await
    }

    pub async fn remove_record(&self, id: RecordId) -> Result<(), CacheError> {
        self.remove(&record_key(id)).await
    }

    // == Collection ==

    pub async fn get_collection(&self) -> Result<Option<Vec<Record>>, CacheError> {
        self.get_json(COLLECTION_KEY).await
    }

    pub async fn put_collection(&self, records: &[Record]) -> Result<(), CacheError> {
        self.set_json(COLLECTION_KEY, &records).await
    }

    pub async fn invalidate_collection(&self) -> Result<(), CacheError> {
        self.remove(COLLECTION_KEY).await
    }

    // == Generic operations ==

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                return Ok(None);
            }
            Err(e) => {
                self.stats.record_error();
                return Err(e);
            }
        };

        let envelope: Envelope<T> = serde_json::from_str(&raw).map_err(|e| {
            self.stats.record_error();
            CacheError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;

        if current_timestamp_ms() >= envelope.expires_at_ms {
            self.stats.record_miss();
            debug!(key, "cache entry past its ttl");
            return Ok(None);
        }

        self.stats.record_hit();
        debug!(key, "cache hit");
        Ok(Some(envelope.value))
    }

    async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(&EnvelopeRef {
            expires_at_ms: current_timestamp_ms().saturating_add(duration_ms(self.ttl)),
            value,
        })
        .map_err(|e| CacheError::Rejected(e.to_string()))?;

        self.backend
            .set(key, raw, self.ttl)
            .await
            .map_err(|e| self.count_error(e))
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.backend
            .delete(key)
            .await
            .map(|_| ())
            .map_err(|e| self.count_error(e))
    }

    fn count_error(&self, e: CacheError) -> CacheError {
        self.stats.record_error();
        e
    }
}

//! Write coordinator
//!
//! Every write commits to the record store before touching the cache. A crash
//! or cache failure between the two steps can leave the cache stale or empty
//! for at most one TTL, but never holding data the store did not accept.
//!
//! Concurrent writes to the same id are not serialized: the cache ends up with
//! whichever writer reached it last, which need not be the last store write.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::RecordCache;
use crate::error::{AppError, Result};
use crate::models::{Record, RecordFields, RecordId};
use crate::store::RecordStore;

pub struct WriteCoordinator {
    store: Arc<dyn RecordStore>,
    cache: Arc<RecordCache>,
}

impl WriteCoordinator {
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<RecordCache>) -> Self {
        Self { store, cache }
    }

    /// Persists a new record, caches it, and drops the collection snapshot.
    pub async fn create(&self, fields: RecordFields) -> Result<Record> {
        let record = self.store.create(&fields).await?;
        debug!(record_id = record.id, "record created");

        self.refresh_cache(&record).await;
        Ok(record)
    }

    /// Replaces the attributes of an existing record.
    ///
    /// Fails with `NotFound` rather than inserting when the id is unknown.
    pub async fn update(&self, id: RecordId, fields: RecordFields) -> Result<Record> {
        let record = self
            .store
            .update(id, &fields)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("record {id}")))?;
        debug!(record_id = id, "record updated");

        self.refresh_cache(&record).await;
        Ok(record)
    }

    /// Removes a record. Deleting an absent id succeeds and returns `false`.
    pub async fn delete(&self, id: RecordId) -> Result<bool> {
        let existed = self.store.delete(id).await?;
        debug!(record_id = id, existed, "record deleted");

        if let Err(e) = self.cache.remove_record(id).await {
            warn!(record_id = id, error = %e, "failed to evict record from cache");
        }
        self.invalidate_collection().await;

        Ok(existed)
    }

    /// Overwrites the record's entry so an immediate read sees the new value.
    async fn refresh_cache(&self, record: &Record) {
        if let Err(e) = self.cache.put_record(record).await {
            warn!(record_id = record.id, error = %e, "failed to cache record");
        }
        self.invalidate_collection().await;
    }

    async fn invalidate_collection(&self) {
        if let Err(e) = self.cache.invalidate_collection().await {
            warn!(error = %e, "failed to invalidate collection cache");
        }
    }
}

//! Cache-aside read path
//!
//! Consults the cache first and falls back to the record store on a miss, an
//! expired entry, an undecodable entry, or a cache outage. Only store failures
//! reach the caller.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::RecordCache;
use crate::error::{AppError, Result};
use crate::models::{Record, RecordId};
use crate::store::RecordStore;

pub struct RecordReader {
    store: Arc<dyn RecordStore>,
    cache: Arc<RecordCache>,
}

impl RecordReader {
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<RecordCache>) -> Self {
        Self { store, cache }
    }

    /// Returns every record, from the collection snapshot when it is cached.
    ///
    /// On a miss the snapshot is rebuilt from the store and cached.
    pub async fn get_all(&self) -> Result<Vec<Record>> {
        match self.cache.get_collection().await {
            Ok(Some(records)) => return Ok(records),
            Ok(None) => debug!("collection not cached, reading store"),
            Err(e) => warn!(error = %e, "cache read failed, falling back to store"),
        }

        let records = self.store.list().await?;

        if let Err(e) = self.cache.put_collection(&records).await {
            warn!(error = %e, "failed to populate collection cache");
        }

        Ok(records)
    }

    /// Returns one record.
    ///
    /// A record missing from the store is `NotFound` and is not cached, so the
    /// next lookup asks the store again.
    pub async fn get_by_id(&self, id: RecordId) -> Result<Record> {
        match self.cache.get_record(id).await {
            Ok(Some(record)) => return Ok(record),
            Ok(None) => debug!(record_id = id, "record not cached, reading store"),
            Err(e) => warn!(record_id = id, error = %e, "cache read failed, falling back to store"),
        }

        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("record {id}")))?;

        if let Err(e) = self.cache.put_record(&record).await {
            warn!(record_id = id, error = %e, "failed to populate record cache");
        }

        Ok(record)
    }
}

//! Record Store Module
//!
//! The durable store owns canonical record state. All persistence goes through
//! [`RecordStore`]; an absent key is `Ok(None)`/`Ok(false)`, never an error, so
//! callers can tell "not found" from [`StoreError::Unavailable`].

mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Record, RecordFields, RecordId};

pub use memory::MemoryRecordStore;
pub use sqlite::SqlRecordStore;

/// Durable record persistence by primary key.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record; the store assigns its identity.
    async fn create(&self, fields: &RecordFields) -> Result<Record, StoreError>;

    async fn get(&self, id: RecordId) -> Result<Option<Record>, StoreError>;

    /// Replaces every attribute of an existing record.
    ///
    /// Returns `None` when no record has this id; nothing is inserted.
    async fn update(&self, id: RecordId, fields: &RecordFields)
        -> Result<Option<Record>, StoreError>;

    /// Removes a record. Returns whether one existed.
    async fn delete(&self, id: RecordId) -> Result<bool, StoreError>;

    /// All records in identity order.
    async fn list(&self) -> Result<Vec<Record>, StoreError>;
}

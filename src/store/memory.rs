//! In-process record store, selected with `DATABASE_URL=memory`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RecordStore;
use crate::error::StoreError;
use crate::models::{Record, RecordFields, RecordId};

#[derive(Debug)]
struct Table {
    next_id: RecordId,
    rows: BTreeMap<RecordId, RecordFields>,
}

/// BTreeMap-backed store with SQL-like autoincrement ids (never reused).
#[derive(Debug)]
pub struct MemoryRecordStore {
    table: RwLock<Table>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, fields: &RecordFields) -> Result<Record, StoreError> {
        let mut table = self.table.write().await;
        let id = table.next_id;
        table.next_id += 1;
        table.rows.insert(id, fields.clone());
        Ok(Record::new(id, fields.clone()))
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .get(&id)
            .map(|fields| Record::new(id, fields.clone())))
    }

    async fn update(
        &self,
        id: RecordId,
        fields: &RecordFields,
    ) -> Result<Option<Record>, StoreError> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&id) {
            Some(row) => {
                *row = fields.clone();
                Ok(Some(Record::new(id, fields.clone())))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .map(|(id, fields)| Record::new(*id, fields.clone()))
            .collect())
    }
}

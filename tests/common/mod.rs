//! Shared test doubles and builders for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_xlsxwriter::{Workbook, Worksheet};
use tokio::sync::{watch, Mutex};

use record_cache::cache::{CacheBackend, MemoryCache, RecordCache};
use record_cache::error::{CacheError, StoreError};
use record_cache::models::{Record, RecordFields, RecordId, FIELD_COUNT};
use record_cache::service::{RecordReader, WriteCoordinator};
use record_cache::store::{MemoryRecordStore, RecordStore};

/// Ten attribute values tagged with `tag`.
pub fn row(tag: &str) -> Vec<String> {
    (0..FIELD_COUNT).map(|i| format!("{tag}-{i}")).collect()
}

pub fn fields(tag: &str) -> RecordFields {
    RecordFields::from_row(&row(tag)).unwrap()
}

/// Cache backend whose every call fails as if the server were down.
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

/// Cache backend that ignores TTLs and keeps every value until deleted.
#[derive(Default)]
pub struct NeverExpiringCache {
    entries: Mutex<HashMap<String, String>>,
}

impl NeverExpiringCache {
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }
}

#[async_trait]
impl CacheBackend for NeverExpiringCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String, _ttl: Duration) -> Result<(), CacheError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.lock().await.remove(key).is_some())
    }
}

/// Record store that is unreachable.
pub struct FailingStore;

fn store_down() -> StoreError {
    StoreError::Unavailable("database is locked".into())
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn create(&self, _fields: &RecordFields) -> Result<Record, StoreError> {
        Err(store_down())
    }

    async fn get(&self, _id: RecordId) -> Result<Option<Record>, StoreError> {
        Err(store_down())
    }

    async fn update(
        &self,
        _id: RecordId,
        _fields: &RecordFields,
    ) -> Result<Option<Record>, StoreError> {
        Err(store_down())
    }

    async fn delete(&self, _id: RecordId) -> Result<bool, StoreError> {
        Err(store_down())
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        Err(store_down())
    }
}

/// In-memory store whose inserts wait until the gate is opened.
pub struct GatedStore {
    pub inner: MemoryRecordStore,
    open: watch::Receiver<bool>,
}

impl GatedStore {
    /// Returns the store and the gate; send `true` to let inserts through.
    pub fn new() -> (Self, watch::Sender<bool>) {
        let (gate, open) = watch::channel(false);
        let store = Self {
            inner: MemoryRecordStore::new(),
            open,
        };
        (store, gate)
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn create(&self, fields: &RecordFields) -> Result<Record, StoreError> {
        let mut open = self.open.clone();
        let _ = open.wait_for(|open| *open).await;
        self.inner.create(fields).await
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        self.inner.get(id).await
    }

    async fn update(
        &self,
        id: RecordId,
        fields: &RecordFields,
    ) -> Result<Option<Record>, StoreError> {
        self.inner.update(id, fields).await
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.inner.list().await
    }
}

pub const HEADER: [&str; FIELD_COUNT] = [
    "first_name",
    "last_name",
    "company_name",
    "address",
    "city",
    "county",
    "postal",
    "phone",
    "email",
    "web",
];

fn write_sheet(sheet: &mut Worksheet, rows: &[Option<Vec<String>>]) {
    for (col, name) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    for (index, cells) in rows.iter().enumerate() {
        let Some(cells) = cells else { continue };
        for (col, value) in cells.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(index as u32 + 1, col as u16, value).unwrap();
            }
        }
    }
}

/// An `.xlsx` file with a `notes` sheet (one row) followed by a `uk-500`
/// sheet of five rows: row 2 has an empty `web` column and row 3 is blank.
pub fn uk_workbook() -> Vec<u8> {
    let mut blank_web = row("r2");
    blank_web[9].clear();

    let mut workbook = Workbook::new();
    let notes = workbook.add_worksheet();
    notes.set_name("notes").unwrap();
    write_sheet(notes, &[Some(row("note"))]);

    let uk = workbook.add_worksheet();
    uk.set_name("uk-500").unwrap();
    write_sheet(
        uk,
        &[
            Some(row("r1")),
            Some(blank_web),
            None,
            Some(row("r4")),
            Some(row("r5")),
        ],
    );

    workbook.save_to_buffer().unwrap()
}

pub struct Services {
    pub store: Arc<dyn RecordStore>,
    pub cache: Arc<RecordCache>,
    pub reader: RecordReader,
    pub writer: Arc<WriteCoordinator>,
}

pub fn services(
    store: Arc<dyn RecordStore>,
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
) -> Services {
    let cache = Arc::new(RecordCache::new(backend, ttl));
    Services {
        reader: RecordReader::new(store.clone(), cache.clone()),
        writer: Arc::new(WriteCoordinator::new(store.clone(), cache.clone())),
        store,
        cache,
    }
}

/// Memory store and memory cache with a five minute TTL.
pub fn memory_services() -> Services {
    services(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(MemoryCache::new(1000)),
        Duration::from_secs(300),
    )
}

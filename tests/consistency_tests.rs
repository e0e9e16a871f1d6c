//! Consistency tests for the read path, the write coordinator and ingestion.

mod common;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use record_cache::cache::{record_key, CacheBackend, MemoryCache, COLLECTION_KEY};
use record_cache::error::AppError;
use record_cache::ingest::{spawn_decoder, FileFormat, IngestionPipeline};
use record_cache::store::{MemoryRecordStore, RecordStore};
use uuid::Uuid;

use common::{fields, memory_services, row, services, FailingCache, FailingStore, NeverExpiringCache};

// == Write-then-read ==

#[tokio::test]
async fn test_read_after_create_sees_new_record() {
    let s = memory_services();

    let created = s.writer.create(fields("a")).await.unwrap();

    assert_eq!(s.reader.get_by_id(created.id).await.unwrap(), created);
}

#[tokio::test]
async fn test_read_after_update_sees_new_value() {
    let s = memory_services();
    let created = s.writer.create(fields("a")).await.unwrap();
    // Warm the entry with the old value
    s.reader.get_by_id(created.id).await.unwrap();

    let updated = s.writer.update(created.id, fields("b")).await.unwrap();

    let read = s.reader.get_by_id(created.id).await.unwrap();
    assert_eq!(read, updated);
    assert_eq!(read.fields, fields("b"));
    // Served from the overwritten entry, not a store round trip
    assert_eq!(s.cache.get_record(created.id).await.unwrap(), Some(updated));
}

// == Fail-open ==

#[tokio::test]
async fn test_cache_outage_is_invisible_to_callers() {
    let s = services(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(FailingCache),
        Duration::from_secs(300),
    );

    let a = s.writer.create(fields("a")).await.unwrap();
    let b = s.writer.create(fields("b")).await.unwrap();
    let b = s.writer.update(b.id, fields("c")).await.unwrap();

    assert_eq!(s.reader.get_all().await.unwrap(), vec![a.clone(), b.clone()]);
    assert_eq!(s.reader.get_by_id(b.id).await.unwrap(), b);
    assert!(s.writer.delete(a.id).await.unwrap());
    assert_eq!(s.reader.get_all().await.unwrap(), vec![b]);
    assert!(s.cache.stats().errors > 0);
}

#[tokio::test]
async fn test_store_outage_is_reported() {
    let backend = Arc::new(MemoryCache::new(100));
    let s = services(Arc::new(FailingStore), backend.clone(), Duration::from_secs(300));

    assert!(matches!(
        s.writer.create(fields("a")).await,
        Err(AppError::StoreUnavailable(_))
    ));
    assert!(matches!(
        s.reader.get_all().await,
        Err(AppError::StoreUnavailable(_))
    ));
    assert!(matches!(
        s.writer.delete(1).await,
        Err(AppError::StoreUnavailable(_))
    ));
    // Nothing reached the cache
    assert_eq!(backend.len().await, 0);
}

// == Idempotent delete ==

#[tokio::test]
async fn test_delete_twice_succeeds() {
    let s = memory_services();
    let created = s.writer.create(fields("a")).await.unwrap();

    assert!(s.writer.delete(created.id).await.unwrap());
    assert!(!s.writer.delete(created.id).await.unwrap());
    assert!(matches!(
        s.reader.get_by_id(created.id).await,
        Err(AppError::NotFound(_))
    ));
}

// == Partial batch ==

#[tokio::test]
async fn test_short_row_does_not_abort_batch() {
    let s = memory_services();
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "first_name,last_name,company_name,address,city,county,postal,phone,email,web").unwrap();
    for i in 1..=5 {
        let mut cells = row(&format!("r{i}"));
        if i == 3 {
            cells.truncate(6);
        }
        writeln!(file, "{}", cells.join(",")).unwrap();
    }
    file.flush().unwrap();

    let pipeline = IngestionPipeline::new(s.writer.clone());
    let rows = spawn_decoder(file.path().to_path_buf(), FileFormat::Csv, None);
    let summary = pipeline.run(Uuid::new_v4(), "people.csv", rows).await.unwrap();

    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].row, 3);

    let records = s.store.list().await.unwrap();
    assert_eq!(records.len(), 4);
    // Rows after the bad one were still processed
    assert_eq!(records[3].fields, fields("r5"));
}

#[tokio::test]
async fn test_ingestion_does_not_warm_collection() {
    let backend = Arc::new(NeverExpiringCache::default());
    let s = services(
        Arc::new(MemoryRecordStore::new()),
        backend.clone(),
        Duration::from_secs(300),
    );
    s.reader.get_all().await.unwrap();
    assert!(backend.contains(COLLECTION_KEY).await);

    s.writer.create(fields("a")).await.unwrap();

    assert!(!backend.contains(COLLECTION_KEY).await);
}

// == Collection invalidation ==

#[tokio::test]
async fn test_create_invalidates_collection() {
    let s = memory_services();
    s.writer.create(fields("a")).await.unwrap();
    assert_eq!(s.reader.get_all().await.unwrap().len(), 1);

    let created = s.writer.create(fields("b")).await.unwrap();

    let all = s.reader.get_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.contains(&created));
}

#[tokio::test]
async fn test_update_and_delete_invalidate_collection() {
    let s = memory_services();
    let a = s.writer.create(fields("a")).await.unwrap();
    let b = s.writer.create(fields("b")).await.unwrap();
    s.reader.get_all().await.unwrap();

    let a = s.writer.update(a.id, fields("a2")).await.unwrap();
    assert_eq!(s.reader.get_all().await.unwrap(), vec![a.clone(), b.clone()]);

    s.writer.delete(b.id).await.unwrap();
    assert_eq!(s.reader.get_all().await.unwrap(), vec![a]);
}

// == TTL expiry ==

#[tokio::test]
async fn test_expired_entry_reads_as_absent() {
    let backend = Arc::new(NeverExpiringCache::default());
    let store = Arc::new(MemoryRecordStore::new());
    let s = services(store.clone(), backend.clone(), Duration::from_millis(50));

    let created = s.writer.create(fields("a")).await.unwrap();
    // Change the store behind the cache's back
    store.update(created.id, &fields("b")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(backend.contains(&record_key(created.id)).await);
    assert_eq!(s.cache.get_record(created.id).await.unwrap(), None);

    let read = s.reader.get_by_id(created.id).await.unwrap();
    assert_eq!(read.fields, fields("b"));
}

// == Not found ==

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let backend = Arc::new(NeverExpiringCache::default());
    let s = services(
        Arc::new(MemoryRecordStore::new()),
        backend.clone(),
        Duration::from_secs(300),
    );

    for _ in 0..2 {
        assert!(matches!(
            s.reader.get_by_id(404).await,
            Err(AppError::NotFound(_))
        ));
    }
    // No negative caching
    assert!(!backend.contains(&record_key(404)).await);
    assert_eq!(s.cache.stats().misses, 2);
}

#[tokio::test]
async fn test_update_unknown_id_does_not_insert() {
    let s = memory_services();

    assert!(matches!(
        s.writer.update(7, fields("x")).await,
        Err(AppError::NotFound(_))
    ));
    assert!(s.store.list().await.unwrap().is_empty());
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_converge_to_a_written_value() {
    let s = memory_services();
    let created = s.writer.create(fields("start")).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let writer = s.writer.clone();
        handles.push(tokio::spawn(async move {
            writer.update(created.id, fields(&format!("w{i}"))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // The cached value is one of the writers' values, not necessarily the store's
    let cached = s.reader.get_by_id(created.id).await.unwrap();
    let written: Vec<_> = (0..8).map(|i| fields(&format!("w{i}"))).collect();
    assert!(written.contains(&cached.fields));

    let stored = s.store.get(created.id).await.unwrap().unwrap();
    assert!(written.contains(&stored.fields));
}

#[tokio::test]
async fn test_backend_entry_for_deleted_record_is_gone() {
    let backend = Arc::new(MemoryCache::new(100));
    let s = services(
        Arc::new(MemoryRecordStore::new()),
        backend.clone(),
        Duration::from_secs(300),
    );
    let created = s.writer.create(fields("a")).await.unwrap();
    assert!(backend.get(&record_key(created.id)).await.unwrap().is_some());

    s.writer.delete(created.id).await.unwrap();

    assert!(backend.get(&record_key(created.id)).await.unwrap().is_none());
}

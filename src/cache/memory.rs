//! In-memory cache backend
//!
//! HashMap storage with LRU capacity bound and TTL expiration, checked on every
//! read and swept periodically by the cleanup task.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::backend::CacheBackend;
use super::{CacheEntry, LruTracker, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::CacheError;

// == Cache Store ==
/// Synchronous cache engine; [`MemoryCache`] wraps it for async callers.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Entries dropped to stay under `max_entries`
    evictions: u64,
}

impl CacheStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries: max_entries.max(1),
            evictions: 0,
        }
    }

    // == Set ==
    /// Stores a value, overwriting any previous one and resetting its TTL.
    ///
    /// If the store is at capacity, the least recently used entry is evicted.
    pub fn set(&mut self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::Rejected(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::Rejected(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = self.lru.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.evictions += 1;
            }
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        self.lru.touch(key);

        Ok(())
    }

    // == Get ==
    /// Retrieves a live value. Expired entries are removed and reported absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;

        if entry.is_expired() {
            self.entries.remove(key);
            self.lru.remove(key);
            return None;
        }

        let value = entry.value.clone();
        self.lru.touch(key);
        Some(value)
    }

    // == Delete ==
    pub fn delete(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = super::entry::current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}

// == Memory Cache ==
/// Process-local [`CacheBackend`], used when no Redis URL is configured.
#[derive(Debug)]
pub struct MemoryCache {
    store: Mutex<CacheStore>,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Mutex::new(CacheStore::new(max_entries)),
        }
    }

    /// Drops expired entries; called by the cleanup task.
    pub async fn cleanup_expired(&self) -> usize {
        self.store.lock().await.cleanup_expired()
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn evictions(&self) -> u64 {
        self.store.lock().await.evictions()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.store.lock().await.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.store.lock().await.set(key, value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.store.lock().await.delete(key))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new(100);

        store.set("record:1", "value1".to_string(), TTL).unwrap();

        assert_eq!(store.get("record:1").as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new(100);
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_delete() {
        let mut store = CacheStore::new(100);

        store.set("record:1", "value1".to_string(), TTL).unwrap();
        assert!(store.delete("record:1"));
        assert!(!store.delete("record:1"));

        assert!(store.is_empty());
        assert!(store.get("record:1").is_none());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new(100);

        store.set("record:1", "value1".to_string(), TTL).unwrap();
        store.set("record:1", "value2".to_string(), TTL).unwrap();

        assert_eq!(store.get("record:1").as_deref(), Some("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = CacheStore::new(100);

        store
            .set("record:1", "value1".to_string(), Duration::from_millis(50))
            .unwrap();
        assert!(store.get("record:1").is_some());

        sleep(Duration::from_millis(80));

        assert!(store.get("record:1").is_none());
        assert!(store.is_empty(), "expired entry is dropped on read");
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = CacheStore::new(3);

        store.set("key1", "value1".to_string(), TTL).unwrap();
        store.set("key2", "value2".to_string(), TTL).unwrap();
        store.set("key3", "value3".to_string(), TTL).unwrap();

        // Access key1 so key2 becomes the oldest
        store.get("key1").unwrap();
        store.set("key4", "value4".to_string(), TTL).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.evictions(), 1);
        assert!(store.get("key1").is_some());
        assert!(store.get("key2").is_none());
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = CacheStore::new(100);

        store
            .set("key1", "value1".to_string(), Duration::from_millis(50))
            .unwrap();
        store.set("key2", "value2".to_string(), TTL).unwrap();

        sleep(Duration::from_millis(80));

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
    }

    #[test]
    fn test_store_key_too_long() {
        let mut store = CacheStore::new(100);
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = store.set(&long_key, "value".to_string(), TTL);
        assert!(matches!(result, Err(CacheError::Rejected(_))));
    }

    #[test]
    fn test_store_value_too_large() {
        let mut store = CacheStore::new(100);
        let large_value = "x".repeat(MAX_VALUE_SIZE + 1);

        let result = store.set("key", large_value, TTL);
        assert!(matches!(result, Err(CacheError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_memory_cache_backend_contract() {
        let cache = MemoryCache::new(10);

        assert_eq!(cache.get("record:1").await.unwrap(), None);
        cache.set("record:1", "v".to_string(), TTL).await.unwrap();
        assert_eq!(cache.get("record:1").await.unwrap().as_deref(), Some("v"));
        assert!(cache.delete("record:1").await.unwrap());
        assert!(!cache.delete("record:1").await.unwrap());
        assert_eq!(cache.len().await, 0);
    }
}

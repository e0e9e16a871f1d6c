//! Cache Module
//!
//! The cache adapter ([`RecordCache`]) and the backends it can sit on: an
//! in-process TTL/LRU store and Redis.

mod adapter;
mod backend;
mod entry;
mod lru;
mod memory;
mod redis_client;
mod stats;


// Re-export public types
pub use adapter::{record_key, RecordCache, COLLECTION_KEY};
pub use backend::CacheBackend;
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use memory::{CacheStore, MemoryCache};
pub use redis_client::RedisCache;
pub use stats::{CacheStats, CacheStatsSnapshot};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 8 * 1024 * 1024; // 8 MB

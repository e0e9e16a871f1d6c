//! Cache backend contract
//!
//! A key-value store with per-key expiry. Implementations report connectivity
//! problems as `Err`; an absent or expired key is `Ok(None)`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the raw value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value, expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Returns whether a value was present.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

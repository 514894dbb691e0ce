//! # Cache Backends
//!
//! Backend implementations behind the shared [`CacheStore`] facade: Redis
//! for production and an in-memory map for tests and local development.
//! Backends report failures as errors; the facade is what absorbs them.
//!
//! [`CacheStore`]: crate::caching::CacheStore

pub mod memory;
pub mod redis_backend;

pub use memory::InMemoryBackend;
pub use redis_backend::{RedisBackend, RedisBackendConfig};

use crate::caching::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Contract every cache backend implements
///
/// All values are opaque bytes; TTLs are mandatory on every write so nothing
/// can be stored without an expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value, `None` on absence or expiry
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value with a TTL, overwriting any existing entry
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Delete a key, returning whether it existed
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Delete every key under a prefix, returning the count deleted
    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<usize>;

    /// Check whether a key exists
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Atomically increment a counter key, setting the TTL when the key is
    /// created; returns the post-increment count
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> CacheResult<u64>;

    /// Remaining TTL for a key, `None` when the key does not exist
    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;

    /// Round-trip liveness probe
    async fn ping(&self) -> CacheResult<()>;
}

//! # Redis Cache Backend
//!
//! Redis-backed implementation of [`CacheBackend`] over a shared
//! `ConnectionManager`. The connection is lazy: nothing connects until the
//! first command, and concurrent first commands share one in-flight connect
//! attempt instead of racing. This backend owns the only physical connection
//! in the process; every higher component reaches Redis through it.

use super::CacheBackend;
use crate::caching::{CacheError, CacheResult};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Redis backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisBackendConfig {
    /// Redis connection URL
    pub url: String,

    /// Prefix applied to every key
    pub key_prefix: String,

    /// Bound on the lazy connection attempt
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: String::new(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Redis cache backend with lazy, single-flight connection
pub struct RedisBackend {
    config: RedisBackendConfig,
    client: Client,

    /// Established connection, `None` until first use. The mutex serializes
    /// connect attempts; commands clone the manager out and run unlocked.
    connection: Mutex<Option<ConnectionManager>>,
}

impl RedisBackend {
    /// Create a Redis backend; does not connect yet
    pub fn new(config: RedisBackendConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.as_str()).map_err(CacheError::Redis)?;
        Ok(Self {
            config,
            client,
            connection: Mutex::new(None),
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Get the shared connection, establishing it on first use
    ///
    /// Holding the mutex across the connect bounds concurrent first-use
    /// callers to a single attempt; they all observe its outcome.
    async fn manager(&self) -> CacheResult<ConnectionManager> {
        let mut slot = self.connection.lock().await;
        if let Some(manager) = slot.as_ref() {
            return Ok(manager.clone());
        }

        let connect = ConnectionManager::new(self.client.clone());
        let manager = tokio::time::timeout(self.config.connect_timeout, connect)
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(CacheError::Redis)?;

        info!("Cache store connected to {}", self.config.url);
        *slot = Some(manager.clone());
        Ok(manager)
    }

    /// Collect all keys under a prefix via SCAN
    async fn scan_prefix(&self, conn: &mut ConnectionManager, prefix: &str) -> CacheResult<Vec<String>> {
        let pattern = format!("{}*", self.full_key(prefix));
        let mut cursor = 0u64;
        let mut all_keys = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(1000)
                .query_async(conn)
                .await
                .map_err(CacheError::Redis)?;

            all_keys.extend(keys);

            if new_cursor == 0 {
                break;
            }
            cursor = new_cursor;
        }

        Ok(all_keys)
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.manager().await?;
        let value: Option<Vec<u8>> = conn
            .get(self.full_key(key))
            .await
            .map_err(CacheError::Redis)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.manager().await?;
        conn.set_ex::<_, _, ()>(self.full_key(key), value, ttl.as_secs())
            .await
            .map_err(CacheError::Redis)?;
        debug!("Set cache key {} with TTL {:?}", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.manager().await?;
        let deleted: i64 = conn
            .del(self.full_key(key))
            .await
            .map_err(CacheError::Redis)?;
        Ok(deleted > 0)
    }

    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let mut conn = self.manager().await?;
        let keys = self.scan_prefix(&mut conn, prefix).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: i64 = conn.del(&keys).await.map_err(CacheError::Redis)?;
        debug!("Deleted {} keys under prefix {}", deleted, prefix);
        Ok(deleted as usize)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.manager().await?;
        let exists: bool = conn
            .exists(self.full_key(key))
            .await
            .map_err(CacheError::Redis)?;
        Ok(exists)
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> CacheResult<u64> {
        let mut conn = self.manager().await?;
        let full_key = self.full_key(key);
        let count: u64 = conn.incr(&full_key, 1).await.map_err(CacheError::Redis)?;
        if count == 1 {
            conn.expire::<_, ()>(&full_key, ttl.as_secs() as i64)
                .await
                .map_err(CacheError::Redis)?;
        }
        Ok(count)
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let mut conn = self.manager().await?;
        let seconds: i64 = conn
            .ttl(self.full_key(key))
            .await
            .map_err(CacheError::Redis)?;
        // -2 means no key, -1 means no expiry; neither carries a duration
        if seconds < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(seconds as u64)))
        }
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.manager().await?;
        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::Redis)?;
        if response == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Store {
                message: format!("Unexpected PING response: {}", response),
            })
        }
    }
}

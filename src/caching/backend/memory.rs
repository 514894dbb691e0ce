//! # In-Memory Cache Backend
//!
//! A process-local backend over a concurrent map with per-entry expiry.
//! Used by the test suites and as a local development stand-in; expired
//! entries are dropped lazily on access.

use super::CacheBackend;
use crate::caching::{CacheError, CacheResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl StoredEntry {
    fn new(value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory cache backend
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: Arc<DashMap<String, StoredEntry>>,
}

impl InMemoryBackend {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.value().is_expired()).count()
    }

    /// Whether the backend holds no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        // The read guard must drop before the expired-entry removal below
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        self.entries
            .insert(key.to_string(), StoredEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        match self.entries.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix) && !e.value().is_expired())
            .map(|e| e.key().clone())
            .collect();

        let mut deleted = 0;
        for key in keys {
            if self.entries.remove(&key).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> CacheResult<u64> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredEntry::new(b"0".to_vec(), ttl));

        if entry.is_expired() {
            *entry = StoredEntry::new(b"0".to_vec(), ttl);
        }

        let current: u64 = std::str::from_utf8(&entry.value)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| CacheError::Store {
                message: format!("Counter key holds a non-numeric value: {}", key),
            })?;

        let next = current + 1;
        entry.value = next.to_string().into_bytes();
        Ok(next)
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                Ok(Some(entry.expires_at.saturating_duration_since(Instant::now())))
            }
            _ => Ok(None),
        }
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_set_get_delete() {
        let backend = InMemoryBackend::new();

        backend.set("k1", b"v1", Duration::from_secs(60)).await.unwrap();
        assert_eq!(backend.get("k1").await.unwrap(), Some(b"v1".to_vec()));
        assert!(backend.exists("k1").await.unwrap());

        assert!(backend.delete("k1").await.unwrap());
        assert!(!backend.exists("k1").await.unwrap());
        assert!(!backend.delete("k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let backend = InMemoryBackend::new();

        backend.set("short", b"v", Duration::from_millis(20)).await.unwrap();
        assert!(backend.exists("short").await.unwrap());

        sleep(Duration::from_millis(40)).await;
        assert_eq!(backend.get("short").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_by_prefix() {
        let backend = InMemoryBackend::new();

        backend.set("search:a", b"1", Duration::from_secs(60)).await.unwrap();
        backend.set("search:b", b"2", Duration::from_secs(60)).await.unwrap();
        backend.set("product:p1", b"3", Duration::from_secs(60)).await.unwrap();

        let deleted = backend.delete_by_prefix("search:").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(!backend.exists("search:a").await.unwrap());
        assert!(backend.exists("product:p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_incr_creates_and_counts() {
        let backend = InMemoryBackend::new();

        assert_eq!(backend.incr_with_ttl("rl:auth:ip", Duration::from_secs(60)).await.unwrap(), 1);
        assert_eq!(backend.incr_with_ttl("rl:auth:ip", Duration::from_secs(60)).await.unwrap(), 2);
        assert_eq!(backend.incr_with_ttl("rl:auth:ip", Duration::from_secs(60)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_incr_resets_after_window_expiry() {
        let backend = InMemoryBackend::new();

        assert_eq!(backend.incr_with_ttl("rl:w", Duration::from_millis(20)).await.unwrap(), 1);
        assert_eq!(backend.incr_with_ttl("rl:w", Duration::from_millis(20)).await.unwrap(), 2);

        sleep(Duration::from_millis(40)).await;
        assert_eq!(backend.incr_with_ttl("rl:w", Duration::from_millis(20)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ttl_reporting() {
        let backend = InMemoryBackend::new();

        backend.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        let remaining = backend.ttl("k").await.unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(50));

        assert_eq!(backend.ttl("absent").await.unwrap(), None);
    }
}

//! # Cache Store Facade
//!
//! The single shared handle every cache and rate-limit component goes
//! through. The facade owns the failure policy of the whole layer: no
//! operation returns an error across this boundary. Backend failures and
//! timeouts degrade to "miss" / "no-op" / `false`, are logged, and flip the
//! connection-health flag that the rate limiter consults for its fallback
//! decision. A later successful command flips the flag back.

use crate::caching::backend::CacheBackend;
use crate::caching::{CacheError, CacheResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on a single cache command round-trip
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Shared cache store with absorbed failures and health tracking
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    healthy: AtomicBool,
    command_timeout: Duration,
}

impl CacheStore {
    /// Create a store over a backend with the default command timeout
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_timeout(backend, DEFAULT_COMMAND_TIMEOUT)
    }

    /// Create a store with an explicit command timeout
    ///
    /// A command that exceeds the bound is treated identically to a store
    /// outage: the operation degrades and the store is marked unhealthy, so
    /// a hung backend can never stall a request indefinitely.
    pub fn with_timeout(backend: Arc<dyn CacheBackend>, command_timeout: Duration) -> Self {
        Self {
            backend,
            healthy: AtomicBool::new(true),
            command_timeout,
        }
    }

    /// Connection health as of the last completed command
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    /// Run a liveness probe against the backend and update health
    pub async fn ping(&self) -> bool {
        let result = tokio::time::timeout(self.command_timeout, self.backend.ping()).await;
        match result {
            Ok(Ok(())) => {
                self.healthy.store(true, Ordering::Relaxed);
                true
            }
            Ok(Err(e)) => {
                self.mark_unhealthy("ping", &e);
                false
            }
            Err(_) => {
                self.mark_unhealthy("ping", &CacheError::Timeout);
                false
            }
        }
    }

    /// Get a value; absence, failure, and timeout all read as a miss
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.run("get", key, self.backend.get(key)).await {
            Some(value) => value,
            None => None,
        }
    }

    /// Set a value with a TTL; failure is logged and dropped
    pub async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) {
        if self.run("set", key, self.backend.set(key, value, ttl)).await.is_some() {
            debug!("Cached {} with TTL {:?}", key, ttl);
        }
    }

    /// Delete a key; returns whether an entry was removed
    pub async fn delete(&self, key: &str) -> bool {
        self.run("delete", key, self.backend.delete(key))
            .await
            .unwrap_or(false)
    }

    /// Delete every key under a prefix; returns the count removed
    pub async fn delete_by_prefix(&self, prefix: &str) -> usize {
        self.run("delete_by_prefix", prefix, self.backend.delete_by_prefix(prefix))
            .await
            .unwrap_or(0)
    }

    /// Check whether a key exists
    pub async fn exists(&self, key: &str) -> bool {
        self.run("exists", key, self.backend.exists(key))
            .await
            .unwrap_or(false)
    }

    /// Atomically increment a windowed counter
    ///
    /// `None` signals the caller that the shared store could not count this
    /// event and a local fallback should decide instead.
    pub async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Option<u64> {
        self.run("incr", key, self.backend.incr_with_ttl(key, ttl)).await
    }

    /// Remaining TTL of a key, `None` when absent or on failure
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        self.run("ttl", key, self.backend.ttl(key)).await.flatten()
    }

    /// Execute a backend command under the timeout bound, absorbing failure
    /// and settling the health flag from the outcome
    async fn run<T>(
        &self,
        op: &str,
        key: &str,
        fut: impl std::future::Future<Output = CacheResult<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(Ok(value)) => {
                self.healthy.store(true, Ordering::Relaxed);
                Some(value)
            }
            Ok(Err(e)) => {
                self.mark_unhealthy(op, &e);
                None
            }
            Err(_) => {
                warn!("Cache {} timed out for key {}", op, key);
                self.healthy.store(false, Ordering::Relaxed);
                None
            }
        }
    }

    fn mark_unhealthy(&self, op: &str, error: &CacheError) {
        if self.healthy.swap(false, Ordering::Relaxed) {
            warn!("Cache store marked unhealthy after {} failure: {}", op, error);
        } else {
            debug!("Cache {} failed while store unhealthy: {}", op, error);
        }
    }
}

//! # Rate Limiting
//!
//! Fixed-window request limiting per (policy, client IP), counted in the
//! shared cache store under `rl:<policy>:<ip>`. The window is a TTL-expiring
//! counter: the first increment of a window creates the key with the policy
//! window as its TTL, and expiry is the reset.
//!
//! Four policies are statically defined and immutable at runtime. When the
//! cache store is unhealthy the limiter falls back to an in-process window
//! per key (per instance, reset on restart) so a store outage never turns
//! into a denial of service against legitimate traffic; health is rechecked
//! on every call, so shared counting resumes as soon as the store recovers.
//! The store's bounded command timeout guarantees a hung cache command reads
//! as an outage instead of stalling the request pipeline.

pub mod admin;

pub use admin::{RateLimitAdminRouter, RateLimitAdminState};

use crate::caching::keys::{self, RATE_LIMIT_PREFIX};
use crate::caching::store::CacheStore;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Sentinel returned by [`RateLimiter::remaining`] when no window entry
/// exists: the full quota is available, as opposed to zero remaining
pub const REMAINING_UNKNOWN: i64 = -1;

/// A fixed-window rate-limit policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Policy {
    /// Policy name as reported by the admin surface
    pub name: &'static str,

    /// Key segment between `rl:` and the client IP
    pub key_prefix: &'static str,

    /// Window duration; also the counter key's TTL
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// Maximum requests allowed inside one window
    pub max_requests: u32,
}

/// General API traffic: 100 requests per 15 minutes
pub const API: Policy = Policy {
    name: "api",
    key_prefix: "api",
    window: Duration::from_secs(900),
    max_requests: 100,
};

/// Login and credential endpoints: 5 requests per 15 minutes
pub const AUTH: Policy = Policy {
    name: "auth",
    key_prefix: "auth",
    window: Duration::from_secs(900),
    max_requests: 5,
};

/// Search endpoints: 30 requests per minute
pub const SEARCH: Policy = Policy {
    name: "search",
    key_prefix: "search",
    window: Duration::from_secs(60),
    max_requests: 30,
};

/// Order creation: 10 requests per hour
pub const ORDER: Policy = Policy {
    name: "order",
    key_prefix: "order",
    window: Duration::from_secs(3600),
    max_requests: 10,
};

/// All policies, in admin reporting order
pub const ALL_POLICIES: [Policy; 4] = [API, AUTH, SEARCH, ORDER];

impl Policy {
    /// Counter key for a client under this policy
    pub fn key(&self, client_ip: &str) -> String {
        keys::rate_limit_key(self.key_prefix, client_ip)
    }
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,

    /// Requests left in the current window after this one
    pub remaining: u32,

    pub limit: u32,

    /// How long a denied client should wait before retrying
    pub retry_after: Option<Duration>,
}

/// In-process fallback window for degraded mode
#[derive(Debug)]
struct LocalWindow {
    count: u32,
    started: Instant,
}

/// Fixed-window rate limiter over the shared cache store
pub struct RateLimiter {
    store: Arc<CacheStore>,

    /// Fallback windows, keyed like the store counters
    local: DashMap<String, LocalWindow>,

    /// Single-flight permit for the background health probe
    probe: Arc<tokio::sync::Mutex<()>>,
}

impl RateLimiter {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self {
            store,
            local: DashMap::new(),
            probe: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Count this request against the policy window and decide
    ///
    /// Increment-then-compare: the counter is bumped first and the request
    /// denied when the new count exceeds the maximum. Denied requests stay
    /// counted; there is no decrement back. Never errors and never hangs:
    /// on store outage (or mid-call failure) the decision comes from the
    /// local fallback window.
    pub async fn check_and_increment(&self, policy: &Policy, client_ip: &str) -> RateLimitDecision {
        let key = policy.key(client_ip);

        if self.store.is_healthy() {
            if let Some(count) = self.store.incr_with_ttl(&key, policy.window).await {
                return self.decide(policy, count);
            }
            warn!(
                "Shared rate-limit counting unavailable for {}, using local window",
                key
            );
        } else {
            // Deciding locally issues no shared command that could notice a
            // recovered store, so kick a non-blocking probe to flip the
            // health flag back once the store answers again
            self.spawn_health_probe();
        }

        self.check_local(policy, &key)
    }

    /// Probe store health in the background, at most one probe in flight
    fn spawn_health_probe(&self) {
        if let Ok(permit) = Arc::clone(&self.probe).try_lock_owned() {
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                let _permit = permit;
                store.ping().await;
            });
        }
    }

    /// Remaining quota for a client under a policy
    ///
    /// Returns [`REMAINING_UNKNOWN`] (-1) when no window entry exists,
    /// meaning the full quota is available; 0 means the quota is spent.
    pub async fn remaining(&self, policy: &Policy, client_ip: &str) -> i64 {
        let key = policy.key(client_ip);

        if self.store.is_healthy() {
            match self.store.get(&key).await {
                Some(raw) => {
                    let count: u64 = std::str::from_utf8(&raw)
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    return i64::from(policy.max_requests).saturating_sub(count as i64).max(0);
                }
                None => return REMAINING_UNKNOWN,
            }
        }

        match self.local.get(&key) {
            Some(window) if window.started.elapsed() < policy.window => {
                i64::from(policy.max_requests.saturating_sub(window.count))
            }
            _ => REMAINING_UNKNOWN,
        }
    }

    /// Seconds until a client's window resets, `None` when no window exists
    pub async fn reset_in(&self, policy: &Policy, client_ip: &str) -> Option<Duration> {
        let key = policy.key(client_ip);

        if self.store.is_healthy() {
            return self.store.ttl(&key).await;
        }

        self.local.get(&key).and_then(|window| {
            let elapsed = window.started.elapsed();
            if elapsed < policy.window {
                Some(policy.window - elapsed)
            } else {
                None
            }
        })
    }

    /// Administrative reset: delete every counter in the rate-limit
    /// namespace, shared and local, returning the shared count deleted
    pub async fn clear_all(&self) -> usize {
        let cleared = self.store.delete_by_prefix(RATE_LIMIT_PREFIX).await;
        self.local.clear();
        debug!("Cleared {} rate-limit counters", cleared);
        cleared
    }

    fn decide(&self, policy: &Policy, count: u64) -> RateLimitDecision {
        let allowed = count <= u64::from(policy.max_requests);
        RateLimitDecision {
            allowed,
            remaining: u32::try_from(u64::from(policy.max_requests).saturating_sub(count))
                .unwrap_or(0),
            limit: policy.max_requests,
            retry_after: if allowed { None } else { Some(policy.window) },
        }
    }

    /// Fixed-window counting against the in-process fallback map
    fn check_local(&self, policy: &Policy, key: &str) -> RateLimitDecision {
        let mut window = self.local.entry(key.to_string()).or_insert_with(|| LocalWindow {
            count: 0,
            started: Instant::now(),
        });

        if window.started.elapsed() >= policy.window {
            window.count = 0;
            window.started = Instant::now();
        }

        window.count += 1;
        let count = u64::from(window.count);
        drop(window);

        self.decide(policy, count)
    }
}

//! # Caching System Module
//!
//! This module provides the cache layer for the storefront backend: a single
//! shared [`CacheStore`] over a Redis (or in-memory) backend, typed caches
//! per key namespace, centralized invalidation dispatch, webhook
//! deduplication, and the single-use OTP store.
//!
//! ## Architecture
//! The layer is built around the namespace invariant: a key's prefix fully
//! determines its TTL class and its invalidation triggers.
//! 1. **Backends**: Redis and in-memory implementations of [`CacheBackend`]
//! 2. **CacheStore**: the never-throws facade with health tracking and
//!    bounded command timeouts
//! 3. **Typed caches**: product, search, and cart caches with explicit
//!    snapshot types per namespace
//! 4. **Invalidation**: a single dispatcher mapping change events to the
//!    keys and namespaces they stale
//! 5. **Dedup/OTP**: webhook idempotency markers and single-use codes
//!
//! Every operation here is advisory: backend failure degrades to a miss or a
//! no-op, logs, and never propagates into the request path.

pub mod admin;
pub mod backend;
pub mod cart_cache;
pub mod context;
pub mod invalidation;
pub mod keys;
pub mod otp;
pub mod product_cache;
pub mod search_cache;
pub mod snapshots;
pub mod store;
pub mod webhook;

pub use admin::{CacheAdminRouter, CacheAdminState};
pub use backend::{CacheBackend, InMemoryBackend, RedisBackend, RedisBackendConfig};
pub use cart_cache::CartCache;
pub use context::CacheContext;
pub use invalidation::{ChangeEvent, InvalidationDispatcher};
pub use keys::SearchKey;
pub use otp::OtpStore;
pub use product_cache::ProductCache;
pub use search_cache::SearchCache;
pub use snapshots::{CartItemSnapshot, CartSnapshot, ProductSnapshot, SearchResultPage, SuggestionList};
pub use store::CacheStore;
pub use webhook::WebhookDeduplicator;

/// Cache operation result, internal to the caching layer
///
/// Errors of this type are absorbed inside [`CacheStore`]; callers above the
/// store only ever see `Option`s and `bool`s.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific error types
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache store error: {message}")]
    Store { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache operation timeout")]
    Timeout,

    #[error("Cache not available")]
    Unavailable,
}

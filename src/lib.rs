//! # Storefront Cache Core
//!
//! Cache-consistency and rate-limiting layer for the storefront e-commerce
//! backend. The crate owns what is cached, under which key, for how long,
//! and when cached state is invalidated as the underlying records mutate;
//! it also owns fixed-window rate limiting backed by the same cache store.
//!
//! ## Module Overview
//!
//! - [`core`]: configuration loading/validation and the error taxonomy
//! - [`caching`]: the shared cache store, typed per-namespace caches,
//!   centralized invalidation dispatch, webhook dedup, and the OTP store
//! - [`rate_limit`]: fixed-window policies, the limiter with its degraded
//!   in-process fallback, and the admin operations layered on it
//! - [`commerce`]: product/cart/order flows that exercise the invalidation
//!   discipline against record-store repository traits
//!
//! ## Failure Policy
//!
//! Cache operations are advisory end to end: a store outage degrades reads
//! to misses, writes to no-ops, and rate limiting to in-process counting.
//! Nothing in this crate turns a cache failure into a request failure.

pub mod caching;
pub mod commerce;
pub mod core;
pub mod rate_limit;

pub use caching::{CacheContext, CacheStore};
pub use core::{AppConfig, CoreError, CoreResult};
pub use rate_limit::RateLimiter;

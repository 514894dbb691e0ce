//! # Cache Key Schema
//!
//! Key namespaces and TTL classes for every kind of cached value. The prefix
//! of a key fully determines its TTL class and which invalidation events
//! clear it, so all key construction lives here rather than at call sites.
//!
//! Namespaces: `product:{id}`, `cart:{userId}`, `search:{digest}`,
//! `suggestions:{prefix}`, `webhook:{eventId}`, `otp:{email}`,
//! `rl:{policy}:{clientIp}`.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// TTL for cached product snapshots (30 minutes)
pub const PRODUCT_TTL: Duration = Duration::from_secs(1800);

/// TTL for cached search result pages and suggestion lists (5 minutes)
pub const SEARCH_TTL: Duration = Duration::from_secs(300);

/// TTL for cached carts (2 days)
pub const CART_TTL: Duration = Duration::from_secs(172_800);

/// TTL for webhook dedup markers (24 hours)
pub const WEBHOOK_TTL: Duration = Duration::from_secs(86_400);

/// TTL for single-use OTP codes (5 minutes)
pub const OTP_TTL: Duration = Duration::from_secs(300);

/// Namespace prefix for product snapshots
pub const PRODUCT_PREFIX: &str = "product:";

/// Namespace prefix for cart snapshots
pub const CART_PREFIX: &str = "cart:";

/// Namespace prefix for search result pages
pub const SEARCH_PREFIX: &str = "search:";

/// Namespace prefix for suggestion lists
pub const SUGGESTIONS_PREFIX: &str = "suggestions:";

/// Namespace prefix for webhook dedup markers
pub const WEBHOOK_PREFIX: &str = "webhook:";

/// Namespace prefix for OTP codes
pub const OTP_PREFIX: &str = "otp:";

/// Namespace prefix for rate-limit window counters
pub const RATE_LIMIT_PREFIX: &str = "rl:";

/// Key for a single product snapshot
pub fn product_key(product_id: &str) -> String {
    format!("{}{}", PRODUCT_PREFIX, product_id)
}

/// Key for a user's cart snapshot
pub fn cart_key(user_id: &str) -> String {
    format!("{}{}", CART_PREFIX, user_id)
}

/// Key for a webhook dedup marker
pub fn webhook_key(event_id: &str) -> String {
    format!("{}{}", WEBHOOK_PREFIX, event_id)
}

/// Key for an OTP code
pub fn otp_key(email: &str) -> String {
    format!("{}{}", OTP_PREFIX, email.trim().to_lowercase())
}

/// Key for a suggestion list, normalized on the typed prefix
pub fn suggestions_key(prefix: &str) -> String {
    format!("{}{}", SUGGESTIONS_PREFIX, prefix.trim().to_lowercase())
}

/// Key for a rate-limit window counter
pub fn rate_limit_key(policy_prefix: &str, client_ip: &str) -> String {
    format!("{}{}:{}", RATE_LIMIT_PREFIX, policy_prefix, client_ip)
}

/// Normalized search query tuple
///
/// The cache key is a SHA-256 digest of the normalized tuple so that
/// equivalent queries (case or whitespace differences in the text) share an
/// entry and arbitrary filter values cannot produce oversized keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchKey {
    query: String,
    category: Option<String>,
    brand: Option<String>,
    min_price: Option<u64>,
    max_price: Option<u64>,
    page: u32,
    limit: u32,
}

impl SearchKey {
    /// Build a normalized search key from raw query parameters
    pub fn new(
        query: &str,
        category: Option<&str>,
        brand: Option<&str>,
        min_price: Option<u64>,
        max_price: Option<u64>,
        page: u32,
        limit: u32,
    ) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            category: category.map(|c| c.trim().to_lowercase()),
            brand: brand.map(|b| b.trim().to_lowercase()),
            min_price,
            max_price,
            page,
            limit,
        }
    }

    /// The full cache key for this query tuple
    pub fn cache_key(&self) -> String {
        let serialized = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        format!("{}{}", SEARCH_PREFIX, hex::encode(hasher.finalize()))
    }
}

//! # Cart Cache
//!
//! A user's formatted cart under `cart:<userId>` with the 2-day TTL class.
//! Every mutating cart operation invalidates the entry, including failed
//! ones: on uncertainty the cache is dropped rather than risk serving a
//! stale cart. Cross-invalidation of the products a mutation touches is
//! handled by the invalidation dispatcher, not here.

use crate::caching::keys::{self, CART_TTL};
use crate::caching::snapshots::{self, CartSnapshot};
use crate::caching::store::CacheStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache of formatted carts by user id
#[derive(Clone)]
pub struct CartCache {
    store: Arc<CacheStore>,
}

impl CartCache {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// Look up a user's cached cart
    pub async fn get(&self, user_id: &str) -> Option<CartSnapshot> {
        let key = keys::cart_key(user_id);
        let bytes = self.store.get(&key).await?;

        match snapshots::decode(&bytes) {
            Ok(cart) => {
                debug!("Cart cache hit for user {}", user_id);
                Some(cart)
            }
            Err(e) => {
                warn!("Dropping undecodable cart cache entry {}: {}", key, e);
                self.store.delete(&key).await;
                None
            }
        }
    }

    /// Store a user's formatted cart, overwriting any existing entry
    pub async fn put(&self, user_id: &str, cart: &CartSnapshot) {
        match snapshots::encode(cart) {
            Ok(bytes) => {
                self.store
                    .set_with_ttl(&keys::cart_key(user_id), &bytes, CART_TTL)
                    .await;
            }
            Err(e) => warn!("Failed to serialize cart for user {}: {}", user_id, e),
        }
    }

    /// Drop a user's cached cart
    pub async fn invalidate(&self, user_id: &str) -> bool {
        let deleted = self.store.delete(&keys::cart_key(user_id)).await;
        if deleted {
            debug!("Invalidated cart cache for user {}", user_id);
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::backend::InMemoryBackend;
    use crate::caching::snapshots::CartItemSnapshot;

    fn cache() -> CartCache {
        CartCache::new(Arc::new(CacheStore::new(Arc::new(InMemoryBackend::new()))))
    }

    fn cart(user_id: &str) -> CartSnapshot {
        CartSnapshot {
            user_id: user_id.to_string(),
            items: vec![CartItemSnapshot {
                product_id: "p1".to_string(),
                name: "Desk Lamp".to_string(),
                image_url: "https://cdn.example.com/lamp.jpg".to_string(),
                unit_price: 2500,
                quantity: 2,
                line_total: 5000,
            }],
            total_amount: 5000,
            total_items: 1,
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = cache();
        cache.put("u1", &cart("u1")).await;
        assert_eq!(cache.get("u1").await, Some(cart("u1")));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = cache();
        cache.put("u1", &cart("u1")).await;

        assert!(cache.invalidate("u1").await);
        assert_eq!(cache.get("u1").await, None);
        assert!(!cache.invalidate("u1").await);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let cache = cache();
        cache.put("u1", &cart("u1")).await;
        cache.put("u2", &cart("u2")).await;

        cache.invalidate("u1").await;
        assert_eq!(cache.get("u2").await, Some(cart("u2")));
    }
}

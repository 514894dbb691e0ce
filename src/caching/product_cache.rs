//! # Product Cache
//!
//! Single-product lookups under `product:<id>` with the 30-minute TTL class.
//! Invalidation must run synchronously before responding to an explicit
//! product update or any stock-field write; the TTL bounds staleness if an
//! invalidation call is ever missed.

use crate::caching::keys::{self, PRODUCT_TTL};
use crate::caching::snapshots::{self, ProductSnapshot};
use crate::caching::store::CacheStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache of product snapshots by id
#[derive(Clone)]
pub struct ProductCache {
    store: Arc<CacheStore>,
}

impl ProductCache {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// Look up a cached product snapshot
    ///
    /// A hit returns a plain data snapshot. An entry that fails to decode is
    /// treated as corruption: dropped and reported as a miss.
    pub async fn get(&self, product_id: &str) -> Option<ProductSnapshot> {
        let key = keys::product_key(product_id);
        let bytes = self.store.get(&key).await?;

        match snapshots::decode(&bytes) {
            Ok(snapshot) => {
                debug!("Product cache hit for {}", product_id);
                Some(snapshot)
            }
            Err(e) => {
                warn!("Dropping undecodable product cache entry {}: {}", key, e);
                self.store.delete(&key).await;
                None
            }
        }
    }

    /// Store a product snapshot, overwriting any existing entry
    pub async fn put(&self, product: &ProductSnapshot) {
        match snapshots::encode(product) {
            Ok(bytes) => {
                self.store
                    .set_with_ttl(&keys::product_key(&product.id), &bytes, PRODUCT_TTL)
                    .await;
            }
            Err(e) => warn!("Failed to serialize product {} for cache: {}", product.id, e),
        }
    }

    /// Drop the cached snapshot for a product
    pub async fn invalidate(&self, product_id: &str) -> bool {
        let deleted = self.store.delete(&keys::product_key(product_id)).await;
        if deleted {
            debug!("Invalidated product cache for {}", product_id);
        }
        deleted
    }
}

//! # Product Service
//!
//! Product reads and writes with their cache discipline: reads probe the
//! product cache and populate it on miss; writes go to the record store
//! first and dispatch invalidation only after the store confirms the write.

use super::records::{ProductPatch, ProductRecord, ProductRepository};
use crate::caching::invalidation::{ChangeEvent, InvalidationDispatcher};
use crate::caching::product_cache::ProductCache;
use crate::caching::snapshots::ProductSnapshot;
use crate::core::error::CoreResult;
use std::sync::Arc;
use tracing::debug;

/// Product flows over the record store and product cache
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    cache: ProductCache,
    invalidation: InvalidationDispatcher,
}

impl ProductService {
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        cache: ProductCache,
        invalidation: InvalidationDispatcher,
    ) -> Self {
        Self {
            repository,
            cache,
            invalidation,
        }
    }

    /// Look up a product, serving from cache when possible
    ///
    /// On a store outage the cache reads as a miss and the lookup falls
    /// through to the record store; the request path never notices.
    pub async fn get_product(&self, product_id: &str) -> CoreResult<Option<ProductSnapshot>> {
        if let Some(snapshot) = self.cache.get(product_id).await {
            return Ok(Some(snapshot));
        }

        match self.repository.find_by_id(product_id).await? {
            Some(record) => {
                let snapshot = record.snapshot();
                self.cache.put(&snapshot).await;
                debug!("Loaded product {} from record store", product_id);
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Update a product and invalidate what the write stales
    ///
    /// Invalidation runs after the confirmed write and before returning, so
    /// the response is never sent while a known-stale entry survives.
    pub async fn update_product(
        &self,
        product_id: &str,
        patch: ProductPatch,
    ) -> CoreResult<Option<ProductSnapshot>> {
        let updated = self.repository.update_by_id(product_id, patch).await?;

        match updated {
            Some(record) => {
                self.invalidation
                    .dispatch(ChangeEvent::ProductUpdated {
                        product_id: product_id.to_string(),
                    })
                    .await;
                Ok(Some(record.snapshot()))
            }
            None => Ok(None),
        }
    }

    /// Create a product; search caches no longer reflect the full catalog
    pub async fn create_product(&self, record: ProductRecord) -> CoreResult<ProductSnapshot> {
        let saved = self.repository.save(record).await?;

        self.invalidation
            .dispatch(ChangeEvent::ProductCreated {
                product_id: saved.id.clone(),
            })
            .await;

        Ok(saved.snapshot())
    }
}

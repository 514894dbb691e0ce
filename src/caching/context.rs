//! # Cache Context
//!
//! The explicit handle object constructed once at process start and injected
//! into every component that touches the cache layer. There is no ambient
//! global: whoever needs a cache receives it from here.

use crate::caching::backend::CacheBackend;
use crate::caching::cart_cache::CartCache;
use crate::caching::invalidation::InvalidationDispatcher;
use crate::caching::otp::OtpStore;
use crate::caching::product_cache::ProductCache;
use crate::caching::search_cache::SearchCache;
use crate::caching::store::CacheStore;
use crate::caching::webhook::WebhookDeduplicator;
use std::sync::Arc;
use std::time::Duration;

/// All cache-layer components over one shared store
#[derive(Clone)]
pub struct CacheContext {
    /// The shared store; also consulted directly by the rate limiter
    pub store: Arc<CacheStore>,

    pub products: ProductCache,
    pub search: SearchCache,
    pub carts: CartCache,
    pub webhooks: WebhookDeduplicator,
    pub otp: OtpStore,
    pub invalidation: InvalidationDispatcher,
}

impl CacheContext {
    /// Build the context over a backend with the default command timeout
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::from_store(Arc::new(CacheStore::new(backend)))
    }

    /// Build the context with an explicit command timeout
    pub fn with_timeout(backend: Arc<dyn CacheBackend>, command_timeout: Duration) -> Self {
        Self::from_store(Arc::new(CacheStore::with_timeout(backend, command_timeout)))
    }

    fn from_store(store: Arc<CacheStore>) -> Self {
        let products = ProductCache::new(store.clone());
        let search = SearchCache::new(store.clone());
        let carts = CartCache::new(store.clone());
        let webhooks = WebhookDeduplicator::new(store.clone());
        let otp = OtpStore::new(store.clone());
        let invalidation =
            InvalidationDispatcher::new(products.clone(), carts.clone(), search.clone());

        Self {
            store,
            products,
            search,
            carts,
            webhooks,
            otp,
            invalidation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::backend::InMemoryBackend;

    #[tokio::test]
    async fn test_components_share_one_store() {
        let ctx = CacheContext::new(Arc::new(InMemoryBackend::new()));

        // A write through one component is visible to the store handle
        ctx.webhooks.mark_processed("evt_1").await;
        assert!(ctx.store.exists("webhook:evt_1").await);
    }
}

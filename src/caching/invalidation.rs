//! # Cache Invalidation Dispatch
//!
//! Centralized invalidation: every mutating flow describes what changed as a
//! [`ChangeEvent`] and the dispatcher maps the change kind to the cache keys
//! and namespaces it stales. Keeping the decision table in one place makes
//! the invalidation policy testable instead of duplicated per endpoint.
//!
//! Dispatch is awaited for ordering but advisory in outcome: it runs after
//! the record-store write that makes it valid has committed, and its
//! failures are logged, never surfaced. A failed targeted delete leaves an
//! entry whose staleness the namespace TTL bounds.

use crate::caching::cart_cache::CartCache;
use crate::caching::product_cache::ProductCache;
use crate::caching::search_cache::SearchCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Description of a committed write, emitted by the mutating flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    /// A new product became visible to search
    ProductCreated { product_id: String },

    /// A product's fields changed (price, description, stock via admin edit)
    ProductUpdated { product_id: String },

    /// Stock fields were decremented by an order flow
    StockDecremented { product_ids: Vec<String> },

    /// A user's cart changed (add/update/remove/clear), touching products
    ///
    /// Item removal frees no reserved stock, so this never implies a stock
    /// change on the touched products; their entries are dropped only
    /// because the cart view of price/stock may be re-read on next view.
    CartMutated {
        user_id: String,
        product_ids: Vec<String>,
    },

    /// An order was finalized: stock decremented, purchaser's cart emptied
    OrderFinalized {
        user_id: String,
        product_ids: Vec<String>,
    },
}

/// Maps change events to the cache entries they stale
///
/// Decision table:
///
/// | event            | product keys   | cart key | search namespaces |
/// |------------------|----------------|----------|-------------------|
/// | ProductCreated   | none           | none     | cleared           |
/// | ProductUpdated   | the product    | none     | cleared           |
/// | StockDecremented | each product   | none     | cleared           |
/// | CartMutated      | each touched   | the user | kept              |
/// | OrderFinalized   | each product   | the user | cleared           |
#[derive(Clone)]
pub struct InvalidationDispatcher {
    products: ProductCache,
    carts: CartCache,
    search: SearchCache,
}

impl InvalidationDispatcher {
    pub fn new(products: ProductCache, carts: CartCache, search: SearchCache) -> Self {
        Self {
            products,
            carts,
            search,
        }
    }

    /// Apply the invalidations for a committed change
    ///
    /// Never fails: each delete absorbs store errors at the cache boundary,
    /// and the search clear is already namespace-wide, which is the widest
    /// fallback a failed targeted delete could escalate to.
    pub async fn dispatch(&self, event: ChangeEvent) {
        debug!("Dispatching invalidation for {:?}", event);

        match event {
            ChangeEvent::ProductCreated { .. } => {
                self.search.clear_all().await;
            }

            ChangeEvent::ProductUpdated { product_id } => {
                self.products.invalidate(&product_id).await;
                self.search.clear_all().await;
            }

            ChangeEvent::StockDecremented { product_ids } => {
                for product_id in &product_ids {
                    self.products.invalidate(product_id).await;
                }
                self.search.clear_all().await;
            }

            ChangeEvent::CartMutated {
                user_id,
                product_ids,
            } => {
                self.carts.invalidate(&user_id).await;
                for product_id in &product_ids {
                    self.products.invalidate(product_id).await;
                }
            }

            ChangeEvent::OrderFinalized {
                user_id,
                product_ids,
            } => {
                self.carts.invalidate(&user_id).await;
                for product_id in &product_ids {
                    self.products.invalidate(product_id).await;
                }
                self.search.clear_all().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::backend::InMemoryBackend;
    use crate::caching::keys::SearchKey;
    use crate::caching::snapshots::{
        CartSnapshot, ProductSnapshot, SearchResultPage,
    };
    use crate::caching::store::CacheStore;
    use std::sync::Arc;

    struct Fixture {
        products: ProductCache,
        carts: CartCache,
        search: SearchCache,
        dispatcher: InvalidationDispatcher,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(CacheStore::new(Arc::new(InMemoryBackend::new())));
        let products = ProductCache::new(store.clone());
        let carts = CartCache::new(store.clone());
        let search = SearchCache::new(store);
        let dispatcher =
            InvalidationDispatcher::new(products.clone(), carts.clone(), search.clone());
        Fixture {
            products,
            carts,
            search,
            dispatcher,
        }
    }

    fn product(id: &str) -> ProductSnapshot {
        ProductSnapshot {
            id: id.to_string(),
            name: "Monitor".to_string(),
            description: "27 inch".to_string(),
            category: "electronics".to_string(),
            brand: "viewmax".to_string(),
            price: 24000,
            stock: 8,
            image_url: "https://cdn.example.com/monitor.jpg".to_string(),
        }
    }

    fn empty_cart(user_id: &str) -> CartSnapshot {
        CartSnapshot {
            user_id: user_id.to_string(),
            items: vec![],
            total_amount: 0,
            total_items: 0,
        }
    }

    fn result_page() -> SearchResultPage {
        SearchResultPage {
            products: vec![product("p1")],
            total_results: 1,
            page: 1,
            limit: 10,
            total_pages: 1,
        }
    }

    async fn seed(f: &Fixture) -> SearchKey {
        let key = SearchKey::new("monitor", None, None, None, None, 1, 10);
        f.products.put(&product("p1")).await;
        f.products.put(&product("p2")).await;
        f.carts.put("u1", &empty_cart("u1")).await;
        f.search.put(&key, &result_page()).await;
        key
    }

    #[tokio::test]
    async fn test_product_updated_clears_product_and_search() {
        let f = fixture();
        let key = seed(&f).await;

        f.dispatcher
            .dispatch(ChangeEvent::ProductUpdated {
                product_id: "p1".to_string(),
            })
            .await;

        assert_eq!(f.products.get("p1").await, None);
        assert!(f.products.get("p2").await.is_some());
        assert_eq!(f.search.get(&key).await, None);
        assert!(f.carts.get("u1").await.is_some());
    }

    #[tokio::test]
    async fn test_product_created_clears_only_search() {
        let f = fixture();
        let key = seed(&f).await;

        f.dispatcher
            .dispatch(ChangeEvent::ProductCreated {
                product_id: "p9".to_string(),
            })
            .await;

        assert!(f.products.get("p1").await.is_some());
        assert_eq!(f.search.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_cart_mutated_leaves_search_alone() {
        let f = fixture();
        let key = seed(&f).await;

        f.dispatcher
            .dispatch(ChangeEvent::CartMutated {
                user_id: "u1".to_string(),
                product_ids: vec!["p1".to_string()],
            })
            .await;

        assert_eq!(f.carts.get("u1").await, None);
        assert_eq!(f.products.get("p1").await, None);
        assert!(f.products.get("p2").await.is_some());
        assert!(f.search.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_order_finalized_clears_everything_it_touched() {
        let f = fixture();
        let key = seed(&f).await;

        f.dispatcher
            .dispatch(ChangeEvent::OrderFinalized {
                user_id: "u1".to_string(),
                product_ids: vec!["p1".to_string(), "p2".to_string()],
            })
            .await;

        assert_eq!(f.carts.get("u1").await, None);
        assert_eq!(f.products.get("p1").await, None);
        assert_eq!(f.products.get("p2").await, None);
        assert_eq!(f.search.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_stock_decrement_does_not_touch_carts() {
        let f = fixture();
        seed(&f).await;

        f.dispatcher
            .dispatch(ChangeEvent::StockDecremented {
                product_ids: vec!["p1".to_string()],
            })
            .await;

        assert!(f.carts.get("u1").await.is_some());
        assert_eq!(f.products.get("p1").await, None);
    }
}

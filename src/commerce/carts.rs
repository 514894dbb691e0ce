//! # Cart Service
//!
//! Cart reads and mutations with their cache discipline. Every mutation is
//! read-modify-write against the record store; after a confirmed save the
//! service dispatches `CartMutated` (dropping the cart entry and the touched
//! products) and then writes the fresh formatted cart back through. When a
//! mutation fails partway, the cart cache is dropped anyway: on uncertainty,
//! prefer a reload over a possibly stale cart.

use super::records::{CartItem, CartRecord, CartRepository, ProductRepository};
use crate::caching::cart_cache::CartCache;
use crate::caching::invalidation::{ChangeEvent, InvalidationDispatcher};
use crate::caching::snapshots::{CartItemSnapshot, CartSnapshot};
use crate::core::error::{CoreError, CoreResult};
use std::sync::Arc;
use tracing::warn;

/// Cart flows over the record store and cart cache
///
/// Known gap: the read-modify-write here carries no version check, so two
/// concurrent mutations for the same user can race and one update can be
/// lost silently. The source system leaves the intended behavior under
/// concurrent edits from multiple devices undefined; this implementation
/// keeps last-write-wins rather than guessing at one.
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    cache: CartCache,
    invalidation: InvalidationDispatcher,
}

impl CartService {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        products: Arc<dyn ProductRepository>,
        cache: CartCache,
        invalidation: InvalidationDispatcher,
    ) -> Self {
        Self {
            carts,
            products,
            cache,
            invalidation,
        }
    }

    /// Get a user's formatted cart, creating an empty one on first use
    ///
    /// A cached cart whose backing record is gone (deleted out of band) is
    /// treated as corruption: the entry is dropped and the cart rebuilt from
    /// the record store instead of trusting the cache.
    pub async fn get_cart(&self, user_id: &str) -> CoreResult<CartSnapshot> {
        if let Some(cached) = self.cache.get(user_id).await {
            if self.carts.find_by_user(user_id).await?.is_some() {
                return Ok(cached);
            }
            warn!(
                "Cart cache for user {} has no backing record, dropping it",
                user_id
            );
            self.cache.invalidate(user_id).await;
        }

        let record = match self.carts.find_by_user(user_id).await? {
            Some(record) => record,
            None => self.carts.save(CartRecord::empty(user_id)).await?,
        };

        let snapshot = self.format(&record).await?;
        self.cache.put(user_id, &snapshot).await;
        Ok(snapshot)
    }

    /// Add a product to the cart, or raise its quantity if already present
    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> CoreResult<CartSnapshot> {
        if quantity == 0 {
            return Err(CoreError::InvalidRequest {
                message: "Quantity must be at least 1".to_string(),
            });
        }

        let result = self.try_add_item(user_id, product_id, quantity).await;
        self.settle(user_id, vec![product_id.to_string()], result)
            .await
    }

    /// Set the quantity of an item already in the cart
    pub async fn update_item_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> CoreResult<CartSnapshot> {
        if quantity == 0 {
            return self.remove_item(user_id, product_id).await;
        }

        let result = self
            .try_update_quantity(user_id, product_id, quantity)
            .await;
        self.settle(user_id, vec![product_id.to_string()], result)
            .await
    }

    /// Remove an item from the cart
    ///
    /// Removal frees no reserved stock, so no stock-related invalidation is
    /// dispatched; only the cart entry and the touched product are dropped.
    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> CoreResult<CartSnapshot> {
        let result = self.try_remove_item(user_id, product_id).await;
        self.settle(user_id, vec![product_id.to_string()], result)
            .await
    }

    /// Empty the cart
    pub async fn clear_cart(&self, user_id: &str) -> CoreResult<CartSnapshot> {
        let result: CoreResult<(CartRecord, Vec<String>)> = async {
            let mut record = self.load_or_create(user_id).await?;
            let touched = record.product_ids();
            record.items.clear();
            let saved = self.carts.save(record).await?;
            Ok((saved, touched))
        }
        .await;

        match result {
            Ok((record, touched)) => self.settle(user_id, touched, Ok(record)).await,
            Err(e) => self.settle(user_id, Vec::new(), Err(e)).await,
        }
    }

    async fn try_add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> CoreResult<CartRecord> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            })?;

        let mut record = self.load_or_create(user_id).await?;
        let requested = record
            .items
            .iter()
            .find(|i| i.product_id == product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
            + quantity;

        if product.stock < requested {
            return Err(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
            });
        }

        match record.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity = requested,
            None => record.items.push(CartItem {
                product_id: product_id.to_string(),
                quantity,
                unit_price: product.price,
            }),
        }

        self.carts.save(record).await
    }

    async fn try_update_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> CoreResult<CartRecord> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            })?;

        if product.stock < quantity {
            return Err(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
            });
        }

        let mut record = self.load_or_create(user_id).await?;
        let item = record
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CoreError::NotFound {
                entity: "cart item",
                id: product_id.to_string(),
            })?;
        item.quantity = quantity;

        self.carts.save(record).await
    }

    async fn try_remove_item(&self, user_id: &str, product_id: &str) -> CoreResult<CartRecord> {
        let mut record = self.load_or_create(user_id).await?;
        let before = record.items.len();
        record.items.retain(|i| i.product_id != product_id);

        if record.items.len() == before {
            return Err(CoreError::NotFound {
                entity: "cart item",
                id: product_id.to_string(),
            });
        }

        self.carts.save(record).await
    }

    async fn load_or_create(&self, user_id: &str) -> CoreResult<CartRecord> {
        match self.carts.find_by_user(user_id).await? {
            Some(record) => Ok(record),
            None => Ok(CartRecord::empty(user_id)),
        }
    }

    /// Finish a mutation: dispatch invalidation and refresh the cache on
    /// success, drop the cache on failure
    async fn settle(
        &self,
        user_id: &str,
        touched: Vec<String>,
        result: CoreResult<CartRecord>,
    ) -> CoreResult<CartSnapshot> {
        match result {
            Ok(record) => {
                self.invalidation
                    .dispatch(ChangeEvent::CartMutated {
                        user_id: user_id.to_string(),
                        product_ids: touched,
                    })
                    .await;

                let snapshot = self.format(&record).await?;
                self.cache.put(user_id, &snapshot).await;
                Ok(snapshot)
            }
            Err(e) => {
                self.cache.invalidate(user_id).await;
                Err(e)
            }
        }
    }

    /// Format a cart record for display, joining current product data
    ///
    /// Items whose product has vanished from the record store are dropped
    /// from the view rather than failing the whole cart.
    async fn format(&self, record: &CartRecord) -> CoreResult<CartSnapshot> {
        let mut items = Vec::with_capacity(record.items.len());
        let mut total_amount = 0u64;

        for item in &record.items {
            let Some(product) = self.products.find_by_id(&item.product_id).await? else {
                warn!(
                    "Cart for user {} references missing product {}, skipping",
                    record.user_id, item.product_id
                );
                continue;
            };

            let line_total = item.unit_price * u64::from(item.quantity);
            total_amount += line_total;
            items.push(CartItemSnapshot {
                product_id: item.product_id.clone(),
                name: product.name,
                image_url: product.image_url,
                unit_price: item.unit_price,
                quantity: item.quantity,
                line_total,
            });
        }

        Ok(CartSnapshot {
            user_id: record.user_id.clone(),
            total_items: items.len(),
            items,
            total_amount,
        })
    }
}

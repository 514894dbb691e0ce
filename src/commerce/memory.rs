//! # In-Memory Repositories
//!
//! Map-backed implementations of the repository contracts, used by the test
//! suites and for local development. The product repository's stock
//! decrement holds its write lock across validate-and-apply, matching the
//! all-or-nothing contract of the real store's transaction.

use super::records::{
    CartRecord, CartRepository, OrderItem, OrderRecord, OrderRepository, ProductPatch,
    ProductRecord, ProductRepository,
};
use crate::core::error::{CoreError, CoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory product repository
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, ProductRecord>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with records
    pub async fn seed(&self, records: impl IntoIterator<Item = ProductRecord>) {
        let mut products = self.products.write().await;
        for record in records {
            products.insert(record.id.clone(), record);
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, product_id: &str) -> CoreResult<Option<ProductRecord>> {
        Ok(self.products.read().await.get(product_id).cloned())
    }

    async fn update_by_id(
        &self,
        product_id: &str,
        patch: ProductPatch,
    ) -> CoreResult<Option<ProductRecord>> {
        let mut products = self.products.write().await;
        match products.get_mut(product_id) {
            Some(record) => {
                patch.apply(record);
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, product: ProductRecord) -> CoreResult<ProductRecord> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn decrement_stock(&self, items: &[OrderItem]) -> CoreResult<()> {
        let mut products = self.products.write().await;

        // Validate the whole batch before touching anything
        for item in items {
            let record = products.get(&item.product_id).ok_or(CoreError::NotFound {
                entity: "product",
                id: item.product_id.clone(),
            })?;
            if record.stock < item.quantity {
                return Err(CoreError::InsufficientStock {
                    product_id: item.product_id.clone(),
                });
            }
        }

        for item in items {
            if let Some(record) = products.get_mut(&item.product_id) {
                record.stock -= item.quantity;
            }
        }

        Ok(())
    }
}

/// In-memory cart repository
#[derive(Default)]
pub struct InMemoryCartRepository {
    carts: RwLock<HashMap<String, CartRecord>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a cart record directly, bypassing the service layer
    ///
    /// Test hook for the out-of-band deletion scenario.
    pub async fn delete_by_user(&self, user_id: &str) -> bool {
        self.carts.write().await.remove(user_id).is_some()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_by_user(&self, user_id: &str) -> CoreResult<Option<CartRecord>> {
        Ok(self.carts.read().await.get(user_id).cloned())
    }

    async fn save(&self, cart: CartRecord) -> CoreResult<CartRecord> {
        self.carts
            .write()
            .await
            .insert(cart.user_id.clone(), cart.clone());
        Ok(cart)
    }
}

/// In-memory order repository
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, OrderRecord>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, order_id: &str) -> CoreResult<Option<OrderRecord>> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> CoreResult<Option<OrderRecord>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.payment_intent_id.as_deref() == Some(payment_intent_id))
            .cloned())
    }

    async fn save(&self, order: OrderRecord) -> CoreResult<OrderRecord> {
        self.orders
            .write()
            .await
            .insert(order.id.clone(), order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commerce::records::{OrderStatus, PaymentStatus};

    fn product(id: &str, stock: u32) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: "Widget".to_string(),
            description: String::new(),
            category: "misc".to_string(),
            brand: "acme".to_string(),
            price: 100,
            stock,
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_decrement_stock_all_or_nothing() {
        let repo = InMemoryProductRepository::new();
        repo.seed([product("p1", 10), product("p2", 1)]).await;

        let items = vec![
            OrderItem {
                product_id: "p1".to_string(),
                quantity: 5,
                unit_price: 100,
            },
            OrderItem {
                product_id: "p2".to_string(),
                quantity: 3,
                unit_price: 100,
            },
        ];

        let result = repo.decrement_stock(&items).await;
        assert!(matches!(result, Err(CoreError::InsufficientStock { .. })));

        // Nothing changed, including the product that had enough stock
        assert_eq!(repo.find_by_id("p1").await.unwrap().unwrap().stock, 10);
        assert_eq!(repo.find_by_id("p2").await.unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_decrement_stock_commits_whole_batch() {
        let repo = InMemoryProductRepository::new();
        repo.seed([product("p1", 10), product("p2", 4)]).await;

        let items = vec![
            OrderItem {
                product_id: "p1".to_string(),
                quantity: 5,
                unit_price: 100,
            },
            OrderItem {
                product_id: "p2".to_string(),
                quantity: 4,
                unit_price: 100,
            },
        ];

        repo.decrement_stock(&items).await.unwrap();
        assert_eq!(repo.find_by_id("p1").await.unwrap().unwrap().stock, 5);
        assert_eq!(repo.find_by_id("p2").await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_update_by_id_missing_product() {
        let repo = InMemoryProductRepository::new();
        let result = repo.update_by_id("nope", ProductPatch::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_order_by_payment_intent() {
        let repo = InMemoryOrderRepository::new();
        repo.save(OrderRecord {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            items: vec![],
            total_amount: 0,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::PendingPayment,
            payment_intent_id: Some("pi_123".to_string()),
        })
        .await
        .unwrap();

        assert!(repo.find_by_payment_intent("pi_123").await.unwrap().is_some());
        assert!(repo.find_by_payment_intent("pi_999").await.unwrap().is_none());
    }
}

//! # Record Types and Repository Contracts
//!
//! The record store (document database) is an external collaborator; these
//! traits are the narrow contract the cache layer consumes it through. Every
//! write reports success or failure unambiguously, because invalidation is
//! only dispatched after a confirmed write.

use crate::caching::snapshots::ProductSnapshot;
use crate::core::error::CoreResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A product document as stored in the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub price: u64,
    pub stock: u32,
    pub image_url: String,
}

impl ProductRecord {
    /// The cacheable view of this record
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            brand: self.brand.clone(),
            price: self.price,
            stock: self.stock,
            image_url: self.image_url.clone(),
        }
    }
}

/// Partial update applied to a product document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price: Option<u64>,
    pub stock: Option<u32>,
    pub image_url: Option<String>,
}

impl ProductPatch {
    /// Apply the patch to a record in place
    pub fn apply(&self, record: &mut ProductRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(category) = &self.category {
            record.category = category.clone();
        }
        if let Some(brand) = &self.brand {
            record.brand = brand.clone();
        }
        if let Some(price) = self.price {
            record.price = price;
        }
        if let Some(stock) = self.stock {
            record.stock = stock;
        }
        if let Some(image_url) = &self.image_url {
            record.image_url = image_url.clone();
        }
    }
}

/// One line item in a stored cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,

    /// Unit price captured when the item was added
    pub unit_price: u64,
}

/// A cart document as stored in the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartRecord {
    pub user_id: String,
    pub items: Vec<CartItem>,
}

impl CartRecord {
    /// An empty cart for a user
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            items: Vec::new(),
        }
    }

    /// Product ids referenced by the cart
    pub fn product_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.product_id.clone()).collect()
    }
}

/// Payment standing of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// Fulfillment standing of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

/// One line item in a stored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: u64,
}

/// An order document as stored in the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: u64,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub payment_intent_id: Option<String>,
}

impl OrderRecord {
    /// Product ids referenced by the order
    pub fn product_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.product_id.clone()).collect()
    }
}

/// Product document access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, product_id: &str) -> CoreResult<Option<ProductRecord>>;

    /// Apply a patch; `None` when the product does not exist
    async fn update_by_id(
        &self,
        product_id: &str,
        patch: ProductPatch,
    ) -> CoreResult<Option<ProductRecord>>;

    async fn save(&self, product: ProductRecord) -> CoreResult<ProductRecord>;

    /// Decrement stock for every item, all-or-nothing
    ///
    /// This is the record store's own multi-document transaction: either
    /// every product has sufficient stock and all decrements commit, or
    /// nothing changes and the call errors.
    async fn decrement_stock(&self, items: &[OrderItem]) -> CoreResult<()>;
}

/// Cart document access
///
/// Cart mutation is read-modify-write over these two calls with no version
/// check; concurrent mutations for one user can silently lose an update.
/// See the service-level note on [`CartService`].
///
/// [`CartService`]: crate::commerce::carts::CartService
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_by_user(&self, user_id: &str) -> CoreResult<Option<CartRecord>>;

    /// Upsert the user's cart
    async fn save(&self, cart: CartRecord) -> CoreResult<CartRecord>;
}

/// Order document access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, order_id: &str) -> CoreResult<Option<OrderRecord>>;

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> CoreResult<Option<OrderRecord>>;

    async fn save(&self, order: OrderRecord) -> CoreResult<OrderRecord>;
}

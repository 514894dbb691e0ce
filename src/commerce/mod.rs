//! # Commerce Flows
//!
//! The record-store flows that act as invalidation call sites: product
//! reads/writes, cart mutations, and payment webhook processing. Business
//! rules beyond what the cache discipline needs (pricing, seller approval,
//! email content) live outside this crate; the record store itself is
//! consumed through the repository traits in [`records`].

pub mod carts;
pub mod memory;
pub mod orders;
pub mod products;
pub mod records;

pub use carts::CartService;
pub use memory::{InMemoryCartRepository, InMemoryOrderRepository, InMemoryProductRepository};
pub use orders::{PaymentWebhookProcessor, WebhookEvent, WebhookEventType, WebhookOutcome};
pub use products::ProductService;
pub use records::{
    CartItem, CartRecord, CartRepository, OrderItem, OrderRecord, OrderRepository, OrderStatus,
    PaymentStatus, ProductPatch, ProductRecord, ProductRepository,
};

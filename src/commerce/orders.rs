//! # Payment Webhook Processing
//!
//! Handles payment-provider events under at-least-once, unordered delivery.
//! Two layers keep re-delivery harmless: the dedup marker short-circuits
//! repeats within its 24-hour TTL, and the order's payment status gates the
//! state transition itself, so even a delivery that slips past the marker
//! re-applies nothing.
//!
//! The order is marked paid before the stock decrement transaction runs,
//! matching the source system: if the decrement fails, a redelivery hits the
//! status gate instead of decrementing twice.

use super::records::{OrderRepository, OrderStatus, PaymentStatus, ProductRepository};
use crate::caching::invalidation::{ChangeEvent, InvalidationDispatcher};
use crate::caching::webhook::WebhookDeduplicator;
use crate::core::error::CoreResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Event types delivered by the payment provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventType {
    #[serde(rename = "payment_intent.succeeded")]
    PaymentIntentSucceeded,

    #[serde(rename = "payment_intent.payment_failed")]
    PaymentIntentFailed,
}

/// A payment-provider event as delivered to the webhook endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Provider-assigned unique event id
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: WebhookEventType,

    /// Payment intent identifying the order
    pub payment_intent_id: String,
}

/// What processing an event amounted to, reported back to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// The event was applied
    Processed,

    /// The event id was already marked processed; nothing was done
    Duplicate,

    /// The order was already paid; nothing was done
    AlreadyProcessed,

    /// No order matches the payment intent; acknowledged to stop redelivery
    OrderNotFound,
}

/// Processor for payment-provider webhook events
pub struct PaymentWebhookProcessor {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    dedup: WebhookDeduplicator,
    invalidation: InvalidationDispatcher,
}

impl PaymentWebhookProcessor {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        dedup: WebhookDeduplicator,
        invalidation: InvalidationDispatcher,
    ) -> Self {
        Self {
            orders,
            products,
            dedup,
            invalidation,
        }
    }

    /// Process one delivered event
    ///
    /// A positive dedup check is terminal: the delivery is reported as a
    /// duplicate and no side effects run.
    pub async fn process(&self, event: &WebhookEvent) -> CoreResult<WebhookOutcome> {
        if self.dedup.is_processed(&event.id).await {
            info!("Webhook event {} already processed, skipping", event.id);
            return Ok(WebhookOutcome::Duplicate);
        }

        match event.event_type {
            WebhookEventType::PaymentIntentSucceeded => self.handle_payment_succeeded(event).await,
            WebhookEventType::PaymentIntentFailed => self.handle_payment_failed(event).await,
        }
    }

    async fn handle_payment_succeeded(&self, event: &WebhookEvent) -> CoreResult<WebhookOutcome> {
        let Some(mut order) = self
            .orders
            .find_by_payment_intent(&event.payment_intent_id)
            .await?
        else {
            warn!(
                "Webhook event {} references unknown payment intent {}",
                event.id, event.payment_intent_id
            );
            return Ok(WebhookOutcome::OrderNotFound);
        };

        if order.payment_status == PaymentStatus::Paid {
            info!("Order {} already paid, webhook {} is a no-op", order.id, event.id);
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        order.payment_status = PaymentStatus::Paid;
        order.order_status = OrderStatus::Confirmed;
        let order = self.orders.save(order).await?;

        // The record store's own transaction; invalidation only after commit
        self.products.decrement_stock(&order.items).await?;

        self.invalidation
            .dispatch(ChangeEvent::OrderFinalized {
                user_id: order.user_id.clone(),
                product_ids: order.product_ids(),
            })
            .await;

        self.dedup.mark_processed(&event.id).await;
        info!("Order {} confirmed by webhook event {}", order.id, event.id);
        Ok(WebhookOutcome::Processed)
    }

    async fn handle_payment_failed(&self, event: &WebhookEvent) -> CoreResult<WebhookOutcome> {
        let Some(mut order) = self
            .orders
            .find_by_payment_intent(&event.payment_intent_id)
            .await?
        else {
            return Ok(WebhookOutcome::OrderNotFound);
        };

        order.payment_status = PaymentStatus::Failed;
        self.orders.save(order).await?;
        Ok(WebhookOutcome::Processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::backend::InMemoryBackend;
    use crate::caching::context::CacheContext;
    use crate::commerce::memory::{InMemoryOrderRepository, InMemoryProductRepository};
    use crate::commerce::records::{OrderItem, OrderRecord, ProductRecord};

    struct Fixture {
        processor: PaymentWebhookProcessor,
        orders: Arc<InMemoryOrderRepository>,
        products: Arc<InMemoryProductRepository>,
        ctx: CacheContext,
    }

    fn product(id: &str, stock: u32) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: format!("Product {}", id),
            description: String::new(),
            category: "misc".to_string(),
            brand: "acme".to_string(),
            price: 1000,
            stock,
            image_url: String::new(),
        }
    }

    fn pending_order(id: &str, intent: &str) -> OrderRecord {
        OrderRecord {
            id: id.to_string(),
            user_id: "u1".to_string(),
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                quantity: 2,
                unit_price: 1000,
            }],
            total_amount: 2000,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::PendingPayment,
            payment_intent_id: Some(intent.to_string()),
        }
    }

    fn succeeded(id: &str, intent: &str) -> WebhookEvent {
        WebhookEvent {
            id: id.to_string(),
            event_type: WebhookEventType::PaymentIntentSucceeded,
            payment_intent_id: intent.to_string(),
        }
    }

    async fn fixture() -> Fixture {
        let ctx = CacheContext::new(Arc::new(InMemoryBackend::new()));
        let orders = Arc::new(InMemoryOrderRepository::new());
        let products = Arc::new(InMemoryProductRepository::new());
        products.seed([product("p1", 10)]).await;
        orders.save(pending_order("o1", "pi_1")).await.unwrap();

        let processor = PaymentWebhookProcessor::new(
            orders.clone(),
            products.clone(),
            ctx.webhooks.clone(),
            ctx.invalidation.clone(),
        );
        Fixture {
            processor,
            orders,
            products,
            ctx,
        }
    }

    #[tokio::test]
    async fn test_success_event_confirms_and_decrements_once() {
        let f = fixture().await;

        let outcome = f.processor.process(&succeeded("evt_123", "pi_1")).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Processed);

        let order = f.orders.find_by_id("o1").await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.order_status, OrderStatus::Confirmed);
        assert_eq!(f.products.find_by_id("p1").await.unwrap().unwrap().stock, 8);
    }

    #[tokio::test]
    async fn test_second_delivery_is_duplicate_with_no_side_effects() {
        let f = fixture().await;

        f.processor.process(&succeeded("evt_123", "pi_1")).await.unwrap();
        let outcome = f.processor.process(&succeeded("evt_123", "pi_1")).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Duplicate);

        // Stock decremented exactly once
        assert_eq!(f.products.find_by_id("p1").await.unwrap().unwrap().stock, 8);
    }

    #[tokio::test]
    async fn test_paid_order_gates_fresh_event_id() {
        let f = fixture().await;

        f.processor.process(&succeeded("evt_1", "pi_1")).await.unwrap();

        // Distinct event id, same payment intent: the status gate holds
        let outcome = f.processor.process(&succeeded("evt_2", "pi_1")).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
        assert_eq!(f.products.find_by_id("p1").await.unwrap().unwrap().stock, 8);
    }

    #[tokio::test]
    async fn test_unknown_payment_intent_is_acknowledged() {
        let f = fixture().await;
        let outcome = f.processor.process(&succeeded("evt_9", "pi_missing")).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::OrderNotFound);
    }

    #[tokio::test]
    async fn test_finalization_invalidates_cart_products_and_search() {
        let f = fixture().await;

        // Warm caches that finalization must clear
        f.ctx.products.put(&product("p1", 10).snapshot()).await;
        f.ctx.carts.put(
            "u1",
            &crate::caching::snapshots::CartSnapshot {
                user_id: "u1".to_string(),
                items: vec![],
                total_amount: 0,
                total_items: 0,
            },
        )
        .await;

        f.processor.process(&succeeded("evt_123", "pi_1")).await.unwrap();

        assert!(f.ctx.products.get("p1").await.is_none());
        assert!(f.ctx.carts.get("u1").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_event_marks_payment_failed() {
        let f = fixture().await;

        let event = WebhookEvent {
            id: "evt_f".to_string(),
            event_type: WebhookEventType::PaymentIntentFailed,
            payment_intent_id: "pi_1".to_string(),
        };
        let outcome = f.processor.process(&event).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Processed);

        let order = f.orders.find_by_id("o1").await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        // Stock untouched
        assert_eq!(f.products.find_by_id("p1").await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_insufficient_stock_aborts_without_decrement() {
        let f = fixture().await;
        f.products.seed([product("p1", 1)]).await;

        let result = f.processor.process(&succeeded("evt_1", "pi_1")).await;
        assert!(result.is_err());

        // The transaction rolled back; the event is not marked processed,
        // so a redelivery hits the status gate instead
        assert_eq!(f.products.find_by_id("p1").await.unwrap().unwrap().stock, 1);
        assert!(!f.ctx.webhooks.is_processed("evt_1").await);
        let outcome = f.processor.process(&succeeded("evt_1", "pi_1")).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
    }

    #[tokio::test]
    async fn test_event_type_wire_format() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"id":"evt_1","type":"payment_intent.succeeded","payment_intent_id":"pi_1"}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, WebhookEventType::PaymentIntentSucceeded);
    }
}

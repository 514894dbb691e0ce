//! # Webhook Idempotency Integration Tests
//!
//! At-least-once delivery against the payment webhook flow: repeated
//! deliveries must produce exactly one order transition and one stock
//! decrement, whether the repeat is caught by the dedup marker or by the
//! order-status gate.

use std::sync::Arc;

use storefront_cache::caching::backend::InMemoryBackend;
use storefront_cache::caching::CacheContext;
use storefront_cache::commerce::{
    InMemoryOrderRepository, InMemoryProductRepository, OrderItem, OrderRecord, OrderRepository,
    OrderStatus, PaymentStatus, PaymentWebhookProcessor, ProductRecord, ProductRepository,
    WebhookEvent, WebhookEventType, WebhookOutcome,
};

struct World {
    processor: PaymentWebhookProcessor,
    orders: Arc<InMemoryOrderRepository>,
    products: Arc<InMemoryProductRepository>,
    ctx: CacheContext,
}

async fn world() -> World {
    let ctx = CacheContext::new(Arc::new(InMemoryBackend::new()));
    let orders = Arc::new(InMemoryOrderRepository::new());
    let products = Arc::new(InMemoryProductRepository::new());

    products
        .seed([ProductRecord {
            id: "p1".to_string(),
            name: "Headphones".to_string(),
            description: "Over-ear".to_string(),
            category: "audio".to_string(),
            brand: "acme".to_string(),
            price: 6000,
            stock: 10,
            image_url: "https://cdn.example.com/p1.jpg".to_string(),
        }])
        .await;

    orders
        .save(OrderRecord {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                quantity: 3,
                unit_price: 6000,
            }],
            total_amount: 18000,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::PendingPayment,
            payment_intent_id: Some("pi_abc".to_string()),
        })
        .await
        .unwrap();

    let processor = PaymentWebhookProcessor::new(
        orders.clone(),
        products.clone(),
        ctx.webhooks.clone(),
        ctx.invalidation.clone(),
    );

    World {
        processor,
        orders,
        products,
        ctx,
    }
}

fn event(id: &str) -> WebhookEvent {
    WebhookEvent {
        id: id.to_string(),
        event_type: WebhookEventType::PaymentIntentSucceeded,
        payment_intent_id: "pi_abc".to_string(),
    }
}

#[tokio::test]
async fn double_delivery_transitions_the_order_exactly_once() {
    let w = world().await;

    // evt_123 delivered twice within the dedup TTL
    let first = w.processor.process(&event("evt_123")).await.unwrap();
    let second = w.processor.process(&event("evt_123")).await.unwrap();

    assert_eq!(first, WebhookOutcome::Processed);
    assert_eq!(second, WebhookOutcome::Duplicate);

    // Order status transitioned to CONFIRMED once, stock decremented once
    let order = w.orders.find_by_id("o1").await.unwrap().unwrap();
    assert_eq!(order.order_status, OrderStatus::Confirmed);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(w.products.find_by_id("p1").await.unwrap().unwrap().stock, 7);
}

#[tokio::test]
async fn marker_and_gate_back_each_other_up() {
    let w = world().await;

    w.processor.process(&event("evt_1")).await.unwrap();

    // Same payment intent under a fresh event id slips past the marker;
    // the order-status gate stops it instead
    let outcome = w.processor.process(&event("evt_2")).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
    assert_eq!(w.products.find_by_id("p1").await.unwrap().unwrap().stock, 7);
}

#[tokio::test]
async fn duplicate_has_zero_cache_side_effects() {
    let w = world().await;
    w.processor.process(&event("evt_1")).await.unwrap();

    // Re-warm the caches the first delivery cleared
    w.ctx
        .products
        .put(&w.products.find_by_id("p1").await.unwrap().unwrap().snapshot())
        .await;

    let outcome = w.processor.process(&event("evt_1")).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Duplicate);

    // The duplicate cleared nothing
    assert!(w.ctx.products.get("p1").await.is_some());
}

#[tokio::test]
async fn marking_is_idempotent_across_check_mark_cycles() {
    let w = world().await;

    assert!(!w.ctx.webhooks.is_processed("evt_x").await);
    w.ctx.webhooks.mark_processed("evt_x").await;
    w.ctx.webhooks.mark_processed("evt_x").await;
    assert!(w.ctx.webhooks.is_processed("evt_x").await);
}

#[tokio::test]
async fn failed_payment_event_skips_dedup_and_stock() {
    let w = world().await;

    let failed = WebhookEvent {
        id: "evt_f1".to_string(),
        event_type: WebhookEventType::PaymentIntentFailed,
        payment_intent_id: "pi_abc".to_string(),
    };

    let outcome = w.processor.process(&failed).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Processed);

    let order = w.orders.find_by_id("o1").await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    assert_eq!(order.order_status, OrderStatus::PendingPayment);
    assert_eq!(w.products.find_by_id("p1").await.unwrap().unwrap().stock, 10);

    // A later success for the same intent still goes through
    let outcome = w.processor.process(&event("evt_s1")).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Processed);
    assert_eq!(w.products.find_by_id("p1").await.unwrap().unwrap().stock, 7);
}

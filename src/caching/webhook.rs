//! # Webhook Deduplication
//!
//! Processed-event markers under `webhook:<eventId>` with a 24-hour TTL,
//! making webhook handling idempotent under at-least-once delivery. A
//! positive `is_processed` result is terminal for the caller: report the
//! delivery as a duplicate and perform no side effects.
//!
//! Check and mark are not atomic, so two tightly concurrent deliveries of
//! the same event can both pass the check; the order-status gate in the
//! processing flow is what keeps re-application a no-op, and the TTL bounds
//! the marker's own exposure window to 24 hours.

use crate::caching::keys::{self, WEBHOOK_TTL};
use crate::caching::store::CacheStore;
use std::sync::Arc;
use tracing::debug;

const PROCESSED_MARKER: &[u8] = b"processed";

/// Idempotency markers for externally delivered events
#[derive(Clone)]
pub struct WebhookDeduplicator {
    store: Arc<CacheStore>,
}

impl WebhookDeduplicator {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// Whether this event id has already been processed
    ///
    /// Store outage reads as "not processed": the flow then relies on the
    /// order-status gate, which is idempotent on its own.
    pub async fn is_processed(&self, event_id: &str) -> bool {
        self.store.exists(&keys::webhook_key(event_id)).await
    }

    /// Record an event id as processed
    pub async fn mark_processed(&self, event_id: &str) {
        self.store
            .set_with_ttl(&keys::webhook_key(event_id), PROCESSED_MARKER, WEBHOOK_TTL)
            .await;
        debug!("Marked webhook event {} as processed", event_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::backend::InMemoryBackend;

    fn dedup() -> WebhookDeduplicator {
        WebhookDeduplicator::new(Arc::new(CacheStore::new(Arc::new(InMemoryBackend::new()))))
    }

    #[tokio::test]
    async fn test_unseen_event_is_not_processed() {
        assert!(!dedup().is_processed("evt_1").await);
    }

    #[tokio::test]
    async fn test_mark_then_check() {
        let dedup = dedup();
        dedup.mark_processed("evt_1").await;
        assert!(dedup.is_processed("evt_1").await);
        assert!(!dedup.is_processed("evt_2").await);
    }

    #[tokio::test]
    async fn test_marking_twice_is_idempotent() {
        let dedup = dedup();
        dedup.mark_processed("evt_1").await;
        dedup.mark_processed("evt_1").await;
        assert!(dedup.is_processed("evt_1").await);
    }
}

//! Record of webhook notifications that have already been applied.
//!
//! MercadoPago retries notifications until it gets a 2xx and may deliver the
//! same `(type, id)` pair several times. A key is marked only after the order
//! update succeeded, so a failed attempt is retried by the next delivery.
//!
//! The in-memory ledger is per process and lost on restart. Two deliveries of
//! the same key racing each other can both pass the `contains` check; the
//! order update they apply is the same, so the second one is harmless.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Identity of a notification: its resource type and resource id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebhookKey {
    pub kind: String,
    pub id: String,
}

impl WebhookKey {
    #[must_use]
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for WebhookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Storage for processed webhook keys.
#[async_trait]
pub trait WebhookLedger: Send + Sync {
    async fn contains(&self, key: &WebhookKey) -> bool;

    async fn mark_processed(&self, key: WebhookKey);
}

/// Process-local [`WebhookLedger`].
#[derive(Debug, Default)]
pub struct InMemoryWebhookLedger {
    processed: RwLock<HashSet<WebhookKey>>,
}

impl InMemoryWebhookLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.processed.read().await.len()
    }
}

#[async_trait]
impl WebhookLedger for InMemoryWebhookLedger {
    async fn contains(&self, key: &WebhookKey) -> bool {
        self.processed.read().await.contains(key)
    }

    async fn mark_processed(&self, key: WebhookKey) {
        self.processed.write().await.insert(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(WebhookKey::new("payment", "123").to_string(), "payment:123");
    }

    #[tokio::test]
    async fn test_mark_and_contains() {
        let ledger = InMemoryWebhookLedger::new();
        let key = WebhookKey::new("payment", "123");

        assert!(!ledger.contains(&key).await);
        ledger.mark_processed(key.clone()).await;
        ledger.mark_processed(key.clone()).await;

        assert!(ledger.contains(&key).await);
        assert!(!ledger.contains(&WebhookKey::new("merchant_order", "123")).await);
        assert_eq!(ledger.len().await, 1);
    }
}

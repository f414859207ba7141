//! Response cache for read-only backend calls.
//!
//! The WooCommerce client memoizes GET responses by request signature so that
//! catalog browsing does not hit WordPress on every request. The cache is an
//! explicit dependency of the client rather than process-global state, which
//! keeps its lifetime and invalidation testable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use moka::future::Cache;
use serde_json::Value;

use crate::woocommerce::CommerceError;

/// Get/set/invalidate over cached JSON responses.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up a fresh entry.
    async fn get(&self, key: &str) -> Option<Arc<Value>>;

    /// Return the entry for `key`, running `load` on a miss.
    ///
    /// Concurrent callers missing on the same key wait for a single `load`.
    /// Failures are returned to every waiter and not stored.
    async fn get_or_load(
        &self,
        key: String,
        load: BoxFuture<'_, Result<Arc<Value>, CommerceError>>,
    ) -> Result<Arc<Value>, CommerceError>;

    /// Store an entry; it expires after the cache's TTL.
    async fn insert(&self, key: String, value: Arc<Value>);

    /// Drop a single entry.
    async fn invalidate(&self, key: &str);

    /// Drop every entry.
    async fn invalidate_all(&self);
}

/// In-memory [`ResponseCache`] backed by `moka`.
#[derive(Clone)]
pub struct MokaResponseCache {
    inner: Cache<String, Arc<Value>>,
}

impl MokaResponseCache {
    /// Create a cache holding at most `capacity` responses for `ttl` each.
    #[must_use]
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Number of live entries, after pending maintenance has run.
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

#[async_trait]
impl ResponseCache for MokaResponseCache {
    async fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.inner.get(key).await
    }

    async fn get_or_load(
        &self,
        key: String,
        load: BoxFuture<'_, Result<Arc<Value>, CommerceError>>,
    ) -> Result<Arc<Value>, CommerceError> {
        self.inner
            .try_get_with(key, load)
            .await
            .map_err(|e| CommerceError::clone(&e))
    }

    async fn insert(&self, key: String, value: Arc<Value>) {
        self.inner.insert(key, value).await;
    }

    async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::join_all;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_insert_get_invalidate() {
        let cache = MokaResponseCache::new(10, Duration::from_secs(60));
        cache
            .insert("GET /products".to_string(), Arc::new(json!([1, 2])))
            .await;

        assert_eq!(
            cache.get("GET /products").await.as_deref(),
            Some(&json!([1, 2]))
        );
        assert_eq!(cache.len().await, 1);

        cache.invalidate("GET /products").await;
        assert!(cache.get("GET /products").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = MokaResponseCache::new(10, Duration::from_secs(60));
        cache.insert("a".to_string(), Arc::new(json!(1))).await;
        cache.insert("b".to_string(), Arc::new(json!(2))).await;

        cache.invalidate_all().await;
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_none());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MokaResponseCache::new(10, Duration::from_millis(20));
        cache.insert("a".to_string(), Arc::new(json!(1))).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get("a").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_load() {
        let cache = MokaResponseCache::new(10, Duration::from_secs(60));
        let loads = AtomicUsize::new(0);
        let loads = &loads;

        let callers = (0..8).map(|_| {
            cache.get_or_load(
                "GET /products/42".to_string(),
                Box::pin(async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, CommerceError>(Arc::new(json!({"id": 42})))
                }),
            )
        });
        let results = join_all(callers).await;

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r.as_ref().unwrap()["id"] == 42));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_stored() {
        let cache = MokaResponseCache::new(10, Duration::from_secs(60));

        let err = cache
            .get_or_load(
                "GET /orders".to_string(),
                Box::pin(async {
                    Err::<Arc<Value>, _>(CommerceError::Status {
                        status: 503,
                        url: "/orders".to_string(),
                    })
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));

        let value = cache
            .get_or_load(
                "GET /orders".to_string(),
                Box::pin(async { Ok::<_, CommerceError>(Arc::new(json!([]))) }),
            )
            .await
            .unwrap();
        assert_eq!(*value, json!([]));
    }
}

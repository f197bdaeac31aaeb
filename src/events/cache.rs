//! In-memory store of values observed in contract events.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::observability::metrics;

/// A thread-safe, last-write-wins map of observed values.
///
/// Keys and values are opaque strings chosen by the event decoder. Clones
/// share the same underlying map, so the watcher can write while request
/// handlers read. A missing key is a normal state, not an error.
#[derive(Debug, Clone, Default)]
pub struct ObservedValueCache {
    inner: Arc<DashMap<String, String>>,
}

impl ObservedValueCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, replacing any earlier one for `key`.
    pub fn record(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
        metrics::record_cache_size(self.inner.len());
    }

    /// Latest value observed for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    /// Forget `key`, returning its last value.
    pub fn remove(&self, key: &str) -> Option<String> {
        let removed = self.inner.remove(key).map(|(_, v)| v);
        metrics::record_cache_size(self.inner.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copy of every entry at this moment.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_operations() {
        let cache = ObservedValueCache::new();

        assert!(cache.get("price").is_none());
        assert!(cache.is_empty());

        cache.record("price", "100");
        assert_eq!(cache.get("price").as_deref(), Some("100"));

        // Last write wins
        cache.record("price", "105");
        assert_eq!(cache.get("price").as_deref(), Some("105"));
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.remove("price").as_deref(), Some("105"));
        assert!(cache.get("price").is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let cache = ObservedValueCache::new();
        let writer = cache.clone();
        writer.record("a", "1");
        writer.record("b", "2");

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["b"], "2");
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let cache = ObservedValueCache::new();
        let mut tasks = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                for j in 0..50 {
                    cache.record(format!("k{}-{}", i, j), j.to_string());
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(cache.len(), 400);
    }
}

//! Process-wide cache for report payloads, keyed by report name with an
//! explicit TTL. Writers that change the underlying aggregates call
//! [`ReportCache::invalidate`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

pub const DASHBOARD_REPORT: &str = "admin_dashboard";

struct Entry {
    stored_at: Instant,
    value: serde_json::Value,
}

pub struct ReportCache {
    ttl: Duration,
    entries: RwLock<HashMap<&'static str, Entry>>,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    pub async fn put(&self, key: &'static str, value: serde_json::Value) {
        let mut entries = self.entries.write().await;
        entries.insert(key, Entry { stored_at: Instant::now(), value });
    }

    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hit_within_ttl() {
        let cache = ReportCache::new(Duration::from_secs(60));
        cache.put("r", serde_json::json!({"n": 1})).await;
        assert_eq!(cache.get("r").await, Some(serde_json::json!({"n": 1})));
    }

    #[tokio::test]
    async fn miss_after_expiry() {
        let cache = ReportCache::new(Duration::from_millis(10));
        cache.put("r", serde_json::json!(1)).await;
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("r").await, None);
    }

    #[tokio::test]
    async fn miss_after_invalidation() {
        let cache = ReportCache::new(Duration::from_secs(60));
        cache.put("r", serde_json::json!(1)).await;
        cache.invalidate("r").await;
        assert_eq!(cache.get("r").await, None);
        // Invalidating an absent key is a no-op.
        cache.invalidate("other").await;
    }
}

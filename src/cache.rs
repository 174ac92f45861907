use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{info, warn};

/// Key for the cross-tournament analytics payload.
pub const GLOBAL_ANALYTICS_KEY: &str = "analytics:global";

/// Key for one tournament's analytics payload.
pub fn tournament_analytics_key(tournament_id: i64) -> String {
    format!("analytics:tournament:{}", tournament_id)
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

/// A keyed cache for computed analytics payloads.
///
/// Entries expire after the configured TTL; mutations evict them earlier
/// through the invalidation helpers so the next read recomputes.
#[derive(Debug)]
pub struct AnalyticsCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl AnalyticsCache {
    pub fn new(ttl: Duration) -> Self {
        AnalyticsCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cached value for a key, unless it has expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a value under a key with the cache's TTL.
    pub fn put(&self, key: &str, value: Value) {
        let Ok(mut entries) = self.entries.lock() else {
            warn!("Failed to cache {}: cache lock poisoned", key);
            return;
        };
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Removes a key. Deleting an absent key is a no-op, not an error.
    pub fn delete(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }
}

/// Clears the global analytics cache.
///
/// Invalidation is best-effort by design: a failure here must never fail
/// the mutation that triggered it, so nothing is returned to the caller.
pub fn invalidate_global_analytics(cache: &AnalyticsCache) {
    if cache.delete(GLOBAL_ANALYTICS_KEY) {
        info!("Cache invalidated: global analytics");
    }
}

/// Clears the analytics cache for a specific tournament.
pub fn invalidate_tournament_analytics(cache: &AnalyticsCache, tournament_id: i64) {
    if cache.delete(&tournament_analytics_key(tournament_id)) {
        info!("Cache invalidated: tournament {} analytics", tournament_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_back_what_was_stored() {
        let cache = AnalyticsCache::new(Duration::from_secs(60));
        cache.put("analytics:global", json!({ "total_matches": 4 }));

        assert_eq!(
            cache.get("analytics:global"),
            Some(json!({ "total_matches": 4 }))
        );
    }

    #[test]
    fn deleting_an_absent_key_is_a_silent_no_op() {
        let cache = AnalyticsCache::new(Duration::from_secs(60));

        assert!(!cache.delete("analytics:tournament:99"));
        invalidate_tournament_analytics(&cache, 99);
        invalidate_global_analytics(&cache);
        assert_eq!(cache.get("analytics:tournament:99"), None);
    }

    #[test]
    fn invalidation_evicts_the_right_key() {
        let cache = AnalyticsCache::new(Duration::from_secs(60));
        cache.put(GLOBAL_ANALYTICS_KEY, json!(1));
        cache.put(&tournament_analytics_key(7), json!(2));

        invalidate_tournament_analytics(&cache, 7);

        assert_eq!(cache.get(&tournament_analytics_key(7)), None);
        assert_eq!(cache.get(GLOBAL_ANALYTICS_KEY), Some(json!(1)));
    }

    #[test]
    fn entries_expire_after_the_ttl() {
        let cache = AnalyticsCache::new(Duration::from_millis(0));
        cache.put("analytics:global", json!(1));

        assert_eq!(cache.get("analytics:global"), None);
    }
}

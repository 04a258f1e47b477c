//! Time-to-live memo cache for widget snapshots.
//!
//! Kept outside the engine: callers wrap a computation cache-aside at the
//! call site, keyed by function name and arguments.

use std::collections::HashMap;
use std::fmt::Display;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Build a cache key: `prefix:arg1:arg2:key_a:val_a:key_b:val_b`, keyword
/// pairs sorted by key.
pub fn cache_key(prefix: &str, args: &[&dyn Display], kwargs: &[(&str, &dyn Display)]) -> String {
    let mut parts = vec![prefix.to_string()];
    parts.extend(args.iter().map(|a| a.to_string()));

    let mut pairs: Vec<(&str, String)> = kwargs.iter().map(|(k, v)| (*k, v.to_string())).collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    parts.extend(pairs.into_iter().map(|(k, v)| format!("{}:{}", k, v)));

    parts.join(":")
}

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    enabled: bool,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<V: Clone> TtlCache<V> {
    /// A disabled cache computes every call and stores nothing.
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fresh value for `key`, evicting it if expired.
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_fresh() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, value: V, ttl: Duration) {
        if !self.enabled {
            return;
        }
        self.entries.lock().insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Cache-aside: return the fresh value or compute and store it.
    /// Errors are returned as-is and never cached.
    ///
    /// The lock is not held while `compute` runs, so two callers racing on a
    /// cold key may both compute.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(key) {
            log::debug!("cache hit: {}", key);
            return Ok(hit);
        }
        log::debug!("cache miss: {}", key);
        let value = compute()?;
        self.insert(key.to_string(), value.clone(), ttl);
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Drop every entry whose key starts with `prefix`. Returns the count.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_cache_key_includes_args_and_sorted_kwargs() {
        let key = cache_key(
            "insights:test",
            &[&"arg1", &"arg2"],
            &[("zeta", &2), ("kwarg1", &"value1")],
        );
        assert_eq!(key, "insights:test:arg1:arg2:kwarg1:value1:zeta:2");
    }

    #[test]
    fn test_cache_key_without_arguments() {
        assert_eq!(cache_key("insights:widget", &[], &[]), "insights:widget");
    }

    #[test]
    fn test_get_or_insert_computes_once() {
        let cache: TtlCache<u32> = TtlCache::new(true);
        let calls = Cell::new(0);
        for _ in 0..3 {
            let v = cache
                .get_or_try_insert_with("k", Duration::from_secs(60), || {
                    calls.set(calls.get() + 1);
                    Ok::<_, String>(7)
                })
                .unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_expired_entry_recomputes() {
        let cache: TtlCache<u32> = TtlCache::new(true);
        cache.insert("k".to_string(), 1, Duration::ZERO);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "expired entry should be evicted on read");
    }

    #[test]
    fn test_errors_not_cached() {
        let cache: TtlCache<u32> = TtlCache::new(true);
        let err = cache.get_or_try_insert_with("k", Duration::from_secs(60), || Err("boom"));
        assert_eq!(err, Err("boom"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_cache_passes_through() {
        let cache: TtlCache<u32> = TtlCache::new(false);
        let calls = Cell::new(0);
        for _ in 0..2 {
            let _ = cache.get_or_try_insert_with("k", Duration::from_secs(60), || {
                calls.set(calls.get() + 1);
                Ok::<_, String>(1)
            });
        }
        assert_eq!(calls.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_prefix() {
        let cache: TtlCache<u32> = TtlCache::default();
        let ttl = Duration::from_secs(60);
        cache.insert("insights:a:1".to_string(), 1, ttl);
        cache.insert("insights:a:2".to_string(), 2, ttl);
        cache.insert("insights:b".to_string(), 3, ttl);

        assert_eq!(cache.invalidate_prefix("insights:a"), 2);
        assert!(cache.invalidate("insights:b"));
        assert!(!cache.invalidate("insights:b"));
        assert!(cache.is_empty());
    }
}

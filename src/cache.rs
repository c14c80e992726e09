//! Time-to-live cache for provider responses.
//!
//! Generating an article and searching images cost money and seconds, and a
//! user who clicks "generate" twice for the same topic expects the same
//! text. [`TtlCache`] memoises those calls for a fixed window.
//!
//! # Cache Strategy
//!
//! - **Scope**: process-wide, shared through `Arc` between runs
//! - **Index**: the exact input string (prompt or search query)
//! - **Eviction**: time-based only; an expired entry is dropped when it is
//!   next read, or in bulk by [`TtlCache::purge_expired`]
//! - **Size Limit**: none
//!
//! # Example
//!
//! ```
//! use edgequake_article2pdf::cache::TtlCache;
//! use std::time::Duration;
//!
//! let cache: TtlCache<String, String> = TtlCache::new(Duration::from_secs(900));
//! cache.insert("prompt".to_string(), "article".to_string());
//! assert_eq!(cache.get(&"prompt".to_string()).as_deref(), Some("article"));
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Thread-safe map whose entries expire `ttl` after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a clone of the value if it has not expired.
    ///
    /// An expired entry is removed.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Store a value, replacing any previous entry and restarting its clock.
    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop all expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some((stored, value)) if now.saturating_duration_since(*stored) < self.ttl => {
                Some(value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert_at(&self, key: K, value: V, now: Instant) {
        self.lock().insert(key, (now, value));
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (stored, _)| now.saturating_duration_since(*stored) < self.ttl);
        before - entries.len()
    }

    // Every mutation is a single HashMap call, so a poisoned map is still whole.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, (Instant, V)>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn cache(ttl_secs: u64) -> TtlCache<String, u32> {
        TtlCache::new(Duration::from_secs(ttl_secs))
    }

    #[test]
    fn fresh_entry_is_returned() {
        let c = cache(900);
        c.insert("a".into(), 1);
        assert_eq!(c.get(&"a".into()), Some(1));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn missing_key_is_none() {
        let c = cache(900);
        assert_eq!(c.get(&"nope".into()), None);
        assert!(c.is_empty());
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let c = cache(900);
        let t0 = Instant::now();
        c.insert_at("a".into(), 1, t0);

        assert_eq!(c.get_at(&"a".into(), t0 + Duration::from_secs(899)), Some(1));
        assert_eq!(c.get_at(&"a".into(), t0 + Duration::from_secs(900)), None);
        assert!(c.is_empty(), "expired entry should be removed on read");
    }

    #[test]
    fn reinsert_restarts_the_clock() {
        let c = cache(10);
        let t0 = Instant::now();
        c.insert_at("a".into(), 1, t0);
        c.insert_at("a".into(), 2, t0 + Duration::from_secs(8));
        assert_eq!(c.get_at(&"a".into(), t0 + Duration::from_secs(15)), Some(2));
    }

    #[test]
    fn purge_removes_only_expired() {
        let c = cache(10);
        let t0 = Instant::now();
        c.insert_at("old".into(), 1, t0);
        c.insert_at("new".into(), 2, t0 + Duration::from_secs(9));

        let removed = c.purge_expired_at(t0 + Duration::from_secs(12));
        assert_eq!(removed, 1);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get_at(&"new".into(), t0 + Duration::from_secs(12)), Some(2));
    }

    #[test]
    fn zero_ttl_never_hits() {
        let c = cache(0);
        c.insert("a".into(), 1);
        assert_eq!(c.get(&"a".into()), None);
    }

    #[test]
    fn concurrent_writers_do_not_corrupt() {
        let c = Arc::new(cache(900));
        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for i in 0..100u32 {
                        c.insert(format!("{t}-{i}"), i);
                        let _ = c.get(&format!("{t}-{}", i / 2));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.len(), 800);
    }
}

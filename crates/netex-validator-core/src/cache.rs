//! Content-addressed memoization of per-file validation results
//! (`spec.md` §4.7).
//!
//! Keyed by SHA-256 of the file's bytes plus a selector of the options that
//! can change a result (see [`crate::options::ValidationOptions::cache_selector`]).
//! Bounded by entry count and an approximate byte footprint; entries expire
//! lazily at read under a TTL.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use sha2::{Digest, Sha256};

use crate::report::ValidationReportEntry;

/// A cached per-file result plus the bookkeeping [`CacheStats`] needs.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub entries: Vec<ValidationReportEntry>,
    cached_at: Instant,
    expires_at: Instant,
    access_count: u64,
    approx_bytes: usize,
}

/// Snapshot of cache behavior since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub hit_rate: f64,
    pub average_age_seconds: f64,
}

struct Inner {
    cache: LruCache<String, CacheEntry>,
    max_entries: usize,
    max_memory_bytes: usize,
    used_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Thread-safe LRU + TTL + byte-budget cache for per-file validation
/// results. One instance is shared across all workers in a dataset run.
pub struct ValidationCache {
    inner: Mutex<Inner>,
    ttl: Duration,
}

fn approx_size(entries: &[ValidationReportEntry]) -> usize {
    entries
        .iter()
        .map(|e| {
            e.code.len()
                + e.name.len()
                + e.message.len()
                + e.file_name.len()
                + e.location.file_name.len()
                + e.location.xpath.len()
                + e.location.element_id.len()
                + 64
        })
        .sum::<usize>()
        .max(1)
}

impl ValidationCache {
    pub fn new(max_entries: usize, max_memory_mb: usize, ttl_hours: u64) -> Self {
        // Capacity enforcement is done manually below (entry-count *and*
        // byte-budget ceilings together), so the underlying `LruCache` is
        // given an effectively unbounded capacity and never evicts on its
        // own — that would bypass our eviction/byte accounting.
        let unbounded = NonZeroUsize::new(usize::MAX).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                cache: LruCache::new(unbounded),
                max_entries: max_entries.max(1),
                max_memory_bytes: max_memory_mb.saturating_mul(1024 * 1024).max(1),
                used_bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            ttl: Duration::from_secs(ttl_hours.saturating_mul(3600)),
        }
    }

    /// SHA-256 of `bytes` followed by `selector`, hex-encoded.
    pub fn key_for(bytes: &[u8], selector: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hasher.update(selector.as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn get(&self, key: &str) -> Option<Vec<ValidationReportEntry>> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let expired = inner.cache.peek(key).is_some_and(|e| now >= e.expires_at);
        if expired {
            if let Some(evicted) = inner.cache.pop(key) {
                inner.used_bytes = inner.used_bytes.saturating_sub(evicted.approx_bytes);
                inner.evictions += 1;
            }
        }
        match inner.cache.get_mut(key) {
            Some(entry) => {
                entry.access_count += 1;
                let result = entry.entries.clone();
                inner.hits += 1;
                Some(result)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn set(&self, key: String, entries: Vec<ValidationReportEntry>) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        evict_expired(&mut inner, now);

        let approx_bytes = approx_size(&entries);
        let entry = CacheEntry {
            entries,
            cached_at: now,
            expires_at: now + self.ttl,
            access_count: 0,
            approx_bytes,
        };

        if let Some(old) = inner.cache.put(key, entry) {
            inner.used_bytes = inner.used_bytes.saturating_sub(old.approx_bytes);
        }
        inner.used_bytes = inner.used_bytes.saturating_add(approx_bytes);

        while inner.used_bytes > inner.max_memory_bytes || inner.cache.len() > inner.max_entries {
            let Some((_, evicted)) = inner.cache.pop_lru() else {
                break;
            };
            inner.used_bytes = inner.used_bytes.saturating_sub(evicted.approx_bytes);
            inner.evictions += 1;
        }
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let total = inner.hits + inner.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            inner.hits as f64 / total as f64
        };
        let now = Instant::now();
        let ages: Vec<f64> = inner
            .cache
            .iter()
            .map(|(_, e)| now.saturating_duration_since(e.cached_at).as_secs_f64())
            .collect();
        let average_age_seconds = if ages.is_empty() {
            0.0
        } else {
            ages.iter().sum::<f64>() / ages.len() as f64
        };
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size: inner.cache.len(),
            hit_rate,
            average_age_seconds,
        }
    }
}

fn evict_expired(inner: &mut Inner, now: Instant) {
    let expired_keys: Vec<String> = inner
        .cache
        .iter()
        .filter(|(_, e)| now >= e.expires_at)
        .map(|(k, _)| k.clone())
        .collect();
    for key in expired_keys {
        if let Some(evicted) = inner.cache.pop(&key) {
            inner.used_bytes = inner.used_bytes.saturating_sub(evicted.approx_bytes);
            inner.evictions += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::report::DataLocation;

    fn sample_entry() -> ValidationReportEntry {
        ValidationReportEntry {
            code: "X".into(),
            name: "x".into(),
            message: "msg".into(),
            severity: crate::report::Severity::Info,
            file_name: "a.xml".into(),
            location: DataLocation::default(),
        }
    }

    #[test]
    fn miss_then_hit() {
        let cache = ValidationCache::new(10, 10, 1);
        let key = ValidationCache::key_for(b"hello", "sel");
        assert!(cache.get(&key).is_none());
        cache.set(key.clone(), vec![sample_entry()]);
        assert_eq!(cache.get(&key).expect("hit").len(), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn different_selector_is_different_key() {
        let a = ValidationCache::key_for(b"hello", "sel-a");
        let b = ValidationCache::key_for(b"hello", "sel-b");
        assert_ne!(a, b);
    }

    #[test]
    fn entry_count_ceiling_evicts_lru() {
        let cache = ValidationCache::new(1, 1024, 1);
        cache.set("k1".into(), vec![sample_entry()]);
        cache.set("k2".into(), vec![sample_entry()]);
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert!(cache.stats().evictions >= 1);
    }

    #[test]
    fn ttl_expiry_is_a_miss() {
        let cache = ValidationCache::new(10, 10, 0);
        cache.set("k".into(), vec![sample_entry()]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("k").is_none());
    }
}

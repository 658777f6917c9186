//! Time-to-live memoization for computed analytics
//!
//! Entries are never mutated in place: a stale entry stays in the map until
//! the next successful computation for its key replaces it, or until the
//! whole cache is cleared. A stale entry is treated exactly like a missing
//! one on lookup.
//!
//! Two concurrent misses on the same key both run their producer; the last
//! one to finish wins. Computation is cheap relative to the UI refresh
//! cadence, so in-flight requests are not de-duplicated.

use crate::clock::Clock;
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::Timeframe;

/// Default entry lifetime: five minutes
pub const DEFAULT_TTL_MS: i64 = 5 * 60 * 1000;

/// Cache key builders
///
/// Keys encode the timeframe or member so two different windows or members
/// never share an entry.
pub struct CacheKey;

impl CacheKey {
    pub fn team_analytics(timeframe: Timeframe) -> String {
        format!("team-analytics-{}", timeframe.as_str())
    }

    pub fn member_analytics(member_id: &str) -> String {
        format!("member-analytics-{}", member_id)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    produced_at: DateTime<Utc>,
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Key-based TTL cache
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &str, ttl: Duration) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| now - entry.produced_at < ttl)
            .map(|entry| entry.value.clone())
    }

    /// Return the cached value for `key` if it is younger than `ttl`,
    /// otherwise run `producer` and cache its result.
    ///
    /// A failing producer leaves the cache untouched, including any stale
    /// entry for the same key.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(key, ttl) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Analytics cache hit");
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "Analytics cache miss");

        let value = producer().await?;

        let produced_at = self.clock.now();
        self.entries.lock().insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                produced_at,
            },
        );

        Ok(value)
    }

    /// [`Self::get_or_compute`] with the cache's configured TTL
    pub async fn get_or_compute_default<F, Fut>(&self, key: &str, producer: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        self.get_or_compute(key, self.default_ttl, producer).await
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::AnalyticsError;
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;

    fn setup(ttl_ms: i64) -> (Arc<ManualClock>, TtlCache<u32>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let cache = TtlCache::new(Duration::milliseconds(ttl_ms), clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_cache_keys_do_not_collide() {
        assert_eq!(CacheKey::team_analytics(Timeframe::Week), "team-analytics-week");
        assert_ne!(
            CacheKey::team_analytics(Timeframe::Week),
            CacheKey::team_analytics(Timeframe::Month)
        );
        assert_eq!(CacheKey::member_analytics("u1"), "member-analytics-u1");
        assert_ne!(CacheKey::member_analytics("u1"), CacheKey::member_analytics("u2"));
    }

    #[tokio::test]
    async fn test_ttl_hit_and_expiry() {
        let (clock, cache) = setup(100);
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let produce = move || async move {
            Ok::<u32, AnalyticsError>(calls.fetch_add(1, Ordering::SeqCst) as u32 + 1)
        };

        // t=0: miss
        assert_eq!(cache.get_or_compute_default("k", produce).await.unwrap(), 1);

        // t=50: hit
        clock.advance(Duration::milliseconds(50));
        assert_eq!(cache.get_or_compute_default("k", produce).await.unwrap(), 1);

        // t=150: stale, recompute
        clock.advance(Duration::milliseconds(100));
        assert_eq!(cache.get_or_compute_default("k", produce).await.unwrap(), 2);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 2,
                entries: 1
            }
        );
    }

    #[tokio::test]
    async fn test_entry_expires_exactly_at_ttl() {
        let (clock, cache) = setup(100);
        cache.get_or_compute_default("k", || async { Ok(7) }).await.unwrap();

        clock.advance(Duration::milliseconds(100));
        assert_eq!(cache.get("k", cache.default_ttl()), None);
    }

    #[tokio::test]
    async fn test_failed_producer_is_not_cached_and_keeps_stale_entry() {
        let (clock, cache) = setup(100);
        cache.get_or_compute_default("k", || async { Ok(1) }).await.unwrap();

        clock.advance(Duration::milliseconds(200));
        let err = cache
            .get_or_compute_default("k", || async {
                Err(AnalyticsError::aggregation_failed("boom"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::AggregationFailed(_)));

        // Stale entry is still present but not served as fresh
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k", Duration::milliseconds(100)), None);
        assert_eq!(cache.get("k", Duration::milliseconds(500)), Some(1));

        let value = cache
            .get_or_compute_default("k", || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_clear_forces_recompute() {
        let (_clock, cache) = setup(DEFAULT_TTL_MS);
        cache.get_or_compute_default("a", || async { Ok(1) }).await.unwrap();
        cache.get_or_compute_default("b", || async { Ok(2) }).await.unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());

        let value = cache
            .get_or_compute_default("a", || async { Ok(10) })
            .await
            .unwrap();
        assert_eq!(value, 10);
    }

    #[tokio::test]
    async fn test_per_call_ttl_overrides_default() {
        let (clock, cache) = setup(DEFAULT_TTL_MS);
        cache.get_or_compute_default("k", || async { Ok(1) }).await.unwrap();

        clock.advance(Duration::seconds(10));
        let value = cache
            .get_or_compute("k", Duration::seconds(5), || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }
}

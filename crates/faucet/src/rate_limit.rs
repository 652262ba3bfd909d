//! Per-address cooldown tracking.
//!
//! The service only talks to [`RateLimitStore`], so the in-process map can be
//! replaced by a persistent or shared backend without touching call sites.

use crate::error::FaucetResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Last successful dispense for one address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitEntry {
    /// Unix millis of the dispense
    pub last_dispense: i64,
    /// Unix millis after which the entry may be dropped
    pub expires_at: i64,
}

impl RateLimitEntry {
    pub fn new(at: DateTime<Utc>, ttl: Duration) -> Self {
        let last_dispense = at.timestamp_millis();
        Self {
            last_dispense,
            expires_at: last_dispense.saturating_add(ttl.as_millis() as i64),
        }
    }

    pub fn last_dispense(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_dispense).unwrap_or_default()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp_millis()
    }
}

/// Key-value store of dispense timestamps
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Timestamp of the last recorded dispense for `key`
    async fn get(&self, key: &str) -> FaucetResult<Option<DateTime<Utc>>>;

    /// Record a dispense; the entry becomes evictable after `ttl`
    async fn set(&self, key: &str, value: DateTime<Utc>, ttl: Duration) -> FaucetResult<()>;

    /// Drop every entry whose TTL has passed, returning how many were removed
    async fn evict_expired(&self, now: DateTime<Utc>) -> FaucetResult<usize>;

    async fn len(&self) -> FaucetResult<usize>;
}

/// Hours until `key` may dispense again, rounded up; `None` when eligible now
pub fn hours_remaining(
    last: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<u64> {
    let elapsed_ms = now.timestamp_millis() - last.timestamp_millis();
    let window_ms = window.as_millis() as i64;
    if elapsed_ms >= window_ms {
        return None;
    }

    const HOUR_MS: i64 = 3_600_000;
    let remaining = window_ms - elapsed_ms;
    Some(((remaining + HOUR_MS - 1) / HOUR_MS).max(1) as u64)
}

/// Volatile in-process store. Lost on restart, not shared between instances.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    entries: RwLock<HashMap<String, RateLimitEntry>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn get(&self, key: &str) -> FaucetResult<Option<DateTime<Utc>>> {
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .map(RateLimitEntry::last_dispense))
    }

    async fn set(&self, key: &str, value: DateTime<Utc>, ttl: Duration) -> FaucetResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), RateLimitEntry::new(value, ttl));
        Ok(())
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> FaucetResult<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Evicted {} expired rate-limit entries", removed);
        }
        Ok(removed)
    }

    async fn len(&self) -> FaucetResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    #[test]
    fn test_hours_remaining_rounds_up() {
        let t = Utc::now();
        let almost = t + ChronoDuration::hours(23) + ChronoDuration::minutes(59);
        assert_eq!(hours_remaining(t, almost, DAY), Some(1));

        assert_eq!(hours_remaining(t, t, DAY), Some(24));
        assert_eq!(hours_remaining(t, t + ChronoDuration::minutes(30), DAY), Some(24));
        assert_eq!(hours_remaining(t, t + ChronoDuration::hours(12), DAY), Some(12));

        let after = t + ChronoDuration::hours(24) + ChronoDuration::minutes(1);
        assert_eq!(hours_remaining(t, after, DAY), None);
        assert_eq!(hours_remaining(t, t + ChronoDuration::hours(24), DAY), None);
    }

    #[tokio::test]
    async fn test_memory_store_set_get() {
        let store = MemoryRateLimitStore::new();
        let now = Utc::now();

        assert_eq!(store.get("cosmos1a").await.unwrap(), None);
        store.set("cosmos1a", now, DAY).await.unwrap();

        let stored = store.get("cosmos1a").await.unwrap().unwrap();
        assert_eq!(stored.timestamp_millis(), now.timestamp_millis());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_eviction() {
        let store = MemoryRateLimitStore::new();
        let now = Utc::now();

        store
            .set("old", now - ChronoDuration::hours(25), DAY)
            .await
            .unwrap();
        store
            .set("fresh", now - ChronoDuration::hours(1), DAY)
            .await
            .unwrap();

        assert_eq!(store.evict_expired(now).await.unwrap(), 1);
        assert_eq!(store.get("old").await.unwrap(), None);
        assert!(store.get("fresh").await.unwrap().is_some());
    }
}

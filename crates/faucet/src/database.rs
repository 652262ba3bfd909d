//! Sled-backed rate-limit store, so cooldowns survive a restart

use crate::error::{FaucetError, FaucetResult};
use crate::rate_limit::{RateLimitEntry, RateLimitStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sled::{Db, Tree};
use std::time::Duration;
use tracing::{debug, info};

pub struct SledRateLimitStore {
    _db: Db,
    /// address -> bincode(RateLimitEntry)
    entries: Tree,
}

impl SledRateLimitStore {
    /// Create or open the store
    pub fn open(path: &str) -> FaucetResult<Self> {
        info!("Opening faucet rate-limit database at: {}", path);

        let db = sled::Config::default()
            .path(path)
            .cache_capacity(16 * 1024 * 1024)
            .open()?;
        let entries = db.open_tree("rate_limits")?;

        Ok(Self { _db: db, entries })
    }

    /// Throwaway store for tests
    pub fn temporary() -> FaucetResult<Self> {
        let db = sled::Config::default().temporary(true).open()?;
        let entries = db.open_tree("rate_limits")?;
        Ok(Self { _db: db, entries })
    }

    fn decode(bytes: &[u8]) -> FaucetResult<RateLimitEntry> {
        bincode::deserialize(bytes).map_err(|e| FaucetError::Internal(e.to_string()))
    }
}

#[async_trait]
impl RateLimitStore for SledRateLimitStore {
    async fn get(&self, key: &str) -> FaucetResult<Option<DateTime<Utc>>> {
        match self.entries.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?.last_dispense())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: DateTime<Utc>, ttl: Duration) -> FaucetResult<()> {
        let entry = RateLimitEntry::new(value, ttl);
        let bytes = bincode::serialize(&entry).map_err(|e| FaucetError::Internal(e.to_string()))?;
        self.entries.insert(key.as_bytes(), bytes)?;
        debug!("Recorded dispense for address: {}", key);
        Ok(())
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> FaucetResult<usize> {
        let mut keys_to_remove = Vec::new();

        for item in self.entries.iter() {
            let (key, value) = item?;
            // unreadable entries are dropped along with expired ones
            let expired = Self::decode(&value)
                .map(|entry| entry.is_expired(now))
                .unwrap_or(true);
            if expired {
                keys_to_remove.push(key);
            }
        }

        let removed = keys_to_remove.len();
        for key in keys_to_remove {
            self.entries.remove(key)?;
        }

        if removed > 0 {
            debug!("Evicted {} expired rate-limit entries", removed);
        }
        Ok(removed)
    }

    async fn len(&self) -> FaucetResult<usize> {
        Ok(self.entries.len())
    }
}

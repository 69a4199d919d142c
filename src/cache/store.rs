//! Keyed store of normalized payloads with TTL and stale labeling.
//!
//! Keys follow `<source>:<domain>[:<qualifier>]`, e.g. `mlb:scores` or
//! `espn:teams:nfl`. Every key is written by exactly one sync worker.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::observability::metrics;

/// One cached payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "cache_key")]
    pub key: String,
    pub payload: Value,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub hit_count: u64,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A value handed back to a reader.
#[derive(Debug, Clone, Serialize)]
pub struct CachedValue {
    pub payload: Value,
    pub source: String,
    pub stale: bool,
    pub expires_at: DateTime<Utc>,
}

/// Neither a fresh nor a stale entry exists for the key.
#[derive(Debug, Clone, Error)]
#[error("no cached entry for '{key}'")]
pub struct CacheMissError {
    pub key: String,
}

/// Aggregate view for the admin API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheSummary {
    pub entries: usize,
    pub fresh: usize,
    pub expired: usize,
    pub total_hits: u64,
}

/// Thread-safe cache shared by the sync workers.
#[derive(Clone, Default)]
pub struct CacheLayer {
    inner: Arc<DashMap<String, CacheEntry>>,
}

impl CacheLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload that expires `ttl` from now. Overwrites keep the hit counter.
    pub fn write(&self, key: &str, payload: Value, source: &str, ttl: Duration) {
        self.write_at(key, payload, source, ttl, Utc::now());
    }

    pub fn write_at(&self, key: &str, payload: Value, source: &str, ttl: Duration, now: DateTime<Utc>) {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let hit_count = self.inner.get(key).map(|e| e.hit_count).unwrap_or(0);
        self.inner.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                payload,
                source: source.to_string(),
                created_at: now,
                expires_at,
                hit_count,
                last_accessed: None,
            },
        );
        metrics::record_cache_size(self.inner.len());
        tracing::debug!(cache_key = %key, source = %source, ttl_secs = ttl.as_secs(), "Cache write");
    }

    /// The value, only while `now < expires_at`.
    pub fn read_fresh(&self, key: &str) -> Option<CachedValue> {
        self.read_fresh_at(key, Utc::now())
    }

    pub fn read_fresh_at(&self, key: &str, now: DateTime<Utc>) -> Option<CachedValue> {
        let mut entry = match self.inner.get_mut(key) {
            Some(entry) if entry.is_fresh_at(now) => entry,
            _ => {
                metrics::record_cache_read("miss");
                return None;
            }
        };
        entry.hit_count += 1;
        entry.last_accessed = Some(now);
        metrics::record_cache_read("fresh");
        Some(CachedValue {
            payload: entry.payload.clone(),
            source: entry.source.clone(),
            stale: false,
            expires_at: entry.expires_at,
        })
    }

    /// The most recent value regardless of expiry, tagged stale.
    ///
    /// Only meant for use after a live fetch has failed.
    pub fn read_stale_fallback(&self, key: &str) -> Result<CachedValue, CacheMissError> {
        self.read_stale_fallback_at(key, Utc::now())
    }

    pub fn read_stale_fallback_at(&self, key: &str, now: DateTime<Utc>) -> Result<CachedValue, CacheMissError> {
        let Some(mut entry) = self.inner.get_mut(key) else {
            metrics::record_cache_read("miss");
            return Err(CacheMissError { key: key.to_string() });
        };
        entry.hit_count += 1;
        entry.last_accessed = Some(now);
        metrics::record_cache_read("stale");
        Ok(CachedValue {
            payload: entry.payload.clone(),
            source: entry.source.clone(),
            stale: true,
            expires_at: entry.expires_at,
        })
    }

    /// Read without touching hit counters or freshness.
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn summary(&self) -> CacheSummary {
        let now = Utc::now();
        self.inner.iter().fold(CacheSummary::default(), |mut acc, e| {
            acc.entries += 1;
            if e.is_fresh_at(now) {
                acc.fresh += 1;
            } else {
                acc.expired += 1;
            }
            acc.total_hits += e.hit_count;
            acc
        })
    }

    pub(crate) fn entries(&self) -> Vec<CacheEntry> {
        self.inner.iter().map(|e| e.value().clone()).collect()
    }

    pub(crate) fn restore(&self, entry: CacheEntry) {
        self.inner.insert(entry.key.clone(), entry);
        metrics::record_cache_size(self.inner.len());
    }
}

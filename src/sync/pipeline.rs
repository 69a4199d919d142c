//! Shared plumbing for sync workers.
//!
//! # Data Flow
//! ```text
//! [reuse_fresh] read_fresh ──hit──→ Fetched::Cached(records)   worker: persist only
//!   │ miss
//! fetch ──ok──→ normalize ──ok──→ Fetched::Fresh { records, previous }
//!   │                │                worker: persist → store → diff → publish
//!   └──err───────────┴──→ read_stale_fallback
//!                           ├─ hit  → Fetched::Stale(records)   (warn)
//!                           └─ miss → SyncError::CacheMiss      (error)
//! ```
//!
//! Cadence ticks always go upstream. Only the warm-start context used by the
//! initial sync serves unexpired cache entries, so a restart that restored the
//! cache does not spend the rate budget refetching data that is still fresh.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheLayer;
use crate::distribution::bus::EventBus;
use crate::distribution::events::LiveUpdateEvent;
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::normalize::NormalizeError;
use crate::sync::repository::Repository;
use crate::upstream::{SyncCoordinator, UpstreamRequest};

/// Everything a worker needs, shared by all cadences.
#[derive(Clone)]
pub struct SyncContext {
    pub coordinator: Arc<SyncCoordinator>,
    pub cache: CacheLayer,
    pub repository: Arc<dyn Repository>,
    pub bus: EventBus,
    /// Serve unexpired cache entries instead of calling upstream.
    pub reuse_fresh: bool,
}

/// One cache key and the request that fills it.
#[derive(Debug, Clone)]
pub struct Target {
    pub key: String,
    pub source: String,
    pub request: UpstreamRequest,
    pub ttl: Duration,
}

impl Target {
    pub fn new(source: &str, key: impl Into<String>, request: UpstreamRequest, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            source: source.to_string(),
            request,
            ttl,
        }
    }
}

/// Records for a target, labeled by where they came from.
#[derive(Debug)]
pub enum Fetched<T> {
    /// Live data, plus whatever was cached under the key before.
    Fresh { records: T, previous: Option<T> },
    /// The live fetch failed; this is the last cached value.
    Stale(T),
    /// An unexpired cache entry served without calling upstream.
    Cached(T),
}

impl SyncContext {
    pub fn new(
        coordinator: Arc<SyncCoordinator>,
        cache: CacheLayer,
        repository: Arc<dyn Repository>,
        bus: EventBus,
    ) -> Self {
        Self {
            coordinator,
            cache,
            repository,
            bus,
            reuse_fresh: false,
        }
    }

    /// A copy that serves unexpired cache entries, for the initial sync.
    pub fn warm_start(&self) -> Self {
        Self {
            reuse_fresh: true,
            ..self.clone()
        }
    }

    /// Fetch and normalize a target, falling back to the cache on any failure.
    pub async fn fetch<T, F>(&self, target: &Target, normalize: F) -> SyncResult<Fetched<T>>
    where
        T: DeserializeOwned,
        F: FnOnce(&Value) -> Result<T, NormalizeError>,
    {
        if self.reuse_fresh {
            if let Some(cached) = self.cache.read_fresh(&target.key) {
                match serde_json::from_value(cached.payload) {
                    Ok(records) => {
                        tracing::debug!(cache_key = %target.key, "Serving fresh cache entry");
                        return Ok(Fetched::Cached(records));
                    }
                    Err(e) => {
                        tracing::warn!(cache_key = %target.key, error = %e, "Cached payload no longer matches record shape");
                    }
                }
            }
        }

        let attempt = match self.coordinator.fetch(&target.source, &target.request).await {
            Ok(raw) => normalize(&raw).map_err(SyncError::from),
            Err(e) => Err(SyncError::from(e)),
        };

        match attempt {
            Ok(records) => {
                let previous = self
                    .cache
                    .peek(&target.key)
                    .and_then(|entry| serde_json::from_value(entry.payload).ok());
                Ok(Fetched::Fresh { records, previous })
            }
            Err(cause) => self.fallback(&target.key, cause),
        }
    }

    fn fallback<T: DeserializeOwned>(&self, key: &str, cause: SyncError) -> SyncResult<Fetched<T>> {
        let cached = match self.cache.read_stale_fallback(key) {
            Ok(cached) => cached,
            Err(_) => {
                tracing::error!(cache_key = %key, error = %cause, "Sync failed and no cached data exists");
                return Err(SyncError::CacheMiss {
                    key: key.to_string(),
                    cause: Box::new(cause),
                });
            }
        };

        match serde_json::from_value(cached.payload) {
            Ok(records) => {
                tracing::warn!(
                    cache_key = %key,
                    expires_at = %cached.expires_at,
                    error = %cause,
                    "Serving stale cached data after failed sync"
                );
                Ok(Fetched::Stale(records))
            }
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Cached payload no longer matches record shape");
                Err(SyncError::CacheMiss {
                    key: key.to_string(),
                    cause: Box::new(cause),
                })
            }
        }
    }

    /// Write fresh records under the target's key.
    pub fn store<T: Serialize>(&self, target: &Target, records: &T) {
        match serde_json::to_value(records) {
            Ok(payload) => self.cache.write(&target.key, payload, &target.source, target.ttl),
            Err(e) => tracing::error!(cache_key = %target.key, error = %e, "Failed to serialize records for cache"),
        }
    }

    /// Publish events in order. Returns how many were published.
    pub async fn publish_all(&self, events: Vec<LiveUpdateEvent>) -> SyncResult<usize> {
        let count = events.len();
        for event in events {
            self.bus.publish(event).await?;
        }
        Ok(count)
    }
}

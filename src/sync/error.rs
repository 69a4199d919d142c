//! Sync error types.

use thiserror::Error;

use crate::distribution::bus::BusClosed;
use crate::sync::normalize::NormalizeError;
use crate::sync::repository::StoreError;
use crate::upstream::UpstreamError;

/// Errors surfaced by a sync worker.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The live fetch failed and there is nothing cached to fall back on.
    #[error("no cached data for '{key}' after failed sync: {cause}")]
    CacheMiss {
        key: String,
        #[source]
        cause: Box<SyncError>,
    },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bus(#[from] BusClosed),
}

impl SyncError {
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, SyncError::CacheMiss { .. })
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

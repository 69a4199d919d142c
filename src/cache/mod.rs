//! Cache layer.
//!
//! # Responsibilities
//! - Hold the last normalized payload per key with an expiry
//! - Distinguish fresh reads from stale fallback reads
//! - Never synthesize a value for a key that was never written
//!
//! # Data Flow
//! ```text
//! Sync worker success → store.rs write
//! Sync worker failure → store.rs read_stale_fallback → CachedValue { stale: true }
//! Startup / shutdown  → persistence.rs (JSON file)
//! ```

pub mod persistence;
pub mod store;

pub use persistence::{load_from_file, save_to_file};
pub use store::{CacheEntry, CacheLayer, CacheMissError, CacheSummary, CachedValue};

//! JSON snapshot of the cache.
//!
//! The file holds an array of `{cache_key, payload, source, expires_at,
//! hit_count, last_accessed}` records. Restored entries keep their original
//! expiry, so anything already expired is only served as a stale fallback.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::cache::store::{CacheEntry, CacheLayer};

/// Load entries from `path` into `cache`. A missing file is not an error.
pub fn load_from_file(cache: &CacheLayer, path: &Path) -> std::io::Result<usize> {
    if !path.exists() {
        return Ok(0);
    }

    let reader = BufReader::new(File::open(path)?);
    let entries: Vec<CacheEntry> = serde_json::from_reader(reader)?;
    let count = entries.len();
    for entry in entries {
        cache.restore(entry);
    }

    tracing::info!(path = %path.display(), entries = count, "Restored cache from file");
    Ok(count)
}

/// Write every entry to `path`, replacing the file.
pub fn save_to_file(cache: &CacheLayer, path: &Path) -> std::io::Result<usize> {
    let mut entries = cache.entries();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &entries)?;

    tracing::info!(path = %path.display(), entries = entries.len(), "Saved cache to file");
    Ok(entries.len())
}
